//! Compute devices.
//!
//! Tensors carry a device tag. Host memory is the only backend compiled into
//! this crate; transfers to an accelerator fail with
//! [`InjectError::BackendUnavailable`](crate::error::InjectError::BackendUnavailable).

use crate::error::{InjectError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Device a tensor lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// Host memory
    Cpu,
    /// CUDA accelerator with ordinal
    Cuda(usize),
}

impl Device {
    /// Whether the device is host memory.
    #[must_use]
    pub fn is_cpu(self) -> bool {
        matches!(self, Self::Cpu)
    }

    /// Check that tensors can be allocated on this device.
    pub fn ensure_available(self) -> Result<()> {
        match self {
            Self::Cpu => Ok(()),
            Self::Cuda(_) => Err(InjectError::BackendUnavailable {
                backend: self.to_string(),
            }),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Cuda(ordinal) => write!(f, "cuda:{ordinal}"),
        }
    }
}

impl FromStr for Device {
    type Err = InjectError;

    /// Parses `cpu`, `cuda` and `cuda:N`.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        let invalid = || InjectError::InvalidDevice {
            value: s.to_string(),
        };
        match normalized.as_str() {
            "cpu" => Ok(Self::Cpu),
            "cuda" => Ok(Self::Cuda(0)),
            other => {
                let ordinal = other.strip_prefix("cuda:").ok_or_else(invalid)?;
                ordinal.parse::<usize>().map(Self::Cuda).map_err(|_| invalid())
            }
        }
    }
}

//! Element data types.
//!
//! Names follow the SafeTensors dtype strings so the same enum describes
//! model parameters and the tensors written to error map files.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Element data type of a tensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DType {
    /// 64-bit float
    F64,
    /// 32-bit float
    #[default]
    F32,
    /// 16-bit float (IEEE 754 half-precision)
    F16,
    /// Brain float 16
    BF16,
    /// 64-bit signed integer
    I64,
    /// 32-bit signed integer
    I32,
    /// 8-bit signed integer
    I8,
    /// 64-bit unsigned integer
    U64,
    /// 32-bit unsigned integer
    U32,
    /// 8-bit unsigned integer
    U8,
}

/// Dtypes whose parameters can be corrupted.
pub const SUPPORTED_DTYPES: &[DType] = &[DType::F32];

impl DType {
    /// Number of bits in one element.
    #[must_use]
    pub fn bits(self) -> u32 {
        match self {
            Self::F64 | Self::I64 | Self::U64 => 64,
            Self::F32 | Self::I32 | Self::U32 => 32,
            Self::F16 | Self::BF16 => 16,
            Self::I8 | Self::U8 => 8,
        }
    }

    /// Bytes per element
    #[must_use]
    pub fn bytes_per_element(self) -> usize {
        self.bits() as usize / 8
    }

    /// Whether this is a floating-point type.
    #[must_use]
    pub fn is_floating_point(self) -> bool {
        matches!(self, Self::F64 | Self::F32 | Self::F16 | Self::BF16)
    }

    /// Whether fault injection supports this dtype.
    #[must_use]
    pub fn is_supported(self) -> bool {
        SUPPORTED_DTYPES.contains(&self)
    }

    /// SafeTensors dtype string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::F64 => "F64",
            Self::F32 => "F32",
            Self::F16 => "F16",
            Self::BF16 => "BF16",
            Self::I64 => "I64",
            Self::I32 => "I32",
            Self::I8 => "I8",
            Self::U64 => "U64",
            Self::U32 => "U32",
            Self::U8 => "U8",
        }
    }

    /// Parse a SafeTensors dtype string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let dtype = match s {
            "F64" => Self::F64,
            "F32" => Self::F32,
            "F16" => Self::F16,
            "BF16" => Self::BF16,
            "I64" => Self::I64,
            "I32" => Self::I32,
            "I8" => Self::I8,
            "U64" => Self::U64,
            "U32" => Self::U32,
            "U8" => Self::U8,
            _ => return None,
        };
        Some(dtype)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comma-separated list of supported dtypes, for error messages.
pub(crate) fn supported_list() -> String {
    SUPPORTED_DTYPES
        .iter()
        .map(|d| d.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

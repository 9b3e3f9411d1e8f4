//! Injector configuration.
//!
//! # Examples
//!
//! ```
//! use bitflip::device::Device;
//! use bitflip::injector::InjectorConfig;
//!
//! let config = InjectorConfig::new()
//!     .with_probability(1e-4)
//!     .with_device(Device::Cpu)
//!     .with_param_names(["weight", "bias"])
//!     .with_seed(42);
//!
//! assert!(config.validate().is_ok());
//! assert!(config.targets("encoder.0.weight"));
//! assert!(!config.targets("encoder.0.running_mean"));
//! ```

use crate::device::Device;
use crate::dtype::{supported_list, DType};
use crate::error::{InjectError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Default per-bit error probability.
pub const DEFAULT_PROBABILITY: f64 = 1e-10;

/// How a faulty element is corrupted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorModel {
    /// Independent bit flips
    #[default]
    BitFlip,
    /// Replace faulty elements with random values. Not implemented.
    RandomValue,
}

/// Fault injection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectorConfig {
    /// Probability that any single bit is flipped
    pub p: f64,
    /// Parameter dtype
    pub dtype: DType,
    /// Device the error map is generated on
    pub device: Option<Device>,
    /// Parameter-name suffixes to corrupt (matched against the last dotted segment)
    pub param_names: BTreeSet<String>,
    /// Corruption model
    pub error_model: ErrorModel,
    /// RNG seed; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl Default for InjectorConfig {
    fn default() -> Self {
        Self {
            p: DEFAULT_PROBABILITY,
            dtype: DType::F32,
            device: None,
            param_names: BTreeSet::new(),
            error_model: ErrorModel::BitFlip,
            seed: None,
        }
    }
}

impl InjectorConfig {
    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-bit error probability.
    #[must_use]
    pub fn with_probability(mut self, p: f64) -> Self {
        self.p = p;
        self
    }

    /// Set the parameter dtype.
    #[must_use]
    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = dtype;
        self
    }

    /// Set the target device.
    #[must_use]
    pub fn with_device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }

    /// Set the parameter-name suffixes to corrupt.
    #[must_use]
    pub fn with_param_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.param_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the corruption model.
    #[must_use]
    pub fn with_error_model(mut self, model: ErrorModel) -> Self {
        self.error_model = model;
        self
    }

    /// Seed the injector's RNG for reproducible runs.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// - [`InjectError::InvalidProbability`] unless `0 < p < 1`
    /// - [`InjectError::UnsupportedDType`] for dtypes outside the supported set
    /// - [`InjectError::DeviceUnspecified`] when no device is set
    /// - [`InjectError::NotImplemented`] for [`ErrorModel::RandomValue`]
    pub fn validate(&self) -> Result<()> {
        if !(self.p > 0.0 && self.p < 1.0) {
            return Err(InjectError::InvalidProbability { value: self.p });
        }
        if !self.dtype.is_supported() {
            return Err(InjectError::UnsupportedDType {
                dtype: self.dtype.to_string(),
                supported: supported_list(),
            });
        }
        if self.device.is_none() {
            return Err(InjectError::DeviceUnspecified);
        }
        if self.error_model == ErrorModel::RandomValue {
            return Err(InjectError::NotImplemented {
                feature: "random value error model".to_string(),
            });
        }
        Ok(())
    }

    /// Whether the parameter called `name` is targeted.
    ///
    /// Only the final dotted segment is compared.
    #[must_use]
    pub fn targets(&self, name: &str) -> bool {
        let suffix = name.rsplit('.').next().unwrap_or(name);
        self.param_names.contains(suffix)
    }

    /// Read a configuration from a JSON file. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Write the configuration as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }
}

//! Bit-flip fault injection into model parameters.
//!
//! An [`Injector`] corrupts every parameter whose trailing name segment is
//! in the configured target set. Each call to [`Injector::inject`]:
//!
//! 1. finds `maxsize`, the largest `numel * bit_width` over targeted
//!    parameters;
//! 2. samples a fresh [`ErrorMap`] of `maxsize` words;
//! 3. for each targeted parameter, draws `numel` words from a random
//!    permutation of the map and XORs them into the parameter's bit pattern.
//!
//! # Example
//!
//! ```
//! use bitflip::prelude::*;
//!
//! let mut model = Sequential::new()
//!     .add(Linear::with_seed(16, 8, Some(0)))
//!     .add(ReLU::new())
//!     .add(Linear::with_seed(8, 2, Some(1)));
//!
//! let config = InjectorConfig::new()
//!     .with_probability(1e-3)
//!     .with_device(Device::Cpu)
//!     .with_param_names(["weight"])
//!     .with_seed(7);
//! let mut injector = Injector::new(config).unwrap();
//!
//! let report = injector.inject(&mut model).unwrap();
//! assert_eq!(report.params.len(), 2);
//! assert_eq!(injector.maxsize(), 16 * 8 * 32);
//! ```

mod config;
mod report;

pub use config::{ErrorModel, InjectorConfig, DEFAULT_PROBABILITY};
pub use report::{InjectionReport, ParamReport};

use crate::device::Device;
use crate::error::{InjectError, Result};
use crate::errormap::ErrorMap;
use crate::nn::Module;
use crate::serialization;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use tracing::{debug, info, warn};

/// Bit-flip fault injector.
///
/// Owns its RNG and the most recently generated or loaded error map.
#[derive(Debug)]
pub struct Injector {
    config: InjectorConfig,
    device: Device,
    bit_width: u32,
    maxsize: usize,
    error_map: Option<ErrorMap>,
    rng: StdRng,
}

impl Injector {
    /// Create an injector from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns the configuration error from [`InjectorConfig::validate`].
    pub fn new(config: InjectorConfig) -> Result<Self> {
        config.validate()?;
        let device = config.device.ok_or(InjectError::DeviceUnspecified)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        debug!(
            p = config.p,
            dtype = %config.dtype,
            device = %device,
            targets = ?config.param_names,
            "created injector"
        );

        Ok(Self {
            bit_width: config.dtype.bits(),
            config,
            device,
            maxsize: 0,
            error_map: None,
            rng,
        })
    }

    /// Re-run configuration validation.
    ///
    /// # Errors
    ///
    /// Returns the configuration error from [`InjectorConfig::validate`].
    pub fn validate(&self) -> Result<()> {
        self.config.validate()
    }

    /// The configuration this injector was built from.
    #[must_use]
    pub fn config(&self) -> &InjectorConfig {
        &self.config
    }

    /// Device error maps are placed on.
    #[must_use]
    pub fn device(&self) -> Device {
        self.device
    }

    /// Bits per parameter element.
    #[must_use]
    pub fn bit_width(&self) -> u32 {
        self.bit_width
    }

    /// Error map length found by the last size detection.
    #[must_use]
    pub fn maxsize(&self) -> usize {
        self.maxsize
    }

    /// The current error map, if one was generated or loaded.
    #[must_use]
    pub fn error_map(&self) -> Option<&ErrorMap> {
        self.error_map.as_ref()
    }

    /// Compute and store `maxsize` for `model`.
    ///
    /// `maxsize` is the largest `numel * bit_width` over targeted parameters,
    /// or 0 when nothing matches.
    pub fn errormap_size_detect<M: Module + ?Sized>(&mut self, model: &M) -> usize {
        let bit_width = self.bit_width as usize;
        self.maxsize = model
            .named_parameters()
            .into_iter()
            .filter(|(name, _)| self.config.targets(name))
            .map(|(_, param)| param.numel() * bit_width)
            .max()
            .unwrap_or(0);

        if self.maxsize == 0 {
            warn!(targets = ?self.config.param_names, "no parameters matched target names");
        }
        self.maxsize
    }

    /// Sample a fresh error map of `maxsize` words, replacing the current one.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::BackendUnavailable`] if the configured device
    /// has no backend.
    pub fn generate_error_map(&mut self) -> Result<&ErrorMap> {
        let map = ErrorMap::generate(
            self.maxsize,
            self.bit_width,
            self.config.p,
            self.device,
            &mut self.rng,
        )?;

        debug!(
            len = map.len(),
            flipped_bits = map.count_ones(),
            nonzero_words = map.nnz(),
            "generated error map"
        );
        Ok(&*self.error_map.insert(map))
    }

    /// Corrupt every targeted parameter of `model` with a freshly generated map.
    ///
    /// Parameter values are rewritten in place; shapes and gradient state are
    /// left as they were. Derived layer caches are refreshed afterwards.
    ///
    /// # Errors
    ///
    /// Propagates map generation errors and shape mismatches.
    pub fn inject<M: Module + ?Sized>(&mut self, model: &mut M) -> Result<InjectionReport> {
        self.errormap_size_detect(model);
        self.generate_error_map()?;
        self.apply_error_map(model)
    }

    /// Corrupt every targeted parameter of `model` with the current map,
    /// without regenerating it.
    ///
    /// Replays a map restored by [`load_error_map`](Self::load_error_map).
    ///
    /// # Errors
    ///
    /// - [`InjectError::NoErrorMap`] if no map was generated or loaded
    /// - [`InjectError::ShapeMismatch`] if a targeted parameter has more
    ///   elements than the map has words
    pub fn apply_error_map<M: Module + ?Sized>(
        &mut self,
        model: &mut M,
    ) -> Result<InjectionReport> {
        let map = self.error_map.as_ref().ok_or(InjectError::NoErrorMap)?;
        let mut report = InjectionReport {
            map_len: map.len(),
            bit_width: self.bit_width,
            params: Vec::new(),
        };

        for (name, param) in model.named_parameters_mut() {
            if !self.config.targets(&name) {
                continue;
            }

            let mask = map.permuted_slice(param.numel(), &mut self.rng)?;
            param.xor_bits_(&mask)?;

            let flipped_bits: u64 = mask.iter().map(|w| u64::from(w.count_ones())).sum();
            debug!(param = %name, numel = param.numel(), flipped_bits, "injected");
            report.params.push(ParamReport {
                name,
                numel: param.numel(),
                flipped_bits,
            });
        }
        model.refresh_caches();

        info!(
            params = report.params.len(),
            flipped_bits = report.total_flipped_bits(),
            map_len = report.map_len,
            "bit-flip injection complete"
        );
        Ok(report)
    }

    /// Save the current map, optionally in the sparse encoding.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::NoErrorMap`] if no map exists, or the
    /// serialization error.
    pub fn save_error_map<P: AsRef<Path>>(&self, path: P, sparse: bool) -> Result<()> {
        let map = self.error_map.as_ref().ok_or(InjectError::NoErrorMap)?;
        let host = map.clone().to_device(Device::Cpu)?;
        serialization::save_error_map(path.as_ref(), &host, sparse)?;
        info!(path = %path.as_ref().display(), sparse, len = host.len(), "saved error map");
        Ok(())
    }

    /// Replace the current map with one read from `path`.
    ///
    /// `sparse` must match how the file was saved. The map is moved to the
    /// configured device.
    ///
    /// # Errors
    ///
    /// Returns the deserialization or device error; the current map is kept
    /// on failure.
    pub fn load_error_map<P: AsRef<Path>>(&mut self, path: P, sparse: bool) -> Result<()> {
        let map = serialization::load_error_map(path.as_ref(), sparse)?.to_device(self.device)?;
        if map.bit_width() != self.bit_width {
            warn!(
                file_bit_width = map.bit_width(),
                dtype_bit_width = self.bit_width,
                "loaded error map bit width differs from dtype"
            );
        }
        info!(path = %path.as_ref().display(), sparse, len = map.len(), "loaded error map");
        self.error_map = Some(map);
        Ok(())
    }
}

#[cfg(test)]
mod tests;

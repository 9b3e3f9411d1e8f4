//! Bitflip: bit-flip fault injection for neural network parameters.
//!
//! Bitflip simulates soft errors in model memory. It samples an error map
//! in which every bit is flipped independently with probability `p`, then
//! XORs randomly permuted slices of that map into the raw IEEE 754 bits of
//! selected parameters.
//!
//! # Quick Start
//!
//! ```
//! use bitflip::prelude::*;
//!
//! let mut model = Sequential::new()
//!     .add(Linear::with_seed(4, 8, Some(0)))
//!     .add(ReLU::new())
//!     .add(Linear::with_seed(8, 2, Some(1)));
//!
//! let config = InjectorConfig::new()
//!     .with_probability(0.01)
//!     .with_device(Device::Cpu)
//!     .with_param_names(["weight"])
//!     .with_seed(42);
//!
//! let mut injector = Injector::new(config).unwrap();
//! let report = injector.inject(&mut model).unwrap();
//! assert_eq!(report.params.len(), 2);
//!
//! let output = model.forward(&Tensor::ones(&[1, 4]));
//! assert_eq!(output.shape(), &[1, 2]);
//! ```
//!
//! # Modules
//!
//! - [`injector`]: Configuration, size detection and injection
//! - [`errormap`]: Error map sampling and sparse encoding
//! - [`serialization`]: Error map files (SafeTensors layout)
//! - [`nn`]: Layers and containers exposing named parameters
//! - [`tensor`]: Dense `f32` tensor with bit-level access
//! - [`dtype`], [`device`]: Element types and compute devices
//! - [`error`]: Error taxonomy

pub mod device;
pub mod dtype;
pub mod error;
pub mod errormap;
pub mod injector;
pub mod nn;
pub mod prelude;
pub mod serialization;
pub mod tensor;

pub use error::{InjectError, Result};
pub use errormap::{ErrorMap, SparseErrorMap};
pub use injector::{Injector, InjectorConfig};

//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use bitflip::prelude::*;
//! ```

pub use crate::device::Device;
pub use crate::dtype::DType;
pub use crate::error::{InjectError, Result};
pub use crate::errormap::{ErrorMap, SparseErrorMap};
pub use crate::injector::{ErrorModel, InjectionReport, Injector, InjectorConfig};
pub use crate::nn::{Linear, Module, ModuleDict, ReLU, Sequential};
pub use crate::tensor::Tensor;

//! Neural network modules that fault injection operates on.
//!
//! The nn module is organized around the [`Module`] trait, which exposes
//! every parameter tensor under a dotted name:
//!
//! - **Layers**: [`Linear`]
//! - **Activations**: [`ReLU`]
//! - **Containers**: [`Sequential`], [`ModuleDict`]
//!
//! # Example
//!
//! ```
//! use bitflip::nn::{Linear, Module, ReLU, Sequential};
//! use bitflip::tensor::Tensor;
//!
//! let model = Sequential::new()
//!     .add(Linear::with_seed(784, 256, Some(0)))
//!     .add(ReLU::new())
//!     .add(Linear::with_seed(256, 10, Some(1)));
//!
//! let output = model.forward(&Tensor::ones(&[2, 784]));
//! assert_eq!(output.shape(), &[2, 10]);
//! ```

mod activation;
mod container;
pub mod init;
mod linear;
mod module;

pub use activation::ReLU;
pub use container::{ModuleDict, Sequential};
pub use linear::Linear;
pub use module::Module;

//! Activation function modules.

use super::module::Module;
use crate::tensor::Tensor;

/// Rectified Linear Unit activation: ReLU(x) = max(0, x)
///
/// Has no parameters, so it never contributes targets for injection.
///
/// # Example
///
/// ```
/// use bitflip::nn::{Module, ReLU};
/// use bitflip::tensor::Tensor;
///
/// let relu = ReLU::new();
/// let y = relu.forward(&Tensor::from_slice(&[-1.0, 0.0, 2.0]));
/// assert_eq!(y.data(), &[0.0, 0.0, 2.0]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ReLU;

impl ReLU {
    /// Create a new ReLU activation.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Module for ReLU {
    fn forward(&self, input: &Tensor) -> Tensor {
        let data: Vec<f32> = input.data().iter().map(|&x| x.max(0.0)).collect();
        Tensor::from_vec(data, input.shape())
    }
}

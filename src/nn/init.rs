//! Weight initialization functions.
//!
//! # References
//!
//! - Glorot, X., & Bengio, Y. (2010). Understanding the difficulty of training
//!   deep feedforward neural networks. AISTATS.

use crate::tensor::Tensor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Xavier uniform initialization (Glorot & Bengio, 2010).
///
/// Samples from U(-a, a) where a = sqrt(6 / (`fan_in` + `fan_out`)).
///
/// # Example
///
/// ```
/// use bitflip::nn::init::xavier_uniform;
///
/// let weight = xavier_uniform(&[256, 784], 784, 256, Some(7));
/// assert_eq!(weight.shape(), &[256, 784]);
/// ```
#[must_use]
pub fn xavier_uniform(shape: &[usize], fan_in: usize, fan_out: usize, seed: Option<u64>) -> Tensor {
    let a = (6.0 / (fan_in + fan_out).max(1) as f32).sqrt();
    uniform(shape, -a, a, seed)
}

/// Uniform distribution initialization: U(low, high).
pub(crate) fn uniform(shape: &[usize], low: f32, high: f32, seed: Option<u64>) -> Tensor {
    let numel: usize = shape.iter().product();
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    };

    let data: Vec<f32> = (0..numel).map(|_| rng.random_range(low..high)).collect();

    Tensor::from_vec(data, shape)
}

/// Zeros initialization.
pub(crate) fn zeros(shape: &[usize]) -> Tensor {
    Tensor::zeros(shape)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xavier_bounds() {
        let t = xavier_uniform(&[20, 10], 10, 20, Some(1));
        let a = (6.0f32 / 30.0).sqrt();
        assert!(t.data().iter().all(|&v| v >= -a && v < a));
    }

    #[test]
    fn test_seeded_reproducible() {
        let a = xavier_uniform(&[4, 4], 4, 4, Some(42));
        let b = xavier_uniform(&[4, 4], 4, 4, Some(42));
        assert_eq!(a.data(), b.data());
    }
}

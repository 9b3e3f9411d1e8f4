//! Fully connected (linear) layer.
//!
//! Implements the transformation y = xW^T + b.

use super::init::{xavier_uniform, zeros};
use super::module::Module;
use crate::tensor::Tensor;

/// Fully connected layer: y = xW^T + b
///
/// Exposes its parameters as `weight` and `bias`.
///
/// # Shape
///
/// - Input: `(batch, in_features)`
/// - Output: `(batch, out_features)`
pub struct Linear {
    /// Weight matrix, shape: [out_features, in_features]
    weight: Tensor,

    /// Cached transposed weight [in_features, out_features] for fast forward.
    /// Stale after in-place parameter edits until `refresh_caches` runs.
    weight_t: Tensor,

    /// Bias vector, shape: [out_features], or None if bias=false
    bias: Option<Tensor>,

    in_features: usize,
    out_features: usize,
}

impl Linear {
    /// Create a new Linear layer with Xavier initialization.
    #[must_use]
    pub fn new(in_features: usize, out_features: usize) -> Self {
        Self::with_seed(in_features, out_features, None)
    }

    /// Create a Linear layer with a specific random seed.
    #[must_use]
    pub fn with_seed(in_features: usize, out_features: usize, seed: Option<u64>) -> Self {
        let weight = xavier_uniform(
            &[out_features, in_features],
            in_features,
            out_features,
            seed,
        )
        .requires_grad();
        let weight_t = weight.transpose();
        let bias = zeros(&[out_features]).requires_grad();

        Self {
            weight,
            weight_t,
            bias: Some(bias),
            in_features,
            out_features,
        }
    }

    /// Create a Linear layer without bias.
    #[must_use]
    pub fn without_bias(in_features: usize, out_features: usize, seed: Option<u64>) -> Self {
        let mut layer = Self::with_seed(in_features, out_features, seed);
        layer.bias = None;
        layer
    }

    /// Get the input feature dimension.
    #[must_use]
    pub fn in_features(&self) -> usize {
        self.in_features
    }

    /// Get the output feature dimension.
    #[must_use]
    pub fn out_features(&self) -> usize {
        self.out_features
    }

    /// Check if this layer has a bias term.
    #[must_use]
    pub fn has_bias(&self) -> bool {
        self.bias.is_some()
    }

    /// Set weight tensor from external data.
    ///
    /// # Panics
    ///
    /// Panics if the shape is not `[out_features, in_features]`.
    pub fn set_weight(&mut self, weight: Tensor) {
        assert_eq!(
            weight.shape(),
            &[self.out_features, self.in_features],
            "weight shape mismatch"
        );
        self.weight_t = weight.transpose();
        self.weight = weight;
    }

    /// Set bias tensor from external data.
    ///
    /// # Panics
    ///
    /// Panics if the shape is not `[out_features]`.
    pub fn set_bias(&mut self, bias: Tensor) {
        assert_eq!(bias.shape(), &[self.out_features], "bias shape mismatch");
        self.bias = Some(bias);
    }

    /// Get reference to weight tensor.
    #[must_use]
    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    /// Get reference to bias tensor if present.
    #[must_use]
    pub fn bias(&self) -> Option<&Tensor> {
        self.bias.as_ref()
    }
}

impl Module for Linear {
    fn forward(&self, input: &Tensor) -> Tensor {
        let output = input.matmul(&self.weight_t);
        match &self.bias {
            Some(b) => output.broadcast_add(b),
            None => output,
        }
    }

    fn named_parameters(&self) -> Vec<(String, &Tensor)> {
        let mut params = vec![("weight".to_string(), &self.weight)];
        if let Some(b) = &self.bias {
            params.push(("bias".to_string(), b));
        }
        params
    }

    fn named_parameters_mut(&mut self) -> Vec<(String, &mut Tensor)> {
        let mut params = vec![("weight".to_string(), &mut self.weight)];
        if let Some(b) = &mut self.bias {
            params.push(("bias".to_string(), b));
        }
        params
    }

    fn refresh_caches(&mut self) {
        self.weight_t = self.weight.transpose();
    }
}

impl std::fmt::Debug for Linear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Linear")
            .field("in_features", &self.in_features)
            .field("out_features", &self.out_features)
            .field("bias", &self.bias.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_forward_shape() {
        let layer = Linear::new(10, 5);
        let output = layer.forward(&Tensor::ones(&[32, 10]));
        assert_eq!(output.shape(), &[32, 5]);
    }

    #[test]
    fn test_linear_named_parameters() {
        let layer = Linear::new(10, 5);
        let params = layer.named_parameters();

        assert_eq!(params.len(), 2);
        assert_eq!(params[0].0, "weight");
        assert_eq!(params[0].1.shape(), &[5, 10]);
        assert_eq!(params[1].0, "bias");
        assert_eq!(params[1].1.shape(), &[5]);
    }

    #[test]
    fn test_linear_without_bias() {
        let layer = Linear::without_bias(10, 5, Some(1));
        assert_eq!(layer.parameters().len(), 1);
        assert!(!layer.has_bias());
    }

    #[test]
    fn test_linear_num_parameters() {
        let layer = Linear::new(10, 5);
        assert_eq!(layer.num_parameters(), 55);
    }

    #[test]
    fn test_linear_reproducible() {
        let layer1 = Linear::with_seed(10, 5, Some(42));
        let layer2 = Linear::with_seed(10, 5, Some(42));
        assert_eq!(layer1.weight().data(), layer2.weight().data());
    }

    #[test]
    fn test_linear_identity() {
        let mut layer = Linear::with_seed(3, 3, Some(42));
        layer.set_weight(Tensor::new(
            &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            &[3, 3],
        ));
        layer.set_bias(Tensor::from_slice(&[0.5, 0.5, 0.5]));

        let output = layer.forward(&Tensor::new(&[1.0, 2.0, 3.0], &[1, 3]));
        assert_eq!(output.data(), &[1.5, 2.5, 3.5]);
    }

    #[test]
    fn test_refresh_caches_after_in_place_edit() {
        let mut layer = Linear::without_bias(2, 2, Some(3));
        layer.set_weight(Tensor::new(&[1.0, 0.0, 0.0, 1.0], &[2, 2]));

        for (_, p) in layer.named_parameters_mut() {
            p.data_mut().iter_mut().for_each(|v| *v *= 2.0);
        }
        layer.refresh_caches();

        let output = layer.forward(&Tensor::new(&[1.0, 1.0], &[1, 2]));
        assert_eq!(output.data(), &[2.0, 2.0]);
    }
}

//! The [`Module`] trait: a layer with named parameters.

use crate::tensor::Tensor;

/// Base trait for neural network layers.
///
/// Parameters are addressed by dotted paths such as `"encoder.0.weight"`.
/// The final path segment names the parameter inside its owning layer and
/// is what fault injection matches against.
pub trait Module {
    /// Forward pass.
    fn forward(&self, input: &Tensor) -> Tensor;

    /// All parameters with their dotted names, in a stable order.
    fn named_parameters(&self) -> Vec<(String, &Tensor)> {
        Vec::new()
    }

    /// Mutable access to all parameters with their dotted names.
    ///
    /// Must yield the same names in the same order as [`named_parameters`](Module::named_parameters).
    fn named_parameters_mut(&mut self) -> Vec<(String, &mut Tensor)> {
        Vec::new()
    }

    /// All parameters without names.
    fn parameters(&self) -> Vec<&Tensor> {
        self.named_parameters().into_iter().map(|(_, p)| p).collect()
    }

    /// Total number of scalar parameters.
    fn num_parameters(&self) -> usize {
        self.parameters().iter().map(|p| p.numel()).sum()
    }

    /// Recompute derived state after parameters were modified in place.
    fn refresh_caches(&mut self) {}
}

/// Prefix every name in `params` with `"{prefix}."`.
pub(crate) fn prefixed<T>(prefix: &str, params: Vec<(String, T)>) -> Vec<(String, T)> {
    params
        .into_iter()
        .map(|(name, p)| (format!("{prefix}.{name}"), p))
        .collect()
}

//! Dense `f32` tensor with device tag and bit-level access.
//!
//! This is the slice of a tensor runtime that fault injection needs:
//! shaped storage, a gradient flag that injection must leave alone, device
//! transfer and reinterpretation of values as raw `u32` bit patterns.

use std::fmt;

use crate::device::Device;
use crate::error::{InjectError, Result};

/// A dense, row-major `f32` tensor.
///
/// # Design
///
/// The tensor stores:
/// - `data`: the numerical values
/// - `shape`: dimensions of the tensor
/// - `device`: where the values live
/// - `requires_grad`: whether the tensor is a trainable parameter
/// - `grad`: accumulated gradient, if any
#[derive(Clone, PartialEq)]
pub struct Tensor {
    data: Vec<f32>,
    shape: Vec<usize>,
    device: Device,
    requires_grad: bool,
    grad: Option<Box<Tensor>>,
}

impl Tensor {
    /// Create a new tensor from a slice with the given shape.
    ///
    /// By default, gradient tracking is disabled and the tensor lives on the CPU.
    ///
    /// # Panics
    ///
    /// Panics if the data length doesn't match the product of shape dimensions.
    #[must_use]
    pub fn new(data: &[f32], shape: &[usize]) -> Self {
        Self::from_vec(data.to_vec(), shape)
    }

    /// Create a tensor taking ownership of `data`.
    ///
    /// # Panics
    ///
    /// Panics if the data length doesn't match the product of shape dimensions.
    #[must_use]
    pub fn from_vec(data: Vec<f32>, shape: &[usize]) -> Self {
        let expected_len: usize = shape.iter().product();
        assert_eq!(
            data.len(),
            expected_len,
            "Data length {} doesn't match shape {:?} (expected {})",
            data.len(),
            shape,
            expected_len
        );

        Self {
            data,
            shape: shape.to_vec(),
            device: Device::Cpu,
            requires_grad: false,
            grad: None,
        }
    }

    /// Create a tensor from a 1D slice (vector).
    #[must_use]
    pub fn from_slice(data: &[f32]) -> Self {
        Self::new(data, &[data.len()])
    }

    /// Create a tensor filled with zeros.
    #[must_use]
    pub fn zeros(shape: &[usize]) -> Self {
        let len: usize = shape.iter().product();
        Self::from_vec(vec![0.0; len], shape)
    }

    /// Create a tensor filled with ones.
    #[must_use]
    pub fn ones(shape: &[usize]) -> Self {
        let len: usize = shape.iter().product();
        Self::from_vec(vec![1.0; len], shape)
    }

    /// Enable gradient tracking for this tensor.
    #[must_use]
    pub fn requires_grad(mut self) -> Self {
        self.requires_grad = true;
        self
    }

    /// Check if this tensor requires gradient computation.
    #[must_use]
    pub fn requires_grad_enabled(&self) -> bool {
        self.requires_grad
    }

    /// Get the shape of the tensor.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get the total number of elements.
    #[must_use]
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Get the number of dimensions.
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Get a reference to the underlying data.
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Get a mutable reference to the underlying data.
    ///
    /// Writes through this slice bypass gradient tracking.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Device the tensor lives on.
    #[must_use]
    pub fn device(&self) -> Device {
        self.device
    }

    /// Move the tensor to `device`.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::BackendUnavailable`] if the device has no backend.
    pub fn to_device(mut self, device: Device) -> Result<Self> {
        device.ensure_available()?;
        self.device = device;
        Ok(self)
    }

    /// Get the gradient tensor (if any).
    #[must_use]
    pub fn grad(&self) -> Option<&Tensor> {
        self.grad.as_deref()
    }

    /// Replace the stored gradient.
    pub fn set_grad(&mut self, grad: Tensor) {
        self.grad = Some(Box::new(grad));
    }

    /// Clear the gradient.
    pub fn zero_grad_(&mut self) {
        self.grad = None;
    }

    /// Reinterpret every element as its IEEE 754 bit pattern.
    #[must_use]
    pub fn to_bits(&self) -> Vec<u32> {
        self.data.iter().map(|v| v.to_bits()).collect()
    }

    /// XOR each element's bit pattern with the matching mask word, in place.
    ///
    /// The gradient and `requires_grad` flag are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::ShapeMismatch`] if `mask` has a different length.
    pub fn xor_bits_(&mut self, mask: &[u32]) -> Result<()> {
        if mask.len() != self.data.len() {
            return Err(InjectError::ShapeMismatch {
                expected: self.shape.clone(),
                got: vec![mask.len()],
            });
        }

        for (value, &bits) in self.data.iter_mut().zip(mask) {
            *value = f32::from_bits(value.to_bits() ^ bits);
        }
        Ok(())
    }

    /// Transpose a 2D tensor.
    ///
    /// # Panics
    ///
    /// Panics if the tensor is not 2D.
    #[must_use]
    pub fn transpose(&self) -> Tensor {
        assert_eq!(self.ndim(), 2, "transpose() requires a 2D tensor");
        let (rows, cols) = (self.shape[0], self.shape[1]);
        let mut out = vec![0.0f32; rows * cols];
        for r in 0..rows {
            for c in 0..cols {
                out[c * rows + r] = self.data[r * cols + c];
            }
        }
        let mut t = Tensor::from_vec(out, &[cols, rows]);
        t.device = self.device;
        t
    }

    /// Matrix product of two 2D tensors.
    ///
    /// # Panics
    ///
    /// Panics if either tensor is not 2D or the inner dimensions differ.
    #[must_use]
    pub fn matmul(&self, other: &Tensor) -> Tensor {
        assert_eq!(self.ndim(), 2, "matmul() requires 2D lhs");
        assert_eq!(other.ndim(), 2, "matmul() requires 2D rhs");
        let (m, k) = (self.shape[0], self.shape[1]);
        let (k2, n) = (other.shape[0], other.shape[1]);
        assert_eq!(k, k2, "matmul() inner dimensions differ: {k} vs {k2}");

        let mut out = vec![0.0f32; m * n];
        for i in 0..m {
            for p in 0..k {
                let a = self.data[i * k + p];
                let row = &other.data[p * n..(p + 1) * n];
                for (o, &b) in out[i * n..(i + 1) * n].iter_mut().zip(row) {
                    *o += a * b;
                }
            }
        }
        Tensor::from_vec(out, &[m, n])
    }

    /// Add a 1D tensor to every row of a 2D tensor.
    ///
    /// # Panics
    ///
    /// Panics if `row` length differs from the last dimension.
    #[must_use]
    pub fn broadcast_add(&self, row: &Tensor) -> Tensor {
        let cols = *self.shape.last().unwrap_or(&0);
        assert_eq!(
            row.numel(),
            cols,
            "broadcast_add() expects {cols} elements, got {}",
            row.numel()
        );
        let data: Vec<f32> = self
            .data
            .iter()
            .enumerate()
            .map(|(i, &v)| v + row.data[i % cols])
            .collect();
        Tensor::from_vec(data, &self.shape)
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape)
            .field("device", &self.device)
            .field("requires_grad", &self.requires_grad)
            .field("has_grad", &self.grad.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tensor_creation() {
        let t = Tensor::new(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
        assert_eq!(t.shape(), &[2, 2]);
        assert_eq!(t.numel(), 4);
        assert_eq!(t.ndim(), 2);
        assert_eq!(t.device(), Device::Cpu);
    }

    #[test]
    #[should_panic(expected = "doesn't match shape")]
    fn test_tensor_shape_mismatch_panics() {
        let _ = Tensor::new(&[1.0, 2.0, 3.0], &[2, 2]);
    }

    #[test]
    fn test_to_bits_matches_ieee754() {
        let t = Tensor::from_slice(&[1.0, -2.0, 0.0]);
        assert_eq!(t.to_bits(), vec![0x3F80_0000, 0xC000_0000, 0]);
    }

    #[test]
    fn test_xor_sign_bit() {
        let mut t = Tensor::from_slice(&[1.5, -3.0]);
        t.xor_bits_(&[0x8000_0000, 0x8000_0000]).expect("xor");
        assert_eq!(t.data(), &[-1.5, 3.0]);
    }

    #[test]
    fn test_xor_twice_restores() {
        let clean = Tensor::new(&[0.1, 0.2, 0.3, 0.4], &[2, 2]);
        let mut t = clean.clone();
        let mask = [0xDEAD_BEEF, 1, 0, 0xFFFF_FFFF];
        t.xor_bits_(&mask).expect("xor");
        assert_ne!(t.to_bits(), clean.to_bits());
        t.xor_bits_(&mask).expect("xor");
        assert_eq!(t.to_bits(), clean.to_bits());
    }

    #[test]
    fn test_xor_preserves_grad_state() {
        let mut t = Tensor::from_slice(&[1.0, 2.0]).requires_grad();
        t.set_grad(Tensor::from_slice(&[0.5, 0.5]));
        t.xor_bits_(&[1, 1]).expect("xor");
        assert!(t.requires_grad_enabled());
        assert_eq!(t.grad().map(Tensor::data), Some(&[0.5f32, 0.5][..]));
    }

    #[test]
    fn test_xor_length_mismatch() {
        let mut t = Tensor::zeros(&[2, 3]);
        let err = t.xor_bits_(&[0; 5]).expect_err("should fail");
        assert!(matches!(err, InjectError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_to_device() {
        let t = Tensor::ones(&[3]);
        assert!(t.clone().to_device(Device::Cpu).is_ok());
        assert!(matches!(
            t.to_device(Device::Cuda(0)),
            Err(InjectError::BackendUnavailable { .. })
        ));
    }

    #[test]
    fn test_transpose_and_matmul() {
        let a = Tensor::new(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        let at = a.transpose();
        assert_eq!(at.shape(), &[3, 2]);
        assert_eq!(at.data(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);

        let prod = a.matmul(&at);
        assert_eq!(prod.shape(), &[2, 2]);
        assert_eq!(prod.data(), &[14.0, 32.0, 32.0, 77.0]);
    }

    #[test]
    fn test_broadcast_add() {
        let x = Tensor::zeros(&[2, 3]);
        let b = Tensor::from_slice(&[1.0, 2.0, 3.0]);
        assert_eq!(x.broadcast_add(&b).data(), &[1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
    }
}

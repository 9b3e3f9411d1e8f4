//! Coordinate (COO) encoding of an error map.
//!
//! # Memory Layout
//! - `indices`: \[nnz\] - strictly increasing positions of non-zero words
//! - `values`: \[nnz\] - the words at those positions
//!
//! ```text
//! Dense:  [0, 0, 5, 0, 0x80000000, 0]   COO:
//!                                       indices: [2, 4]
//!                                       values:  [5, 0x80000000]
//!                                       len: 6
//! ```

use super::{width_mask, ErrorMap};
use crate::error::{InjectError, Result};

/// Sparse error map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseErrorMap {
    len: usize,
    bit_width: u32,
    indices: Vec<u64>,
    values: Vec<u32>,
}

impl SparseErrorMap {
    /// Create a sparse map from components.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::Format`] if the component lengths differ, the
    /// indices are not strictly increasing or in bounds, or a value sets bits
    /// beyond `bit_width`.
    pub fn new(len: usize, bit_width: u32, indices: Vec<u64>, values: Vec<u32>) -> Result<Self> {
        if indices.len() != values.len() {
            return Err(InjectError::format(format!(
                "indices length ({}) != values length ({})",
                indices.len(),
                values.len()
            )));
        }

        for pair in indices.windows(2) {
            if pair[1] <= pair[0] {
                return Err(InjectError::format(format!(
                    "indices not strictly increasing: {} then {}",
                    pair[0], pair[1]
                )));
            }
        }

        if let Some(&last) = indices.last() {
            if last >= len as u64 {
                return Err(InjectError::format(format!(
                    "index {last} out of bounds (len={len})"
                )));
            }
        }

        let allowed = width_mask(bit_width);
        if values.iter().any(|&v| v & !allowed != 0) {
            return Err(InjectError::format(format!(
                "value sets bits beyond bit width {bit_width}"
            )));
        }

        Ok(Self::from_parts_unchecked(len, bit_width, indices, values))
    }

    pub(super) fn from_parts_unchecked(
        len: usize,
        bit_width: u32,
        indices: Vec<u64>,
        values: Vec<u32>,
    ) -> Self {
        Self {
            len,
            bit_width,
            indices,
            values,
        }
    }

    /// Logical (dense) length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the logical length is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bits per word.
    #[must_use]
    pub fn bit_width(&self) -> u32 {
        self.bit_width
    }

    /// Positions of the stored words.
    #[must_use]
    pub fn indices(&self) -> &[u64] {
        &self.indices
    }

    /// Stored words.
    #[must_use]
    pub fn values(&self) -> &[u32] {
        &self.values
    }

    /// Number of stored entries.
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Expand into a dense CPU map.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::Format`] if the dense buffer cannot be
    /// allocated, and propagates [`ErrorMap::from_words`] validation errors.
    pub fn to_dense(&self) -> Result<ErrorMap> {
        let mut words = Vec::new();
        words.try_reserve_exact(self.len).map_err(|e| {
            InjectError::format(format!("cannot allocate {} words: {e}", self.len))
        })?;
        words.resize(self.len, 0u32);
        for (&i, &v) in self.indices.iter().zip(&self.values) {
            let slot = usize::try_from(i)
                .ok()
                .and_then(|i| words.get_mut(i))
                .ok_or_else(|| {
                    InjectError::format(format!("index {i} out of bounds (len={})", self.len))
                })?;
            *slot = v;
        }
        ErrorMap::from_words(words, self.bit_width)
    }

    /// Memory usage in bytes (approximate).
    #[must_use]
    pub fn memory_bytes(&self) -> usize {
        self.indices.len() * size_of::<u64>() + self.values.len() * size_of::<u32>()
    }

    /// Dense memory usage for comparison.
    #[must_use]
    pub fn dense_memory_bytes(&self) -> usize {
        self.len * size_of::<u32>()
    }
}

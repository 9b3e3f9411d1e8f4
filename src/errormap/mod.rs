//! Bit-error maps.
//!
//! An error map is a flat sequence of bitmask words. Word `i` holds the bit
//! positions to flip in whichever parameter element it is paired with during
//! injection. Each of the `bit_width` positions of every word is set
//! independently with probability `p`.
//!
//! # Formats
//! - [`ErrorMap`]: dense, one word per slot
//! - [`SparseErrorMap`]: coordinate encoding of the non-zero words, used to
//!   shrink mostly-zero maps on disk

mod sparse;

pub use sparse::SparseErrorMap;

use crate::device::Device;
use crate::error::{InjectError, Result};
use rand::distr::{Bernoulli, Distribution};
use rand::Rng;

/// Dense bit-error map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMap {
    words: Vec<u32>,
    bit_width: u32,
    device: Device,
}

impl ErrorMap {
    /// Sample a new map of `len` words.
    ///
    /// Starts from a `(len, bit_width)` table of powers of two, passes every
    /// entry through a binary Bernoulli filter that keeps it with probability
    /// `p`, and sums each row into one word.
    ///
    /// # Errors
    ///
    /// - [`InjectError::InvalidProbability`] if `p` is not in [0, 1]
    /// - [`InjectError::NotImplemented`] if `bit_width` is 0 or above 32
    /// - [`InjectError::BackendUnavailable`] if `device` has no backend
    pub fn generate<R: Rng + ?Sized>(
        len: usize,
        bit_width: u32,
        p: f64,
        device: Device,
        rng: &mut R,
    ) -> Result<Self> {
        check_bit_width(bit_width)?;
        device.ensure_available()?;
        let filter = Bernoulli::new(p).map_err(|_| InjectError::InvalidProbability { value: p })?;

        let words = (0..len)
            .map(|_| {
                (0..bit_width).fold(0u32, |word, bit| {
                    if filter.sample(rng) {
                        word | (1u32 << bit)
                    } else {
                        word
                    }
                })
            })
            .collect();

        Ok(Self {
            words,
            bit_width,
            device,
        })
    }

    /// Build a CPU map from existing words.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::Format`] if a word sets bits at or above
    /// `bit_width`.
    pub fn from_words(words: Vec<u32>, bit_width: u32) -> Result<Self> {
        check_bit_width(bit_width)?;
        let allowed = width_mask(bit_width);
        if let Some(pos) = words.iter().position(|&w| w & !allowed != 0) {
            return Err(InjectError::format(format!(
                "word {pos} sets bits beyond bit width {bit_width}"
            )));
        }
        Ok(Self {
            words,
            bit_width,
            device: Device::Cpu,
        })
    }

    /// Number of words.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the map has no words.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Bits per word that may be set.
    #[must_use]
    pub fn bit_width(&self) -> u32 {
        self.bit_width
    }

    /// Device the map lives on.
    #[must_use]
    pub fn device(&self) -> Device {
        self.device
    }

    /// Raw words.
    #[must_use]
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Total number of set bits.
    #[must_use]
    pub fn count_ones(&self) -> u64 {
        self.words.iter().map(|w| u64::from(w.count_ones())).sum()
    }

    /// Number of non-zero words.
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.words.iter().filter(|&&w| w != 0).count()
    }

    /// Observed fraction of set bits over all `len * bit_width` positions.
    #[must_use]
    pub fn bit_error_rate(&self) -> f64 {
        let total = self.words.len() as f64 * f64::from(self.bit_width);
        if total == 0.0 {
            return 0.0;
        }
        self.count_ones() as f64 / total
    }

    /// First `n` words of a uniformly random permutation of the map.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::ShapeMismatch`] if `n` exceeds the map length.
    pub fn permuted_slice<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<u32>> {
        if n > self.words.len() {
            return Err(InjectError::length_mismatch(self.words.len(), n));
        }
        Ok(rand::seq::index::sample(rng, self.words.len(), n)
            .into_iter()
            .map(|i| self.words[i])
            .collect())
    }

    /// Move the map to `device`.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::BackendUnavailable`] if `device` has no backend.
    pub fn to_device(mut self, device: Device) -> Result<Self> {
        device.ensure_available()?;
        self.device = device;
        Ok(self)
    }

    /// Coordinate encoding of the non-zero words.
    #[must_use]
    pub fn to_sparse(&self) -> SparseErrorMap {
        let (indices, values) = self
            .words
            .iter()
            .enumerate()
            .filter(|(_, w)| **w != 0)
            .map(|(i, &w)| (i as u64, w))
            .unzip();
        SparseErrorMap::from_parts_unchecked(self.words.len(), self.bit_width, indices, values)
    }
}

fn check_bit_width(bit_width: u32) -> Result<()> {
    if bit_width == 0 || bit_width > u32::BITS {
        return Err(InjectError::NotImplemented {
            feature: format!("{bit_width}-bit error maps"),
        });
    }
    Ok(())
}

/// Mask with the low `bit_width` bits set.
pub(crate) fn width_mask(bit_width: u32) -> u32 {
    if bit_width >= u32::BITS {
        u32::MAX
    } else {
        (1u32 << bit_width) - 1
    }
}

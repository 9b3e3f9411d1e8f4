//! Summary of one injection pass.

use serde::{Deserialize, Serialize};

/// Flip statistics for one corrupted parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamReport {
    /// Dotted parameter name
    pub name: String,
    /// Number of elements
    pub numel: usize,
    /// Number of bits flipped
    pub flipped_bits: u64,
}

/// Result of [`Injector::inject`](super::Injector::inject).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectionReport {
    /// Length of the error map the masks were drawn from
    pub map_len: usize,
    /// Bits per element
    pub bit_width: u32,
    /// Targeted parameters, in model order
    pub params: Vec<ParamReport>,
}

impl InjectionReport {
    /// Total bits flipped across all parameters.
    #[must_use]
    pub fn total_flipped_bits(&self) -> u64 {
        self.params.iter().map(|p| p.flipped_bits).sum()
    }

    /// Total elements across all targeted parameters.
    #[must_use]
    pub fn total_elements(&self) -> usize {
        self.params.iter().map(|p| p.numel).sum()
    }

    /// Fraction of targeted bits that were flipped.
    #[must_use]
    pub fn observed_bit_error_rate(&self) -> f64 {
        let bits = self.total_elements() as f64 * f64::from(self.bit_width);
        if bits == 0.0 {
            return 0.0;
        }
        self.total_flipped_bits() as f64 / bits
    }

    /// Report for the parameter called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamReport> {
        self.params.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals() {
        let report = InjectionReport {
            map_len: 3200,
            bit_width: 32,
            params: vec![
                ParamReport {
                    name: "0.weight".to_string(),
                    numel: 100,
                    flipped_bits: 6,
                },
                ParamReport {
                    name: "1.weight".to_string(),
                    numel: 60,
                    flipped_bits: 2,
                },
            ],
        };
        assert_eq!(report.total_flipped_bits(), 8);
        assert_eq!(report.total_elements(), 160);
        assert!((report.observed_bit_error_rate() - 8.0 / 5120.0).abs() < 1e-12);
        assert_eq!(report.get("1.weight").map(|p| p.numel), Some(60));
        assert!(report.get("bias").is_none());
    }

    #[test]
    fn test_empty_rate() {
        assert_eq!(InjectionReport::default().observed_bit_error_rate(), 0.0);
    }
}

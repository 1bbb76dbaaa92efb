use serde::{Serialize, Deserialize};

use crate::error::{MetricError, MetricResult};

/// Per-channel input normalization: `(x - mean[c]) / std[c]`.
///
/// Inputs are flattened channel-major (all of channel 0, then channel 1, ...),
/// so channel `c` covers `input[c * plane .. (c + 1) * plane]` where
/// `plane = input.len() / channels`. The constants are fixed per model
/// variant, never learned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normalize {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Normalize {
    /// # Panics
    /// Panics if `mean` and `std` differ in length, are empty, or any std is
    /// not strictly positive.
    pub fn new(mean: Vec<f64>, std: Vec<f64>) -> Normalize {
        assert!(!mean.is_empty(), "Normalize needs at least one channel");
        assert_eq!(mean.len(), std.len(), "mean and std must have one entry per channel");
        assert!(std.iter().all(|&s| s > 0.0), "std must be strictly positive");
        Normalize { mean, std }
    }

    pub fn channels(&self) -> usize {
        self.mean.len()
    }

    pub fn apply(&self, input: &[f64]) -> MetricResult<Vec<f64>> {
        let channels = self.channels();
        if input.is_empty() || input.len() % channels != 0 {
            return Err(MetricError::InputShape {
                what: "normalized input",
                left: input.len(),
                // nearest larger length that splits evenly into channels
                right: (input.len() / channels + 1) * channels,
            });
        }
        let plane = input.len() / channels;
        Ok(input
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let c = i / plane;
                (x - self.mean[c]) / self.std[c]
            })
            .collect())
    }
}

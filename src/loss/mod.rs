pub mod cross_entropy;

pub use cross_entropy::CrossEntropyLoss;

use crate::error::MetricResult;

/// Scalar loss over a batch of logits and their true class indices.
pub trait Loss {
    fn loss(&self, logits: &[Vec<f64>], targets: &[usize]) -> MetricResult<f64>;
}

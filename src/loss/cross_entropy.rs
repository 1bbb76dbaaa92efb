use crate::error::{MetricError, MetricResult};
use crate::loss::Loss;

/// Categorical cross-entropy over raw logits, averaged over the batch.
///
/// Per sample: `L = logsumexp(z) - z[target]`, which equals
/// `-ln(softmax(z)[target])` without ever forming the probabilities, so very
/// large or very negative logits do not overflow or hit `ln(0)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrossEntropyLoss;

impl CrossEntropyLoss {
    fn sample_loss(logits: &[f64], target: usize) -> MetricResult<f64> {
        let z_t = *logits.get(target).ok_or(MetricError::ClassOutOfRange {
            index: target,
            num_classes: logits.len(),
        })?;
        let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let lse = max + logits.iter().map(|&z| (z - max).exp()).sum::<f64>().ln();
        Ok(lse - z_t)
    }
}

impl Loss for CrossEntropyLoss {
    fn loss(&self, logits: &[Vec<f64>], targets: &[usize]) -> MetricResult<f64> {
        if logits.len() != targets.len() {
            return Err(MetricError::InputShape {
                what: "logits",
                left: logits.len(),
                right: targets.len(),
            });
        }
        if targets.is_empty() {
            return Err(MetricError::EmptyBatch);
        }
        let mut total = 0.0;
        for (row, &t) in logits.iter().zip(targets) {
            total += CrossEntropyLoss::sample_loss(row, t)?;
        }
        Ok(total / targets.len() as f64)
    }
}

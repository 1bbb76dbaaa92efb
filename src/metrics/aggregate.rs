use serde::{Serialize, Deserialize};

use crate::error::{MetricError, MetricResult};

/// Which streaming statistic a `RunningAggregate` maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateKind {
    Mean,
    Max,
}

/// Streaming mean or max over the scalars seen since the last `reset()`.
///
/// With zero updates `compute()` returns `None`; there is no meaningful mean
/// of nothing, and a `-inf` max would leak the sentinel into logs.
#[derive(Debug, Clone, PartialEq)]
pub struct RunningAggregate {
    kind: AggregateKind,
    sum: f64,
    max: f64,
    count: u64,
}

impl RunningAggregate {
    pub fn new(kind: AggregateKind) -> Self {
        RunningAggregate {
            kind,
            sum: 0.0,
            max: f64::NEG_INFINITY,
            count: 0,
        }
    }

    pub fn mean() -> Self {
        RunningAggregate::new(AggregateKind::Mean)
    }

    pub fn max() -> Self {
        RunningAggregate::new(AggregateKind::Max)
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Incorporates one value. NaN and infinities are rejected and leave the
    /// state untouched.
    pub fn update(&mut self, value: f64) -> MetricResult<()> {
        if !value.is_finite() {
            return Err(MetricError::NonFinite(value));
        }
        self.sum += value;
        self.max = self.max.max(value);
        self.count += 1;
        Ok(())
    }

    pub fn compute(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(match self.kind {
            AggregateKind::Mean => self.sum / self.count as f64,
            AggregateKind::Max  => self.max,
        })
    }

    pub fn reset(&mut self) {
        self.sum = 0.0;
        self.max = f64::NEG_INFINITY;
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_after_reset_only_sees_new_values() {
        let mut agg = RunningAggregate::mean();
        agg.update(10.0).unwrap();
        agg.update(20.0).unwrap();
        agg.reset();
        agg.update(3.5).unwrap();
        assert_eq!(agg.compute(), Some(3.5));
    }

    #[test]
    fn max_tracks_largest() {
        let mut agg = RunningAggregate::max();
        for v in [3.0, 7.0, 2.0] {
            agg.update(v).unwrap();
        }
        assert_eq!(agg.compute(), Some(7.0));
    }

    #[test]
    fn max_handles_all_negative_values() {
        let mut agg = RunningAggregate::max();
        agg.update(-4.0).unwrap();
        agg.update(-9.0).unwrap();
        assert_eq!(agg.compute(), Some(-4.0));
    }

    #[test]
    fn empty_aggregate_has_no_value() {
        assert_eq!(RunningAggregate::mean().compute(), None);
        let mut agg = RunningAggregate::max();
        agg.update(1.0).unwrap();
        agg.reset();
        assert_eq!(agg.compute(), None);
    }

    #[test]
    fn nan_is_rejected_without_poisoning_state() {
        let mut agg = RunningAggregate::mean();
        agg.update(2.0).unwrap();
        assert!(matches!(agg.update(f64::NAN), Err(MetricError::NonFinite(_))));
        assert_eq!(agg.compute(), Some(2.0));
        assert_eq!(agg.count(), 1);
    }
}

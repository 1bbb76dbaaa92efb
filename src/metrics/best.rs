use serde::{Serialize, Deserialize};

use crate::error::{MetricError, MetricResult};

/// Direction in which a tracked metric improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    Maximize,
    Minimize,
}

/// Best value of one metric observed across epochs.
///
/// Unlike the per-epoch aggregates this is never reset by the epoch
/// lifecycle; only an explicit `reset()` clears it (done once at true
/// training start so a sanity-check pass cannot seed it).
#[derive(Debug, Clone, PartialEq)]
pub struct BestMetricTracker {
    objective: Objective,
    best: Option<f64>,
}

impl BestMetricTracker {
    pub fn new(objective: Objective) -> Self {
        BestMetricTracker { objective, best: None }
    }

    pub fn maximize() -> Self {
        BestMetricTracker::new(Objective::Maximize)
    }

    /// Folds in one epoch's value. Returns `true` when it became the new best.
    pub fn update(&mut self, value: f64) -> MetricResult<bool> {
        if !value.is_finite() {
            return Err(MetricError::NonFinite(value));
        }
        let improved = match (self.best, self.objective) {
            (None, _) => true,
            (Some(best), Objective::Maximize) => value > best,
            (Some(best), Objective::Minimize) => value < best,
        };
        if improved {
            self.best = Some(value);
        }
        Ok(improved)
    }

    pub fn compute(&self) -> Option<f64> {
        self.best
    }

    pub fn reset(&mut self) {
        self.best = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_so_far_sequence() {
        let mut tracker = BestMetricTracker::maximize();
        let reported: Vec<f64> = [0.5, 0.7, 0.6]
            .iter()
            .map(|&acc| {
                tracker.update(acc).unwrap();
                tracker.compute().unwrap()
            })
            .collect();
        assert_eq!(reported, vec![0.5, 0.7, 0.7]);
    }

    #[test]
    fn reset_discards_sanity_check_value() {
        let mut tracker = BestMetricTracker::maximize();
        tracker.update(0.9).unwrap();
        tracker.reset();
        tracker.update(0.4).unwrap();
        assert_eq!(tracker.compute(), Some(0.4));
    }

    #[test]
    fn minimize_keeps_lowest() {
        let mut tracker = BestMetricTracker::new(Objective::Minimize);
        assert!(tracker.update(1.2).unwrap());
        assert!(!tracker.update(1.5).unwrap());
        assert!(tracker.update(0.8).unwrap());
        assert_eq!(tracker.compute(), Some(0.8));
    }
}

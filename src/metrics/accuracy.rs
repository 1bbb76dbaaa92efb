use serde::{Serialize, Deserialize};

use crate::error::{MetricError, MetricResult};

/// Classification task; determines how many class indices are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Task {
    Binary,
    Multiclass { num_classes: usize },
}

impl Task {
    pub fn num_classes(&self) -> usize {
        match self {
            Task::Binary => 2,
            Task::Multiclass { num_classes } => *num_classes,
        }
    }
}

/// Accumulates correct/total counts over predicted vs. true class indices.
///
/// The result depends only on the multiset of (prediction, target) pairs seen
/// since the last reset, never on how they were grouped into batches.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationScorer {
    task: Task,
    correct: u64,
    total: u64,
}

impl ClassificationScorer {
    pub fn new(task: Task) -> Self {
        ClassificationScorer { task, correct: 0, total: 0 }
    }

    pub fn task(&self) -> Task {
        self.task
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Checks that a batch could be scored without touching any counts.
    pub fn validate(&self, predictions: &[usize], targets: &[usize]) -> MetricResult<()> {
        if predictions.len() != targets.len() {
            return Err(MetricError::InputShape {
                what: "predictions",
                left: predictions.len(),
                right: targets.len(),
            });
        }
        let num_classes = self.task.num_classes();
        if let Some(&index) = predictions.iter().chain(targets).find(|&&i| i >= num_classes) {
            return Err(MetricError::ClassOutOfRange { index, num_classes });
        }
        Ok(())
    }

    /// Scores one batch. The whole batch is validated before any count
    /// changes, so a failed update leaves the scorer as it was.
    pub fn update(&mut self, predictions: &[usize], targets: &[usize]) -> MetricResult<()> {
        self.validate(predictions, targets)?;

        let correct = predictions.iter().zip(targets).filter(|(p, t)| p == t).count();
        self.correct += correct as u64;
        self.total += targets.len() as u64;
        Ok(())
    }

    /// Fraction correct in `[0, 1]`, or `None` before any example was scored.
    pub fn compute(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some(self.correct as f64 / self.total as f64)
    }

    pub fn reset(&mut self) {
        self.correct = 0;
        self.total = 0;
    }
}

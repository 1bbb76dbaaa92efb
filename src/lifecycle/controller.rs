use serde::{Serialize, Deserialize};

use crate::activation::argmax;
use crate::data::{Batch, StepResult};
use crate::error::{LifecycleError, LifecycleResult, MetricError, MetricResult};
use crate::lifecycle::phase::Phase;
use crate::loss::Loss;
use crate::metrics::{ClassificationScorer, LogOptions, MetricRecord, MetricSink, RunningAggregate, Task};
use crate::model::Model;

/// How an epoch's accuracy is accumulated.
///
/// Both policies produce the same number for the same predictions; they
/// differ only in memory. `Incremental` feeds every batch to the scorer and
/// forgets it. `Buffered` keeps the epoch's predictions and targets and
/// scores them once in `end_epoch`, so memory grows with the epoch size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    #[default]
    Incremental,
    Buffered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Running { epoch: usize },
}

/// Final values of one phase's epoch, as returned by `end_epoch`.
///
/// `loss` and `accuracy` are `None` when the epoch saw no batches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochSummary {
    pub phase: Phase,
    pub epoch: usize,
    pub loss: Option<f64>,
    pub accuracy: Option<f64>,
    pub batches: usize,
    pub samples: usize,
}

/// Drives `begin_epoch → process_batch* → end_epoch` for one phase and owns
/// that phase's loss mean and accuracy scorer.
#[derive(Debug, Clone)]
pub struct EpochController {
    phase: Phase,
    policy: ScoringPolicy,
    state: ControllerState,
    loss: RunningAggregate,
    scorer: ClassificationScorer,
    buffered_predictions: Vec<usize>,
    buffered_targets: Vec<usize>,
    batches: usize,
    samples: usize,
}

impl EpochController {
    pub fn new(phase: Phase, task: Task, policy: ScoringPolicy) -> Self {
        EpochController {
            phase,
            policy,
            state: ControllerState::Idle,
            loss: RunningAggregate::mean(),
            scorer: ClassificationScorer::new(task),
            buffered_predictions: Vec::new(),
            buffered_targets: Vec::new(),
            batches: 0,
            samples: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Number of predictions currently held for end-of-epoch scoring.
    pub fn buffered_len(&self) -> usize {
        self.buffered_targets.len()
    }

    /// Resets every per-epoch aggregate and enters `Running(epoch)`.
    pub fn begin_epoch(&mut self, epoch: usize) -> LifecycleResult<()> {
        if let ControllerState::Running { epoch: current } = self.state {
            return Err(LifecycleError::InvalidState(format!(
                "{} epoch {} is still running; cannot begin epoch {}",
                self.phase, current, epoch
            )));
        }
        self.loss.reset();
        self.scorer.reset();
        self.clear_buffer();
        self.batches = 0;
        self.samples = 0;
        self.state = ControllerState::Running { epoch };
        log::debug!("{} epoch {} started", self.phase, epoch);
        Ok(())
    }

    /// Runs the model on one batch and feeds the loss and predictions into
    /// this epoch's aggregates.
    ///
    /// On error nothing is recorded for the batch; the caller decides whether
    /// to skip it or abort.
    pub fn process_batch<M, L>(&mut self, model: &mut M, loss_fn: &L, batch: &Batch) -> LifecycleResult<StepResult>
    where
        M: Model + ?Sized,
        L: Loss + ?Sized,
    {
        let epoch = match self.state {
            ControllerState::Running { epoch } => epoch,
            ControllerState::Idle => {
                return Err(LifecycleError::InvalidState(format!(
                    "process_batch called on idle {} controller",
                    self.phase
                )));
            }
        };

        let logits = model.forward(batch.inputs())?;
        if logits.len() != batch.len() {
            return Err(LifecycleError::ModelOutput { expected: batch.len(), got: logits.len() });
        }
        let loss = loss_fn.loss(&logits, batch.targets())?;
        if !loss.is_finite() {
            return Err(MetricError::NonFinite(loss).into());
        }
        let predictions: Vec<usize> = logits.iter().map(|row| argmax(row)).collect();
        let targets = batch.targets();

        match self.policy {
            ScoringPolicy::Incremental => self.scorer.update(&predictions, targets)?,
            ScoringPolicy::Buffered => {
                self.scorer.validate(&predictions, targets)?;
                self.buffered_predictions.extend_from_slice(&predictions);
                self.buffered_targets.extend_from_slice(targets);
            }
        }
        self.loss.update(loss)?;
        self.batches += 1;
        self.samples += batch.len();

        log::debug!("{} epoch {} batch {} loss {:.6}", self.phase, epoch, self.batches, loss);

        Ok(StepResult { loss, predictions, targets: targets.to_vec() })
    }

    /// Finalizes the epoch, logs `<phase>/loss` and `<phase>/acc` to `sink`
    /// and returns to `Idle`.
    pub fn end_epoch(&mut self, sink: &mut dyn MetricSink) -> LifecycleResult<EpochSummary> {
        let epoch = match self.state {
            ControllerState::Running { epoch } => epoch,
            ControllerState::Idle => {
                return Err(LifecycleError::InvalidState(format!(
                    "end_epoch called on idle {} controller",
                    self.phase
                )));
            }
        };

        if self.policy == ScoringPolicy::Buffered {
            self.scorer.reset();
            let result = self.scorer.update(&self.buffered_predictions, &self.buffered_targets);
            self.clear_buffer();
            result?;
        }

        let summary = EpochSummary {
            phase: self.phase,
            epoch,
            loss: self.loss.compute(),
            accuracy: self.scorer.compute(),
            batches: self.batches,
            samples: self.samples,
        };
        self.state = ControllerState::Idle;

        if summary.batches == 0 {
            log::warn!("{} epoch {} ended without any batches; nothing logged", self.phase, epoch);
        }
        if let Some(loss) = summary.loss {
            sink.log(MetricRecord { key: self.phase.loss_key(), value: loss, epoch, options: LogOptions::epoch() });
        }
        if let Some(acc) = summary.accuracy {
            sink.log(MetricRecord { key: self.phase.acc_key(), value: acc, epoch, options: LogOptions::epoch() });
        }

        Ok(summary)
    }

    fn clear_buffer(&mut self) {
        // drop the allocation too; a buffered epoch can be large
        self.buffered_predictions = Vec::new();
        self.buffered_targets = Vec::new();
    }
}

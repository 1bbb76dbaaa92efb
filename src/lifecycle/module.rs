use serde::{Serialize, Deserialize};

use crate::data::{Batch, StepResult};
use crate::error::LifecycleResult;
use crate::lifecycle::controller::{EpochController, EpochSummary, ScoringPolicy};
use crate::lifecycle::phase::Phase;
use crate::loss::{CrossEntropyLoss, Loss};
use crate::metrics::{BestMetricTracker, LogOptions, MetricRecord, MetricSink, Task};
use crate::model::Model;

/// Settings shared by the three phase controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub task: Task,
    #[serde(default)]
    pub scoring: ScoringPolicy,
}

impl ModuleConfig {
    pub fn multiclass(num_classes: usize) -> Self {
        ModuleConfig { task: Task::Multiclass { num_classes }, scoring: ScoringPolicy::default() }
    }

    pub fn with_scoring(mut self, scoring: ScoringPolicy) -> Self {
        self.scoring = scoring;
        self
    }
}

/// A classifier plus its train/val/test bookkeeping.
///
/// Each phase has an independent `EpochController`. The module additionally
/// tracks the best validation accuracy across the whole run; call
/// `on_train_start` once real training begins so that a sanity-check
/// validation pass run beforehand is forgotten.
pub struct ClassifierModule<M, L = CrossEntropyLoss> {
    model: M,
    loss: L,
    config: ModuleConfig,
    train: EpochController,
    val: EpochController,
    test: EpochController,
    val_acc_best: BestMetricTracker,
}

impl<M: Model> ClassifierModule<M, CrossEntropyLoss> {
    pub fn new(model: M, config: ModuleConfig) -> Self {
        ClassifierModule::with_loss(model, CrossEntropyLoss, config)
    }
}

impl<M: Model, L: Loss> ClassifierModule<M, L> {
    pub fn with_loss(model: M, loss: L, config: ModuleConfig) -> Self {
        if model.num_classes() != config.task.num_classes() {
            log::warn!(
                "model emits {} logits but task expects {} classes",
                model.num_classes(),
                config.task.num_classes()
            );
        }
        ClassifierModule {
            model,
            loss,
            config,
            train: EpochController::new(Phase::Train, config.task, config.scoring),
            val: EpochController::new(Phase::Validation, config.task, config.scoring),
            test: EpochController::new(Phase::Test, config.task, config.scoring),
            val_acc_best: BestMetricTracker::maximize(),
        }
    }

    pub fn config(&self) -> ModuleConfig {
        self.config
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    pub fn controller(&self, phase: Phase) -> &EpochController {
        match phase {
            Phase::Train      => &self.train,
            Phase::Validation => &self.val,
            Phase::Test       => &self.test,
        }
    }

    fn controller_mut(&mut self, phase: Phase) -> &mut EpochController {
        match phase {
            Phase::Train      => &mut self.train,
            Phase::Validation => &mut self.val,
            Phase::Test       => &mut self.test,
        }
    }

    /// Best validation accuracy since the last `on_train_start`.
    pub fn best_val_accuracy(&self) -> Option<f64> {
        self.val_acc_best.compute()
    }

    /// Forgets any best-so-far value recorded by a sanity-check pass.
    pub fn on_train_start(&mut self) {
        self.val_acc_best.reset();
    }

    pub fn begin_epoch(&mut self, phase: Phase, epoch: usize) -> LifecycleResult<()> {
        self.controller_mut(phase).begin_epoch(epoch)
    }

    pub fn process_batch(&mut self, phase: Phase, batch: &Batch) -> LifecycleResult<StepResult> {
        let controller = match phase {
            Phase::Train      => &mut self.train,
            Phase::Validation => &mut self.val,
            Phase::Test       => &mut self.test,
        };
        controller.process_batch(&mut self.model, &self.loss, batch)
    }

    /// Ends the phase's epoch. For the validation phase this also folds the
    /// epoch accuracy into the best-so-far tracker and logs `val/acc_best`
    /// and `hp_metric`.
    pub fn end_epoch(&mut self, phase: Phase, sink: &mut dyn MetricSink) -> LifecycleResult<EpochSummary> {
        let summary = self.controller_mut(phase).end_epoch(sink)?;

        if phase == Phase::Validation {
            if let Some(acc) = summary.accuracy {
                self.val_acc_best.update(acc)?;
                sink.log(MetricRecord {
                    key: "hp_metric".into(),
                    value: acc,
                    epoch: summary.epoch,
                    options: LogOptions::epoch_quiet(),
                });
            }
            if let Some(best) = self.val_acc_best.compute() {
                sink.log(MetricRecord {
                    key: "val/acc_best".into(),
                    value: best,
                    epoch: summary.epoch,
                    options: LogOptions::epoch(),
                });
            }
        }

        Ok(summary)
    }
}

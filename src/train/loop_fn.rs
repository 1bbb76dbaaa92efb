use std::sync::atomic::Ordering;
use std::time::Instant;

use crate::data::{make_batches, Batch, Dataset};
use crate::error::LifecycleResult;
use crate::lifecycle::{ClassifierModule, EpochSummary, Phase};
use crate::loss::Loss;
use crate::metrics::{MemorySink, MetricSink};
use crate::model::Model;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// What a `train_loop` run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    /// One entry per completed training epoch.
    pub history: Vec<EpochStats>,
    /// Summary of the sanity-check validation pass, if one ran.
    pub sanity: Option<EpochSummary>,
    /// Summary of the final test pass, if one ran.
    pub test: Option<EpochSummary>,
    pub best_val_accuracy: Option<f64>,
    /// True when the run ended before `config.epochs` because of the stop
    /// flag or a dropped progress receiver.
    pub stopped_early: bool,
}

/// Runs sanity check → `config.epochs` × (train, validation) → test over
/// `module`, logging every epoch metric to `sink`.
///
/// Batches are taken in dataset order, so identical inputs and a
/// deterministic model produce identical logs.
///
/// # Early termination
/// The loop breaks early if:
/// - the `progress_tx` receiver has been dropped, **or**
/// - `config.stop_flag` is set to `true`.
///
/// The test pass still runs after an early stop.
///
/// A `config.batch_size` of zero fails with `MetricError::EmptyBatch` before
/// anything runs.
pub fn train_loop<M: Model, L: Loss>(
    module: &mut ClassifierModule<M, L>,
    train: &Dataset,
    val: Option<&Dataset>,
    test: Option<&Dataset>,
    config: &TrainConfig,
    sink: &mut dyn MetricSink,
) -> LifecycleResult<FitOutcome> {
    let train_batches = make_batches(&train.inputs, &train.targets, config.batch_size)?;
    let val_batches = match val {
        Some(v) => Some(make_batches(&v.inputs, &v.targets, config.batch_size)?),
        None => None,
    };

    // ── Sanity check ──────────────────────────────────────────────────────
    // Runs a few validation batches before training so wiring errors surface
    // immediately. Its metrics go to a scratch sink, and the best-so-far
    // value it records is wiped by `on_train_start` below.
    let sanity = match &val_batches {
        Some(vb) if config.sanity_batches > 0 => {
            let n = config.sanity_batches.min(vb.len());
            let summary = run_phase(module, Phase::Validation, 0, &vb[..n], &mut MemorySink::new())?;
            log::info!("sanity check passed on {} validation batches", n);
            Some(summary)
        }
        _ => None,
    };

    module.on_train_start();

    let mut history = Vec::with_capacity(config.epochs);
    let mut stopped_early = false;

    for epoch in 1..=config.epochs {
        if stop_requested(config) {
            stopped_early = true;
            break;
        }

        let t_start = Instant::now();

        let train_summary = run_phase(module, Phase::Train, epoch, &train_batches, sink)?;
        let val_summary = match &val_batches {
            Some(vb) => Some(run_phase(module, Phase::Validation, epoch, vb, sink)?),
            None => None,
        };

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            train_loss: train_summary.loss,
            train_accuracy: train_summary.accuracy,
            val_loss: val_summary.as_ref().and_then(|s| s.loss),
            val_accuracy: val_summary.as_ref().and_then(|s| s.accuracy),
            val_accuracy_best: module.best_val_accuracy(),
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };

        log::info!(
            "epoch {}/{}: train loss {} acc {} | val loss {} acc {} (best {})",
            epoch,
            config.epochs,
            fmt_opt(stats.train_loss),
            fmt_opt(stats.train_accuracy),
            fmt_opt(stats.val_loss),
            fmt_opt(stats.val_accuracy),
            fmt_opt(stats.val_accuracy_best),
        );

        history.push(stats.clone());

        if let Some(ref tx) = config.progress_tx {
            // If the receiver has been dropped, stop training.
            if tx.send(stats).is_err() {
                stopped_early = epoch < config.epochs;
                break;
            }
        }
    }

    // ── Test ──────────────────────────────────────────────────────────────
    let test_summary = match test {
        Some(t) if config.run_test => {
            let batches = make_batches(&t.inputs, &t.targets, config.batch_size)?;
            Some(run_phase(module, Phase::Test, history.len(), &batches, sink)?)
        }
        _ => None,
    };

    Ok(FitOutcome {
        history,
        sanity,
        test: test_summary,
        best_val_accuracy: module.best_val_accuracy(),
        stopped_early,
    })
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// One full epoch of a single phase. Training batches go through the
/// model's `fit_batch` before being scored.
fn run_phase<M: Model, L: Loss>(
    module: &mut ClassifierModule<M, L>,
    phase: Phase,
    epoch: usize,
    batches: &[Batch],
    sink: &mut dyn MetricSink,
) -> LifecycleResult<EpochSummary> {
    module.begin_epoch(phase, epoch)?;
    for batch in batches {
        if phase == Phase::Train {
            module.model_mut().fit_batch(batch);
        }
        module.process_batch(phase, batch)?;
    }
    module.end_epoch(phase, sink)
}

fn stop_requested(config: &TrainConfig) -> bool {
    config.stop_flag.as_ref().map(|f| f.load(Ordering::Relaxed)).unwrap_or(false)
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{:.4}", x)).unwrap_or_else(|| "-".into())
}

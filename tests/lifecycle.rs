use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use rand::{rngs::StdRng, SeedableRng};

use ferrite_classify::data::gaussian_blobs;
use ferrite_classify::error::MetricResult;
use ferrite_classify::metrics::MemorySink;
use ferrite_classify::{
    train_loop, Batch, ClassifierModule, Dataset, LifecycleError, MetricError, Model, ModelVariant, ModuleConfig,
    Network, Phase, ScoringPolicy, TrainConfig,
};

/// Returns each input row unchanged as its logits, so a blob sample is
/// classified as the class whose centre it sits on.
struct Echo;

impl Model for Echo {
    fn forward(&mut self, inputs: &[Vec<f64>]) -> MetricResult<Vec<Vec<f64>>> {
        Ok(inputs.to_vec())
    }

    fn num_classes(&self) -> usize {
        3
    }
}

fn blobs() -> Dataset {
    // 12 samples, 4 batches of 3
    gaussian_blobs(4, 3, 3, 0.2, 7)
}

fn fit(scoring: ScoringPolicy) -> (MemorySink, ferrite_classify::FitOutcome) {
    let data = blobs();
    let mut module = ClassifierModule::new(Echo, ModuleConfig::multiclass(3).with_scoring(scoring));
    let mut sink = MemorySink::new();
    let config = TrainConfig::new(2, 3);
    let outcome = train_loop(&mut module, &data, Some(&data), Some(&data), &config, &mut sink).unwrap();
    (sink, outcome)
}

#[test]
fn repeated_runs_log_identical_metrics() {
    let (first, _) = fit(ScoringPolicy::Incremental);
    let (second, _) = fit(ScoringPolicy::Incremental);
    assert!(!first.records.is_empty());
    assert_eq!(first.records, second.records);
}

#[test]
fn scoring_policies_agree() {
    let (incremental, _) = fit(ScoringPolicy::Incremental);
    let (buffered, _) = fit(ScoringPolicy::Buffered);
    for key in ["train/acc", "val/acc", "test/acc", "val/acc_best"] {
        assert_eq!(incremental.values(key), buffered.values(key), "{}", key);
    }
}

#[test]
fn every_epoch_logs_each_phase_once() {
    let (sink, outcome) = fit(ScoringPolicy::Incremental);
    assert_eq!(outcome.history.len(), 2);
    assert!(!outcome.stopped_early);
    // the sanity pass goes to a scratch sink
    assert_eq!(sink.values("val/acc"), vec![1.0, 1.0]);
    assert_eq!(sink.values("train/acc"), vec![1.0, 1.0]);
    assert_eq!(sink.values("val/acc_best"), vec![1.0, 1.0]);
    assert_eq!(sink.values("hp_metric").len(), 2);
    assert_eq!(sink.values("test/acc"), vec![1.0]);
    assert_eq!(sink.values("val/loss").len(), 2);
    assert_eq!(outcome.best_val_accuracy, Some(1.0));
    assert!(outcome.sanity.is_some());
}

#[test]
fn stop_flag_skips_epochs_but_still_tests() {
    let data = blobs();
    let mut module = ClassifierModule::new(Echo, ModuleConfig::multiclass(3));
    let mut sink = MemorySink::new();
    let mut config = TrainConfig::new(5, 4);
    config.stop_flag = Some(Arc::new(AtomicBool::new(true)));

    let outcome = train_loop(&mut module, &data, Some(&data), Some(&data), &config, &mut sink).unwrap();
    assert!(outcome.stopped_early);
    assert!(outcome.history.is_empty());
    assert!(outcome.test.is_some());
    assert!(sink.values("train/acc").is_empty());
}

#[test]
fn dropped_progress_receiver_ends_run() {
    let data = blobs();
    let mut module = ClassifierModule::new(Echo, ModuleConfig::multiclass(3));
    let (tx, rx) = std::sync::mpsc::channel();
    drop(rx);
    let mut config = TrainConfig::new(3, 3);
    config.progress_tx = Some(tx);

    let outcome = train_loop(&mut module, &data, None, None, &config, &mut MemorySink::new()).unwrap();
    assert_eq!(outcome.history.len(), 1);
    assert!(outcome.stopped_early);
    assert_eq!(outcome.best_val_accuracy, None);
}

fn mnist_module() -> ClassifierModule<Network> {
    let variant = ModelVariant::Mnist;
    let network = Network::from_spec(&variant.default_spec(8, 10), &mut StdRng::seed_from_u64(11));
    ClassifierModule::new(network, ModuleConfig::multiclass(10))
}

#[test]
fn narrow_rows_fail_with_input_shape() {
    let mut module = mnist_module();
    module.begin_epoch(Phase::Train, 1).unwrap();
    let batch = Batch::new(vec![vec![0.0; 3]; 2], vec![0, 1]).unwrap();

    let err = module.process_batch(Phase::Train, &batch).unwrap_err();
    assert!(err.is_input_shape());
    assert_eq!(
        err,
        LifecycleError::Metric(MetricError::InputShape { what: "input row", left: 3, right: 784 })
    );

    // the failed batch left nothing behind
    let summary = module.end_epoch(Phase::Train, &mut MemorySink::new()).unwrap();
    assert_eq!(summary.batches, 0);
    assert_eq!(summary.loss, None);
}

#[test]
fn ragged_rows_never_reach_the_network() {
    let err = Batch::new(vec![vec![0.0; 784], vec![0.0; 5]], vec![0, 1]).unwrap_err();
    assert!(matches!(err, MetricError::InputShape { .. }));
}

#[test]
fn well_formed_rows_run_through_a_real_network() {
    let mut module = mnist_module();
    module.begin_epoch(Phase::Validation, 1).unwrap();
    let batch = Batch::new(vec![vec![0.1; 784]; 3], vec![0, 1, 2]).unwrap();
    let step = module.process_batch(Phase::Validation, &batch).unwrap();
    assert_eq!(step.predictions.len(), 3);
    assert!(step.loss.is_finite());
}

#[test]
fn zero_batch_size_is_rejected() {
    let data = blobs();
    let mut module = ClassifierModule::new(Echo, ModuleConfig::multiclass(3));
    let config = TrainConfig::new(1, 0);
    let err = train_loop(&mut module, &data, None, None, &config, &mut MemorySink::new()).unwrap_err();
    assert_eq!(err, LifecycleError::Metric(MetricError::EmptyBatch));
}

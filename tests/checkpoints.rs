use std::collections::BTreeMap;

use rand::{rngs::StdRng, SeedableRng};

use ferrite_classify::checkpoint::Hparams;
use ferrite_classify::{
    load_checkpoint, Checkpoint, CheckpointError, CheckpointStore, LocalStore, MetricError, ModelVariant,
    ModuleConfig, Network,
};

fn checkpoint(variant: ModelVariant) -> Checkpoint {
    let mut rng = StdRng::seed_from_u64(3);
    let network = Network::from_spec(&variant.default_spec(8, 10), &mut rng);
    let hparams = Hparams {
        module: ModuleConfig::multiclass(10).with_scoring(variant.default_scoring_policy()),
        batch_size: 4,
        epochs: 1,
        extra: BTreeMap::new(),
    };
    let mut ckpt = Checkpoint::new(variant, hparams, network);
    ckpt.epochs_trained = 1;
    ckpt.best_val_accuracy = Some(0.25);
    ckpt
}

#[test]
fn saved_checkpoint_lists_and_predicts() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path());
    store.save("mnist-a", &checkpoint(ModelVariant::Mnist)).unwrap();
    store.save("timm-b", &checkpoint(ModelVariant::Timm)).unwrap();

    assert_eq!(store.list().unwrap(), vec!["mnist-a".to_owned(), "timm-b".to_owned()]);

    let mnist = load_checkpoint(&store, "mnist-a").unwrap();
    assert_eq!(mnist.checkpoint.best_val_accuracy, Some(0.25));
    let probs = mnist.predict(&vec![0.5; ModelVariant::Mnist.input_len()]).unwrap();
    assert_eq!(probs.len(), 10);
    assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);

    let timm = load_checkpoint(&store, "timm-b").unwrap();
    assert_eq!(timm.normalize.channels(), 3);
    assert_eq!(timm.network().input_size(), 3 * 32 * 32);
}

#[test]
fn wrong_input_length_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path());
    store.save("m", &checkpoint(ModelVariant::Mnist)).unwrap();
    let model = load_checkpoint(&store, "m").unwrap();
    assert_eq!(
        model.predict(&[0.0; 10]),
        Err(MetricError::InputShape { what: "model input", left: 10, right: 784 })
    );
}

#[test]
fn missing_and_corrupt_checkpoints() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path());
    std::fs::write(dir.path().join("broken.json"), b"{\"format_version\": 1").unwrap();

    assert!(matches!(load_checkpoint(&store, "absent"), Err(CheckpointError::NotFound(_))));
    assert!(matches!(load_checkpoint(&store, "broken"), Err(CheckpointError::Corrupt { .. })));
    assert!(matches!(load_checkpoint(&store, "../etc"), Err(CheckpointError::InvalidId(_))));
}

//! Runs the epoch bookkeeping end to end on a synthetic dataset and writes a
//! checkpoint the dashboard can open.
//!
//! The network is forward-only here (no optimizer is attached), so the run
//! exercises the sanity check, the train/val/test lifecycle, metric logging
//! and checkpointing rather than learning anything.
//!
//! Usage:
//!   cargo run --bin ferrite-classify -- --help

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};

use ferrite_classify::checkpoint::Hparams;
use ferrite_classify::data::gaussian_blobs;
use ferrite_classify::metrics::{JsonlSink, LogSink, Tee};
use ferrite_classify::{
    train_loop, Checkpoint, ClassifierModule, LocalStore, ModelMetadata, ModelVariant, ModuleConfig,
    Network, TrainConfig,
};

const NUM_CLASSES: usize = 10;
const HIDDEN: usize = 32;

/// Runs the epoch bookkeeping on synthetic data and writes a checkpoint.
#[derive(Parser, Debug)]
#[command(name = "ferrite-classify", version, about, long_about = None)]
struct Args {
    /// Model variant: mnist or timm
    #[arg(long, default_value = "mnist")]
    variant: ModelVariant,

    /// Number of training epochs
    #[arg(long, default_value_t = 3)]
    epochs: usize,

    /// Samples per batch
    #[arg(long, default_value_t = 16, value_parser = clap::value_parser!(u64).range(1..))]
    batch_size: u64,

    /// Seed for the synthetic data and the initial weights
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Directory the checkpoint is written to
    #[arg(long, default_value = "checkpoints")]
    out: PathBuf,

    /// Also write every logged metric to this JSON-lines file
    #[arg(long)]
    metrics: Option<PathBuf>,
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let variant = args.variant;
    let data = gaussian_blobs(12, NUM_CLASSES, variant.input_len(), 0.3, args.seed);
    let (train, rest) = data.split(30);
    let (val, test) = rest.split(50);
    log::info!(
        "{} variant: {} train / {} val / {} test samples",
        variant.name(), train.len(), val.len(), test.len()
    );

    let metadata = ModelMetadata {
        description: Some(format!("{} classifier trained on synthetic blobs", variant.name())),
        input_type: Some(variant.input_type()),
        output_labels: Some((0..NUM_CLASSES).map(|i| i.to_string()).collect()),
    };
    let spec = variant.default_spec(HIDDEN, NUM_CLASSES).with_metadata(metadata);
    let network = Network::from_spec(&spec, &mut StdRng::seed_from_u64(args.seed));

    let config = ModuleConfig::multiclass(NUM_CLASSES).with_scoring(variant.default_scoring_policy());
    let mut module = ClassifierModule::new(network, config);

    let batch_size = args.batch_size as usize;
    let train_config = TrainConfig::new(args.epochs, batch_size);
    let outcome = match &args.metrics {
        Some(path) => {
            let jsonl = JsonlSink::new(BufWriter::new(File::create(path)?));
            let mut sink = Tee(LogSink, jsonl);
            let outcome = train_loop(&mut module, &train, Some(&val), Some(&test), &train_config, &mut sink)?;
            log::info!("metrics written to {}", path.display());
            outcome
        }
        None => train_loop(&mut module, &train, Some(&val), Some(&test), &train_config, &mut LogSink)?,
    };

    let mut extra = BTreeMap::new();
    extra.insert("seed".to_owned(), serde_json::json!(args.seed));
    extra.insert("optimizer".to_owned(), serde_json::json!("none"));
    let hparams = Hparams { module: module.config(), batch_size, epochs: args.epochs, extra };

    let mut checkpoint = Checkpoint::new(variant, hparams, module.into_model());
    checkpoint.epochs_trained = outcome.history.len();
    checkpoint.best_val_accuracy = outcome.best_val_accuracy;

    let id = format!("{}-seed{}", variant.name(), args.seed);
    LocalStore::new(&args.out).save(&id, &checkpoint)?;

    if let Some(test) = outcome.test {
        log::info!(
            "test loss {:.4} acc {:.4}",
            test.loss.unwrap_or(f64::NAN),
            test.accuracy.unwrap_or(f64::NAN)
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("run failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_run() {
        let args = Args::try_parse_from(["ferrite-classify"]).unwrap();
        assert_eq!(args.variant, ModelVariant::Mnist);
        assert_eq!(args.epochs, 3);
        assert_eq!(args.batch_size, 16);
        assert_eq!(args.out, PathBuf::from("checkpoints"));
        assert!(args.metrics.is_none());
    }

    #[test]
    fn variant_and_sizes_are_parsed() {
        let args = Args::try_parse_from([
            "ferrite-classify", "--variant", "timm", "--batch-size", "4", "--metrics", "m.jsonl",
        ])
        .unwrap();
        assert_eq!(args.variant, ModelVariant::Timm);
        assert_eq!(args.batch_size, 4);
        assert_eq!(args.metrics, Some(PathBuf::from("m.jsonl")));
    }

    #[test]
    fn zero_batch_size_and_unknown_variant_are_rejected() {
        assert!(Args::try_parse_from(["ferrite-classify", "--batch-size", "0"]).is_err());
        assert!(Args::try_parse_from(["ferrite-classify", "--variant", "resnet"]).is_err());
    }
}

use std::sync::mpsc;
use std::sync::{Arc, atomic::AtomicBool};
use crate::train::epoch_stats::EpochStats;

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epochs`         - number of training epochs
/// - `batch_size`     - samples per batch; the last batch may be smaller
/// - `sanity_batches` - validation batches run once before training starts
///                      to catch wiring errors early; `0` disables the check
/// - `run_test`       - whether the run finishes with a test pass
/// - `progress_tx`    - optional channel sender; one `EpochStats` is sent per
///                      completed epoch.  If the receiver is dropped the run
///                      stops early.
/// - `stop_flag`      - optional atomic flag; when set to `true` from another
///                      thread the run stops after the current epoch.
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub sanity_batches: usize,
    pub run_test: bool,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl TrainConfig {
    /// Creates a `TrainConfig` with a two-batch sanity check, a test pass,
    /// no progress channel and no stop flag.
    pub fn new(epochs: usize, batch_size: usize) -> Self {
        TrainConfig {
            epochs,
            batch_size,
            sanity_batches: 2,
            run_test: true,
            progress_tx: None,
            stop_flag: None,
        }
    }
}

use serde::{Serialize, Deserialize};

/// Per-epoch statistics collected by `train_loop`.
///
/// When a `progress_tx` channel is configured in `TrainConfig`, the loop
/// also sends one `EpochStats` value at the end of every completed epoch
/// (after its validation pass).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    pub train_loss: Option<f64>,
    pub train_accuracy: Option<f64>,
    /// Validation values; `None` when no validation set was provided.
    pub val_loss: Option<f64>,
    pub val_accuracy: Option<f64>,
    /// Best validation accuracy since training started.
    pub val_accuracy_best: Option<f64>,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}

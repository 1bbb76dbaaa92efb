use crate::activation::softmax;
use crate::checkpoint::format::Checkpoint;
use crate::checkpoint::store::CheckpointStore;
use crate::error::{CheckpointResult, MetricError, MetricResult};
use crate::model::Normalize;
use crate::network::Network;

/// An inference-ready classifier restored from a checkpoint, bound to the
/// input normalization of the distribution it was trained on.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub id: String,
    pub checkpoint: Checkpoint,
    pub normalize: Normalize,
}

impl LoadedModel {
    pub fn network(&self) -> &Network {
        &self.checkpoint.network
    }

    /// Normalizes one raw input (pixel values in `[0, 1]`, channel-major),
    /// runs the network and returns class probabilities.
    pub fn predict(&self, raw_input: &[f64]) -> MetricResult<Vec<f64>> {
        let expected = self.network().input_size();
        if raw_input.len() != expected {
            return Err(MetricError::InputShape {
                what: "model input",
                left: raw_input.len(),
                right: expected,
            });
        }
        let x = self.normalize.apply(raw_input)?;
        Ok(softmax(&self.network().forward_one(&x)))
    }

    /// Label for class `i`: the checkpoint's output label if it has one,
    /// otherwise the index.
    pub fn label_for(&self, i: usize) -> String {
        self.network()
            .metadata
            .as_ref()
            .and_then(|m| m.output_labels.as_ref())
            .and_then(|l| l.get(i))
            .cloned()
            .unwrap_or_else(|| i.to_string())
    }
}

/// Fetches checkpoint `id` from `store` and restores it for inference.
///
/// Errors come back as `NotFound` / `InvalidId` from the store, or `Corrupt`
/// when the bytes cannot be decoded into a consistent network.
pub fn load_checkpoint(store: &dyn CheckpointStore, id: &str) -> CheckpointResult<LoadedModel> {
    let bytes = store.fetch(id)?;
    let checkpoint = Checkpoint::from_slice(id, &bytes)?;
    let normalize = checkpoint.variant.normalize();
    log::info!(
        "loaded checkpoint '{}' ({} variant, {} layers) from {}",
        id,
        checkpoint.variant.name(),
        checkpoint.network.layers.len(),
        store.describe()
    );
    Ok(LoadedModel { id: id.to_owned(), checkpoint, normalize })
}

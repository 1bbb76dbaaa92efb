use std::collections::BTreeMap;
use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::error::{CheckpointError, CheckpointResult};
use crate::lifecycle::ModuleConfig;
use crate::model::ModelVariant;
use crate::network::Network;

/// Version written by this crate. Readers accept any version up to it.
pub const FORMAT_VERSION: u32 = 1;

/// Hyperparameters stored next to the weights so a checkpoint can be
/// rebuilt and inspected without the run's original configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hparams {
    pub module: ModuleConfig,
    pub batch_size: usize,
    pub epochs: usize,
    /// Free-form settings owned by whoever trained the weights
    /// (optimizer, learning rate, seed, ...).
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A trained classifier as persisted on disk or in a registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub format_version: u32,
    pub variant: ModelVariant,
    pub hparams: Hparams,
    pub network: Network,
    #[serde(default)]
    pub epochs_trained: usize,
    #[serde(default)]
    pub best_val_accuracy: Option<f64>,
}

impl Checkpoint {
    pub fn new(variant: ModelVariant, hparams: Hparams, network: Network) -> Self {
        Checkpoint {
            format_version: FORMAT_VERSION,
            variant,
            hparams,
            network,
            epochs_trained: 0,
            best_val_accuracy: None,
        }
    }

    pub fn to_json_bytes(&self) -> CheckpointResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Decodes and validates checkpoint bytes. Any failure is reported as
    /// `Corrupt` for the given `id`.
    pub fn from_slice(id: &str, bytes: &[u8]) -> CheckpointResult<Checkpoint> {
        let corrupt = |reason: String| CheckpointError::Corrupt { id: id.to_owned(), reason };

        let ckpt: Checkpoint = serde_json::from_slice(bytes).map_err(|e| corrupt(e.to_string()))?;
        if ckpt.format_version > FORMAT_VERSION {
            return Err(corrupt(format!(
                "format version {} is newer than supported version {}",
                ckpt.format_version, FORMAT_VERSION
            )));
        }
        ckpt.network.validate().map_err(corrupt)?;
        if ckpt.network.input_size() % ckpt.variant.channels() != 0 {
            return Err(corrupt(format!(
                "input size {} does not split into {} channels",
                ckpt.network.input_size(),
                ckpt.variant.channels()
            )));
        }
        Ok(ckpt)
    }

    /// Serializes the checkpoint to a pretty-printed JSON file.
    pub fn save_json(&self, path: &Path) -> CheckpointResult<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn sample() -> Checkpoint {
        let spec = ModelVariant::Mnist.default_spec(4, 10);
        let network = Network::from_spec(&spec, &mut StdRng::seed_from_u64(1));
        let hparams = Hparams {
            module: ModuleConfig::multiclass(10),
            batch_size: 8,
            epochs: 2,
            extra: BTreeMap::new(),
        };
        Checkpoint::new(ModelVariant::Mnist, hparams, network)
    }

    #[test]
    fn garbage_is_corrupt() {
        let err = Checkpoint::from_slice("ckpt", b"not json").unwrap_err();
        assert!(matches!(err, CheckpointError::Corrupt { ref id, .. } if id == "ckpt"));
    }

    #[test]
    fn future_version_is_corrupt() {
        let mut ckpt = sample();
        ckpt.format_version = FORMAT_VERSION + 1;
        let bytes = ckpt.to_json_bytes().unwrap();
        assert!(matches!(Checkpoint::from_slice("x", &bytes), Err(CheckpointError::Corrupt { .. })));
    }

    #[test]
    fn broken_layer_chain_is_corrupt() {
        let mut ckpt = sample();
        ckpt.network.layers[1].weights.rows = 3;
        ckpt.network.layers[1].weights.data.truncate(3);
        let bytes = ckpt.to_json_bytes().unwrap();
        let err = Checkpoint::from_slice("x", &bytes).unwrap_err();
        assert!(err.to_string().contains("layer 1 expects 3 inputs"));
    }

    #[test]
    fn missing_optional_fields_default() {
        let mut value = serde_json::to_value(sample()).unwrap();
        let obj = value.as_object_mut().unwrap();
        obj.remove("epochs_trained");
        obj.remove("best_val_accuracy");
        let back = Checkpoint::from_slice("x", &serde_json::to_vec(&value).unwrap()).unwrap();
        assert_eq!(back.epochs_trained, 0);
        assert_eq!(back.best_val_accuracy, None);
        assert_eq!(back.variant, ModelVariant::Mnist);
    }
}

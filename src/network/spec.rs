use serde::{Serialize, Deserialize};
use crate::activation::activation::ActivationFunction;
use crate::network::metadata::ModelMetadata;

/// Describes one layer in a network specification.
///
/// Fields:
/// - `size`       - number of neurons in this layer
/// - `input_size` - output size of the previous layer, or the raw input
///                  dimension for the first layer
/// - `activation` - activation applied after the linear transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub size: usize,
    pub input_size: usize,
    pub activation: ActivationFunction,
}

/// A serializable architecture description, independent of trained weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name used as the checkpoint file stem.
    pub name: String,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

impl NetworkSpec {
    pub fn with_metadata(mut self, metadata: ModelMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

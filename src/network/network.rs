use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{layers::dense::Layer, math::matrix::Matrix, model::Model};
use crate::error::{MetricError, MetricResult};
use crate::network::metadata::ModelMetadata;
use crate::network::spec::NetworkSpec;

/// Stack of dense layers producing class logits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

impl Network {
    /// Builds a network with freshly initialized weights from a spec.
    pub fn from_spec<R: Rng + ?Sized>(spec: &NetworkSpec, rng: &mut R) -> Network {
        let layers = spec.layers.iter()
            .map(|l| Layer::new(l.size, l.input_size, l.activation.clone(), rng))
            .collect();
        Network { layers, metadata: spec.metadata.clone() }
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map(|l| l.input_size()).unwrap_or(0)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map(|l| l.size).unwrap_or(0)
    }

    /// Checks that every layer is internally consistent and that each
    /// layer's input width equals the previous layer's size.
    pub fn validate(&self) -> Result<(), String> {
        if self.layers.is_empty() {
            return Err("network has no layers".into());
        }
        for (i, layer) in self.layers.iter().enumerate() {
            if !layer.is_consistent() {
                return Err(format!("layer {} has inconsistent weight/bias shapes", i));
            }
            if i > 0 && layer.input_size() != self.layers[i - 1].size {
                return Err(format!(
                    "layer {} expects {} inputs but layer {} has {} neurons",
                    i, layer.input_size(), i - 1, self.layers[i - 1].size
                ));
            }
        }
        Ok(())
    }

    /// Forward pass for a single sample.
    pub fn forward_one(&self, input: &[f64]) -> Vec<f64> {
        let mut rows = self.forward_batch(&[input.to_vec()]);
        rows.pop().unwrap_or_default()
    }

    /// Forward pass for a batch; one row of outputs per input row.
    ///
    /// # Panics
    /// Panics if the rows are ragged or their width is not `input_size()`.
    pub fn forward_batch(&self, inputs: &[Vec<f64>]) -> Vec<Vec<f64>> {
        if inputs.is_empty() {
            return Vec::new();
        }
        let mut current = Matrix::from_data(inputs.to_vec());
        for layer in &self.layers {
            current = layer.feed_from(&current);
        }
        current.into_rows()
    }
}

impl Model for Network {
    fn forward(&mut self, inputs: &[Vec<f64>]) -> MetricResult<Vec<Vec<f64>>> {
        let expected = self.input_size();
        if let Some(row) = inputs.iter().find(|row| row.len() != expected) {
            return Err(MetricError::InputShape { what: "input row", left: row.len(), right: expected });
        }
        Ok(self.forward_batch(inputs))
    }

    fn num_classes(&self) -> usize {
        self.output_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;
    use crate::network::spec::LayerSpec;
    use rand::{rngs::StdRng, SeedableRng};

    fn spec() -> NetworkSpec {
        NetworkSpec {
            name: "tiny".into(),
            layers: vec![
                LayerSpec { size: 4, input_size: 3, activation: ActivationFunction::ReLU },
                LayerSpec { size: 2, input_size: 4, activation: ActivationFunction::Identity },
            ],
            metadata: None,
        }
    }

    #[test]
    fn batch_forward_matches_single_forward() {
        let net = Network::from_spec(&spec(), &mut StdRng::seed_from_u64(3));
        let inputs = vec![vec![0.1, 0.2, 0.3], vec![-1.0, 0.5, 2.0]];
        let batched = net.forward_batch(&inputs);
        assert_eq!(batched.len(), 2);
        assert_eq!(batched[1], net.forward_one(&inputs[1]));
        assert_eq!(net.num_classes(), 2);
    }

    #[test]
    fn validate_detects_broken_chain() {
        let mut net = Network::from_spec(&spec(), &mut StdRng::seed_from_u64(3));
        assert!(net.validate().is_ok());
        net.layers[1] = Layer::new(2, 5, ActivationFunction::Identity, &mut StdRng::seed_from_u64(0));
        assert!(net.validate().unwrap_err().contains("layer 1 expects 5 inputs"));
    }
}

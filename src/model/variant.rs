use serde::{Serialize, Deserialize};

use crate::activation::ActivationFunction;
use crate::lifecycle::ScoringPolicy;
use crate::model::transform::Normalize;
use crate::network::metadata::InputType;
use crate::network::spec::{LayerSpec, NetworkSpec};

/// The two classifier configurations this crate ships.
///
/// They differ only in input geometry, normalization constants and how they
/// score predictions over an epoch; the bookkeeping is otherwise identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelVariant {
    /// 28×28 grayscale digits.
    Mnist,
    /// 32×32 RGB images (CIFAR-style statistics), generic backbone.
    Timm,
}

impl ModelVariant {
    pub fn name(&self) -> &'static str {
        match self {
            ModelVariant::Mnist => "mnist",
            ModelVariant::Timm  => "timm",
        }
    }

    pub fn channels(&self) -> usize {
        match self {
            ModelVariant::Mnist => 1,
            ModelVariant::Timm  => 3,
        }
    }

    /// Side length of the square input image in pixels.
    pub fn image_side(&self) -> u32 {
        match self {
            ModelVariant::Mnist => 28,
            ModelVariant::Timm  => 32,
        }
    }

    /// Flattened input length fed to the network.
    pub fn input_len(&self) -> usize {
        let side = self.image_side() as usize;
        self.channels() * side * side
    }

    pub fn normalize(&self) -> Normalize {
        match self {
            ModelVariant::Mnist => Normalize::new(vec![0.1307], vec![0.3081]),
            ModelVariant::Timm  => Normalize::new(
                vec![0.4915, 0.4823, 0.4468],
                vec![0.2470, 0.2435, 0.2616],
            ),
        }
    }

    /// MNIST buffers its epoch's predictions and scores them once; timm
    /// scores batch by batch.
    pub fn default_scoring_policy(&self) -> ScoringPolicy {
        match self {
            ModelVariant::Mnist => ScoringPolicy::Buffered,
            ModelVariant::Timm  => ScoringPolicy::Incremental,
        }
    }

    pub fn input_type(&self) -> InputType {
        let side = self.image_side();
        match self {
            ModelVariant::Mnist => InputType::ImageGrayscale { width: side, height: side },
            ModelVariant::Timm  => InputType::ImageRgb { width: side, height: side },
        }
    }

    /// A small MLP head over the flattened input: `input → hidden (ReLU) →
    /// num_classes (logits)`.
    pub fn default_spec(&self, hidden: usize, num_classes: usize) -> NetworkSpec {
        NetworkSpec {
            name: self.name().to_owned(),
            layers: vec![
                LayerSpec { size: hidden, input_size: self.input_len(), activation: ActivationFunction::ReLU },
                LayerSpec { size: num_classes, input_size: hidden, activation: ActivationFunction::Identity },
            ],
            metadata: None,
        }
    }
}

impl std::str::FromStr for ModelVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mnist" => Ok(ModelVariant::Mnist),
            "timm"  => Ok(ModelVariant::Timm),
            other   => Err(format!("unknown model variant '{}' (expected 'mnist' or 'timm')", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_constants() {
        assert_eq!(ModelVariant::Mnist.normalize(), Normalize::new(vec![0.1307], vec![0.3081]));
        let timm = ModelVariant::Timm.normalize();
        assert_eq!(timm.mean, vec![0.4915, 0.4823, 0.4468]);
        assert_eq!(timm.std, vec![0.2470, 0.2435, 0.2616]);
    }

    #[test]
    fn geometry() {
        assert_eq!(ModelVariant::Mnist.input_len(), 784);
        assert_eq!(ModelVariant::Timm.input_len(), 3 * 32 * 32);
    }

    #[test]
    fn parses_names() {
        assert_eq!("MNIST".parse::<ModelVariant>(), Ok(ModelVariant::Mnist));
        assert!("resnet".parse::<ModelVariant>().is_err());
    }

    #[test]
    fn default_spec_chains() {
        let spec = ModelVariant::Timm.default_spec(16, 10);
        assert_eq!(spec.layers[0].input_size, 3072);
        assert_eq!(spec.layers[1].input_size, spec.layers[0].size);
        assert_eq!(spec.layers[1].size, 10);
    }
}

use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};

/// Fully connected layer: `a = f(x · W + b)`.
///
/// `weights` has shape `input_size × size`; `biases` has length `size`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub size: usize,
    pub weights: Matrix,
    pub biases: Vec<f64>,
    pub activator: ActivationFunction,
}

impl Layer {
    /// He-initialized weights, zero biases.
    pub fn new<R: Rng + ?Sized>(
        size: usize,
        input_size: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Layer {
        Layer {
            size,
            weights: Matrix::he(input_size, size, rng),
            biases: vec![0.0; size],
            activator: activation,
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    /// Forward pass for a whole batch (`batch.rows` samples).
    pub fn feed_from(&self, batch: &Matrix) -> Matrix {
        let z = (batch * &self.weights).add_row(&self.biases);
        z.map(|x| self.activator.function(x))
    }

    /// True when the stored shapes agree with `size` and `input_size`.
    pub fn is_consistent(&self) -> bool {
        self.weights.cols == self.size
            && self.biases.len() == self.size
            && self.weights.data.len() == self.weights.rows
            && self.weights.data.iter().all(|r| r.len() == self.weights.cols)
    }
}

pub mod activation;

pub use activation::{ActivationFunction, argmax, softmax};

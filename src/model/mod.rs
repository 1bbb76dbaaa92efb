pub mod transform;
pub mod variant;

pub use transform::Normalize;
pub use variant::ModelVariant;

use crate::data::Batch;
use crate::error::MetricResult;

/// A classifier as seen by the epoch lifecycle: rows in, logit rows out.
///
/// Parameter updates are owned by whatever optimizer backs the model.
/// The trainer calls `fit_batch` once per training batch before the batch is
/// scored; the default implementation does nothing, which makes any forward
/// only model usable as-is (evaluation runs, tests, frozen checkpoints).
pub trait Model {
    /// Returns one row of `num_classes()` logits per input row, or an
    /// input-shape error when the rows do not fit the model.
    fn forward(&mut self, inputs: &[Vec<f64>]) -> MetricResult<Vec<Vec<f64>>>;

    fn num_classes(&self) -> usize;

    fn fit_batch(&mut self, _batch: &Batch) {}
}

impl<M: Model + ?Sized> Model for Box<M> {
    fn forward(&mut self, inputs: &[Vec<f64>]) -> MetricResult<Vec<Vec<f64>>> {
        (**self).forward(inputs)
    }

    fn num_classes(&self) -> usize {
        (**self).num_classes()
    }

    fn fit_batch(&mut self, batch: &Batch) {
        (**self).fit_batch(batch)
    }
}

use crate::error::{MetricError, MetricResult};

/// One mini-batch: input rows paired with their true class indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    inputs: Vec<Vec<f64>>,
    targets: Vec<usize>,
}

impl Batch {
    /// Fails with an input-shape error when the label count differs from the
    /// number of input rows, or when the rows are not all the same width.
    pub fn new(inputs: Vec<Vec<f64>>, targets: Vec<usize>) -> MetricResult<Batch> {
        if inputs.len() != targets.len() {
            return Err(MetricError::InputShape {
                what: "targets",
                left: targets.len(),
                right: inputs.len(),
            });
        }
        if let Some(first) = inputs.first() {
            if let Some(row) = inputs.iter().find(|row| row.len() != first.len()) {
                return Err(MetricError::InputShape {
                    what: "input row",
                    left: row.len(),
                    right: first.len(),
                });
            }
        }
        Ok(Batch { inputs, targets })
    }

    pub fn inputs(&self) -> &[Vec<f64>] {
        &self.inputs
    }

    pub fn targets(&self) -> &[usize] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Output of one `process_batch` call.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub loss: f64,
    pub predictions: Vec<usize>,
    pub targets: Vec<usize>,
}

/// Splits a dataset into consecutive batches of at most `batch_size` samples.
/// The last batch may be smaller. Order is preserved. A `batch_size` of zero
/// is rejected with `EmptyBatch`.
pub fn make_batches(
    inputs: &[Vec<f64>],
    targets: &[usize],
    batch_size: usize,
) -> MetricResult<Vec<Batch>> {
    if batch_size == 0 {
        return Err(MetricError::EmptyBatch);
    }
    if inputs.len() != targets.len() {
        return Err(MetricError::InputShape {
            what: "targets",
            left: targets.len(),
            right: inputs.len(),
        });
    }
    inputs
        .chunks(batch_size)
        .zip(targets.chunks(batch_size))
        .map(|(x, y)| Batch::new(x.to_vec(), y.to_vec()))
        .collect()
}

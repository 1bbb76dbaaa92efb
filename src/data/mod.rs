pub mod batch;
pub mod synthetic;

pub use batch::{Batch, StepResult, make_batches};
pub use synthetic::{Dataset, gaussian_blobs};

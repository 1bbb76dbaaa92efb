pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod model;
pub mod data;
pub mod metrics;
pub mod lifecycle;
pub mod train;
pub mod checkpoint;
pub mod error;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::{InputType, ModelMetadata, Network, NetworkSpec};
pub use loss::{CrossEntropyLoss, Loss};
pub use model::{Model, ModelVariant, Normalize};
pub use data::{Batch, Dataset, StepResult};
pub use metrics::{BestMetricTracker, ClassificationScorer, MetricSink, RunningAggregate, Task};
pub use lifecycle::{ClassifierModule, EpochController, EpochSummary, ModuleConfig, Phase, ScoringPolicy};
pub use train::{train_loop, EpochStats, FitOutcome, TrainConfig};
pub use checkpoint::{load_checkpoint, Checkpoint, CheckpointStore, LoadedModel, LocalStore, RegistryStore};
pub use error::{CheckpointError, LifecycleError, MetricError};

pub mod aggregate;
pub mod accuracy;
pub mod best;
pub mod sink;

pub use aggregate::{AggregateKind, RunningAggregate};
pub use accuracy::{ClassificationScorer, Task};
pub use best::{BestMetricTracker, Objective};
pub use sink::{JsonlSink, LogOptions, LogSink, MemorySink, MetricRecord, MetricSink, Tee};

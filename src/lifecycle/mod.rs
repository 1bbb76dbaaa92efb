pub mod controller;
pub mod module;
pub mod phase;

pub use controller::{ControllerState, EpochController, EpochSummary, ScoringPolicy};
pub use module::{ClassifierModule, ModuleConfig};
pub use phase::Phase;

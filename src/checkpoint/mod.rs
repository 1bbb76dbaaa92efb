pub mod format;
pub mod loader;
pub mod registry;
pub mod store;

pub use format::{Checkpoint, Hparams, FORMAT_VERSION};
pub use loader::{load_checkpoint, LoadedModel};
pub use registry::RegistryStore;
pub use store::{CheckpointStore, LocalStore};

use serde::{Serialize, Deserialize};

/// Which pass over the data an epoch belongs to. Each phase owns its own
/// aggregates so metrics of concurrent phases never mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Train,
    Validation,
    Test,
}

impl Phase {
    /// Namespace prefix for logged keys, e.g. `"val"` in `"val/acc"`.
    pub fn prefix(&self) -> &'static str {
        match self {
            Phase::Train      => "train",
            Phase::Validation => "val",
            Phase::Test       => "test",
        }
    }

    pub fn loss_key(&self) -> String {
        format!("{}/loss", self.prefix())
    }

    pub fn acc_key(&self) -> String {
        format!("{}/acc", self.prefix())
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

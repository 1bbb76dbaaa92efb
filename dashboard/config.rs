use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Json, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix of the environment variables that override file settings.
pub const ENV_PREFIX: &str = "FERRITE_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file '{}' does not exist", .0.display())]
    Missing(PathBuf),

    #[error("invalid dashboard configuration: {0}")]
    Figment(#[from] figment::Error),
}

/// Where the dashboard looks for checkpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckpointSource {
    /// A directory of `<id>.json` files; relative paths resolve against the
    /// project root.
    Local { dir: PathBuf },
    /// A remote artifact registry; requires `api_key`.
    Registry { url: String },
}

/// Dashboard settings. Built once in `main` and read-only afterwards.
///
/// Precedence, lowest to highest: built-in defaults, the JSON file given as
/// the first command-line argument, then `FERRITE_*` environment variables.
/// Nested keys use `__`, e.g. `FERRITE_SOURCE__KIND=registry` with
/// `FERRITE_SOURCE__URL=https://...`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub bind: String,
    pub project_root: PathBuf,
    pub source: CheckpointSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            bind: "127.0.0.1:7878".into(),
            project_root: PathBuf::from("."),
            source: CheckpointSource::Local { dir: PathBuf::from("checkpoints") },
            api_key: None,
        }
    }
}

impl DashboardConfig {
    /// The layered sources, lowest precedence first.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(DashboardConfig::default()));
        if let Some(path) = file {
            figment = figment.merge(Json::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Builds the configuration. A file that was asked for but does not
    /// exist is an error rather than silently skipped.
    pub fn load(file: Option<&Path>) -> Result<DashboardConfig, ConfigError> {
        if let Some(path) = file {
            if !path.is_file() {
                return Err(ConfigError::Missing(path.to_owned()));
            }
        }
        Ok(DashboardConfig::figment(file).extract()?)
    }

    /// Local checkpoint directory resolved against the project root, or
    /// `None` for a registry source.
    pub fn checkpoint_dir(&self) -> Option<PathBuf> {
        match &self.source {
            CheckpointSource::Local { dir } if dir.is_absolute() => Some(dir.clone()),
            CheckpointSource::Local { dir } => Some(self.project_root.join(dir)),
            CheckpointSource::Registry { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn load(file: Option<&str>) -> figment::error::Result<DashboardConfig> {
        DashboardConfig::load(file.map(Path::new)).map_err(|e| figment::Error::from(e.to_string()))
    }

    #[test]
    fn defaults_without_file_or_env() {
        Jail::expect_with(|_jail| {
            let config = load(None)?;
            assert_eq!(config, DashboardConfig::default());
            assert_eq!(config.checkpoint_dir(), Some(PathBuf::from("./checkpoints")));
            Ok(())
        });
    }

    #[test]
    fn file_then_env_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "dashboard.json",
                r#"{ "bind": "0.0.0.0:9000", "source": { "kind": "local", "dir": "/srv/ckpt" } }"#,
            )?;
            let config = load(Some("dashboard.json"))?;
            assert_eq!(config.bind, "0.0.0.0:9000");
            assert_eq!(config.checkpoint_dir(), Some(PathBuf::from("/srv/ckpt")));

            jail.set_env("FERRITE_SOURCE__KIND", "registry");
            jail.set_env("FERRITE_SOURCE__URL", "https://registry.example");
            jail.set_env("FERRITE_API_KEY", "secret");
            let config = load(Some("dashboard.json"))?;
            assert_eq!(config.bind, "0.0.0.0:9000");
            assert_eq!(config.source, CheckpointSource::Registry { url: "https://registry.example".into() });
            assert_eq!(config.api_key.as_deref(), Some("secret"));
            assert_eq!(config.checkpoint_dir(), None);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_a_single_nested_key() {
        Jail::expect_with(|jail| {
            jail.set_env("FERRITE_SOURCE__DIR", "runs");
            jail.set_env("FERRITE_PROJECT_ROOT", "/srv/project");
            let config = load(None)?;
            assert_eq!(config.checkpoint_dir(), Some(PathBuf::from("/srv/project/runs")));
            Ok(())
        });
    }

    #[test]
    fn missing_and_invalid_files_are_errors() {
        Jail::expect_with(|jail| {
            assert!(matches!(
                DashboardConfig::load(Some(Path::new("missing.json"))),
                Err(ConfigError::Missing(_))
            ));
            jail.create_file("bad.json", "{ not json")?;
            assert!(matches!(
                DashboardConfig::load(Some(Path::new("bad.json"))),
                Err(ConfigError::Figment(_))
            ));
            Ok(())
        });
    }
}

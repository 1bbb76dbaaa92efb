use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use ferrite_classify::{load_checkpoint, CheckpointError, CheckpointStore, LoadedModel, LocalStore, RegistryStore};

use crate::config::{CheckpointSource, DashboardConfig};

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Who the dashboard is browsing checkpoints as.
#[derive(Debug, Clone, PartialEq)]
pub enum Session {
    /// Reading a local checkpoint directory; no login involved.
    Local { dir: String },
    /// Logged in to the artifact registry as `entity`.
    Registry { entity: String, url: String },
    /// Checkpoints cannot be browsed; every page shows `message`.
    Blocked { message: String, auth: bool },
}

// ---------------------------------------------------------------------------
// Main state struct
// ---------------------------------------------------------------------------

pub struct DashboardState {
    pub config: Arc<DashboardConfig>,
    pub session: Session,
    store: Option<Arc<dyn CheckpointStore>>,
    /// Loaded models keyed by checkpoint id; loading is the slow part.
    cache: HashMap<String, Arc<LoadedModel>>,
}

impl DashboardState {
    /// Opens the configured checkpoint source. Never fails: problems are
    /// recorded as a `Session::Blocked` and shown to the user.
    pub fn connect(config: DashboardConfig) -> DashboardState {
        let (session, store): (Session, Option<Arc<dyn CheckpointStore>>) = match &config.source {
            CheckpointSource::Local { .. } => {
                let dir = config.checkpoint_dir().unwrap_or_default();
                let store: Arc<dyn CheckpointStore> = Arc::new(LocalStore::new(&dir));
                (Session::Local { dir: dir.display().to_string() }, Some(store))
            }
            CheckpointSource::Registry { url } => {
                match RegistryStore::connect(url, config.api_key.as_deref()).and_then(|s| {
                    let entity = s.viewer()?;
                    Ok((s, entity))
                }) {
                    Ok((registry, entity)) => {
                        log::info!("logged in to {} as {}", url, entity);
                        let store: Arc<dyn CheckpointStore> = Arc::new(registry);
                        (Session::Registry { entity, url: url.clone() }, Some(store))
                    }
                    Err(e) => {
                        log::warn!("registry unavailable: {}", e);
                        let auth = matches!(e, CheckpointError::AuthenticationRequired(_));
                        (Session::Blocked { message: e.to_string(), auth }, None)
                    }
                }
            }
        };
        DashboardState::with_store(config, session, store)
    }

    pub fn with_store(
        config: DashboardConfig,
        session: Session,
        store: Option<Arc<dyn CheckpointStore>>,
    ) -> DashboardState {
        DashboardState {
            config: Arc::new(config),
            session,
            store,
            cache: HashMap::new(),
        }
    }

    pub fn store(&self) -> Option<Arc<dyn CheckpointStore>> {
        self.store.clone()
    }
}

/// Shared state type - an `Arc<Mutex<DashboardState>>` passed to every handler.
pub type SharedState = Arc<Mutex<DashboardState>>;

/// Locks the state, recovering from a poisoned mutex: a handler that
/// panicked must not take the whole dashboard down with it.
pub fn lock(state: &SharedState) -> MutexGuard<'_, DashboardState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Returns the cached model for `id`, loading it on first use.
///
/// The lock is released while the checkpoint is fetched so a slow registry
/// download does not stall other requests.
pub fn get_model(state: &SharedState, id: &str) -> Result<Arc<LoadedModel>, CheckpointError> {
    let store = {
        let st = lock(state);
        if let Some(model) = st.cache.get(id) {
            return Ok(model.clone());
        }
        st.store().ok_or_else(|| {
            CheckpointError::AuthenticationRequired("no checkpoint source is available".into())
        })?
    };

    let model = Arc::new(load_checkpoint(&*store, id)?);
    lock(state).cache.insert(id.to_owned(), model.clone());
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn registry_without_key_is_blocked_for_auth() {
        let config = DashboardConfig {
            source: CheckpointSource::Registry { url: "http://127.0.0.1:9".into() },
            api_key: None,
            ..DashboardConfig::default()
        };
        let state = DashboardState::connect(config);
        assert!(matches!(state.session, Session::Blocked { auth: true, .. }));
        assert!(state.store().is_none());
    }

    #[test]
    fn local_source_resolves_directory() {
        let config = DashboardConfig {
            project_root: PathBuf::from("/srv/project"),
            ..DashboardConfig::default()
        };
        let state = DashboardState::connect(config);
        assert_eq!(state.session, Session::Local { dir: "/srv/project/checkpoints".into() });
    }

    #[test]
    fn missing_checkpoint_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig {
            source: CheckpointSource::Local { dir: dir.path().to_owned() },
            ..DashboardConfig::default()
        };
        let shared: SharedState = Arc::new(Mutex::new(DashboardState::connect(config)));
        assert!(matches!(get_model(&shared, "absent"), Err(CheckpointError::NotFound(_))));
        assert!(lock(&shared).cache.is_empty());
    }
}

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use crate::checkpoint::store::{validate_id, CheckpointStore};
use crate::error::{CheckpointError, CheckpointResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct Viewer {
    entity: String,
}

#[derive(Debug, Deserialize)]
struct ArtifactEntry {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ArtifactList {
    artifacts: Vec<ArtifactEntry>,
}

/// Client for a remote artifact registry.
///
/// Endpoints, relative to `base_url`:
/// - `GET /api/viewer`             → `{"entity": "..."}`
/// - `GET /api/artifacts`          → `{"artifacts": [{"id": "..."}, ...]}`
/// - `GET /api/artifacts/{id}`     → raw checkpoint bytes
///
/// Every request carries `Authorization: Bearer <api_key>`. Ids are
/// percent-encoded as a single path segment.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    base_url: Url,
    api_key: String,
    client: Client,
}

impl RegistryStore {
    /// Fails with `AuthenticationRequired` when no (non-blank) API key is
    /// available; no request is made in that case.
    pub fn connect(base_url: &str, api_key: Option<&str>) -> CheckpointResult<RegistryStore> {
        let api_key = match api_key.map(str::trim) {
            Some(k) if !k.is_empty() => k.to_owned(),
            _ => {
                return Err(CheckpointError::AuthenticationRequired(
                    "no API key configured for the artifact registry; set FERRITE_API_KEY \
                     or `api_key` in the dashboard config"
                        .into(),
                ))
            }
        };
        let base_url = Url::parse(base_url)
            .map_err(|e| CheckpointError::Http(format!("invalid registry URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(CheckpointError::Http(format!("registry URL '{}' cannot carry a path", base_url)));
        }
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(RegistryStore { base_url, api_key, client })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// `base_url` with `segments` appended, each one percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> CheckpointResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CheckpointError::Http(format!("registry URL '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get(&self, segments: &[&str], id: Option<&str>) -> CheckpointResult<Response> {
        let url = self.endpoint(segments)?;
        log::debug!("GET {}", url);
        let resp = self.client.get(url).bearer_auth(&self.api_key).send()?;
        check_status(resp.status(), id)?;
        Ok(resp)
    }

    /// Name of the account the API key belongs to.
    pub fn viewer(&self) -> CheckpointResult<String> {
        let viewer: Viewer = self.get(&["api", "viewer"], None)?.json()?;
        Ok(viewer.entity)
    }
}

/// Maps registry HTTP status codes onto checkpoint errors.
fn check_status(status: StatusCode, id: Option<&str>) -> CheckpointResult<()> {
    if status.is_success() {
        return Ok(());
    }
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CheckpointError::AuthenticationRequired(
            format!("registry rejected the API key ({})", status),
        ),
        StatusCode::NOT_FOUND => CheckpointError::NotFound(id.unwrap_or("registry endpoint").to_owned()),
        other => CheckpointError::Http(format!("unexpected status {}", other)),
    })
}

impl CheckpointStore for RegistryStore {
    fn describe(&self) -> String {
        self.base_url().to_owned()
    }

    fn list(&self) -> CheckpointResult<Vec<String>> {
        let listing: ArtifactList = self.get(&["api", "artifacts"], None)?.json()?;
        let mut ids: Vec<String> = listing.artifacts.into_iter().map(|a| a.id).collect();
        ids.sort();
        Ok(ids)
    }

    fn fetch(&self, id: &str) -> CheckpointResult<Vec<u8>> {
        validate_id(id)?;
        let resp = self.get(&["api", "artifacts", id], Some(id))?;
        Ok(resp.bytes()?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn missing_or_blank_key_requires_authentication() {
        for key in [None, Some(""), Some("   ")] {
            let err = RegistryStore::connect("http://127.0.0.1:9", key).unwrap_err();
            assert!(matches!(err, CheckpointError::AuthenticationRequired(_)));
        }
    }

    #[test]
    fn status_mapping() {
        assert!(check_status(StatusCode::OK, None).is_ok());
        assert!(matches!(
            check_status(StatusCode::UNAUTHORIZED, None),
            Err(CheckpointError::AuthenticationRequired(_))
        ));
        assert!(matches!(
            check_status(StatusCode::NOT_FOUND, Some("run-7")),
            Err(CheckpointError::NotFound(ref id)) if id == "run-7"
        ));
        assert!(matches!(check_status(StatusCode::BAD_GATEWAY, None), Err(CheckpointError::Http(_))));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let store = RegistryStore::connect("http://registry.local/", Some("k")).unwrap();
        assert_eq!(store.base_url(), "http://registry.local");
    }

    #[test]
    fn ids_are_encoded_as_one_segment() {
        let store = RegistryStore::connect("http://registry.local/team/", Some("k")).unwrap();
        let url = store.endpoint(&["api", "artifacts", "run#3 final?"]).unwrap();
        assert_eq!(url.as_str(), "http://registry.local/team/api/artifacts/run%233%20final%3F");
    }

    #[test]
    fn malformed_base_url_is_rejected() {
        assert!(matches!(RegistryStore::connect("not a url", Some("k")), Err(CheckpointError::Http(_))));
    }

    /// Serves a tiny registry on an ephemeral port. Only the `good` key is
    /// accepted; the raw request paths are recorded.
    fn serve_registry() -> (String, Arc<Mutex<Vec<String>>>) {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        std::thread::spawn(move || {
            for request in server.incoming_requests() {
                let url = request.url().to_owned();
                log.lock().unwrap().push(url.clone());
                let authorized = request.headers().iter()
                    .any(|h| h.field.equiv("Authorization") && h.value.as_str() == "Bearer good");
                let (status, body) = match (authorized, url.as_str()) {
                    (false, _) => (401, String::new()),
                    (true, "/api/viewer") => (200, r#"{"entity": "vision-team"}"#.to_owned()),
                    (true, "/api/artifacts") => (200, r#"{"artifacts": [{"id": "b"}, {"id": "a"}]}"#.to_owned()),
                    (true, "/api/artifacts/run%233") => (200, "checkpoint-bytes".to_owned()),
                    _ => (404, String::new()),
                };
                let _ = request.respond(tiny_http::Response::from_string(body).with_status_code(status));
            }
        });
        (format!("http://127.0.0.1:{}", port), seen)
    }

    /// Connects without honouring proxy variables from the environment.
    fn direct(base: &str, key: &str) -> RegistryStore {
        let mut store = RegistryStore::connect(base, Some(key)).unwrap();
        store.client = Client::builder().no_proxy().timeout(REQUEST_TIMEOUT).build().unwrap();
        store
    }

    #[test]
    fn talks_to_a_live_registry() {
        let (base, seen) = serve_registry();
        let store = direct(&base, "good");

        assert_eq!(store.viewer().unwrap(), "vision-team");
        assert_eq!(store.list().unwrap(), vec!["a".to_owned(), "b".to_owned()]);
        assert_eq!(store.fetch("run#3").unwrap(), b"checkpoint-bytes".to_vec());
        assert!(matches!(store.fetch("gone"), Err(CheckpointError::NotFound(ref id)) if id == "gone"));
        assert!(seen.lock().unwrap().contains(&"/api/artifacts/run%233".to_owned()));
    }

    #[test]
    fn rejected_key_requires_authentication() {
        let (base, _) = serve_registry();
        let store = direct(&base, "stale");
        assert!(matches!(store.viewer(), Err(CheckpointError::AuthenticationRequired(_))));
        assert!(matches!(store.list(), Err(CheckpointError::AuthenticationRequired(_))));
    }
}

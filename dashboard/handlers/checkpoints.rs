use std::io::Cursor;
use tiny_http::Response;

use ferrite_classify::CheckpointError;

use crate::handlers::sidebar;
use crate::render::{error_card, html_escape, render_page};
use crate::state::{lock, SharedState};
use crate::util::form::url_encode;

// ---------------------------------------------------------------------------
// GET /checkpoints
// ---------------------------------------------------------------------------

pub fn handle_list(state: SharedState) -> Response<Cursor<Vec<u8>>> {
    let (store, session) = {
        let st = lock(&state);
        (st.store(), st.session.clone())
    };

    let listing = match store {
        Some(store) => store.list(),
        None => Err(CheckpointError::AuthenticationRequired("no checkpoint source is available".into())),
    };

    let content = match listing {
        Ok(ids) => build_selection(&ids),
        Err(e) => {
            log::warn!("listing checkpoints failed: {}", e);
            error_card("Could not list checkpoints", &html_escape(&e.to_string()))
        }
    };

    crate::routes::html_response(render_page("Checkpoints", &sidebar(&session), &content))
}

fn build_selection(ids: &[String]) -> String {
    if ids.is_empty() {
        return r#"<div class="card"><h2>Select a checkpoint</h2>
<p class="hint">No checkpoints found. Run <code>cargo run --bin ferrite-classify</code> to create one.</p></div>"#
            .to_owned();
    }
    let options: String = ids.iter()
        .map(|id| format!("<option value=\"{0}\">{0}</option>", html_escape(id)))
        .collect::<Vec<_>>()
        .join("\n");
    let downloads: String = ids.iter()
        .map(|id| format!(
            r#"<li><a href="/checkpoints/{}/download">{}</a></li>"#,
            url_encode(id),
            html_escape(id)
        ))
        .collect();
    format!(
        r#"<div class="card"><h2>Select a checkpoint</h2>
<form method="GET" action="/inspect">
  <select name="id">{options}</select>
  <div class="mt"><button type="submit" class="btn btn-primary">Load</button></div>
</form></div>
<div class="card"><h2>Download</h2><ul>{downloads}</ul></div>"#,
        options = options,
        downloads = downloads,
    )
}

// ---------------------------------------------------------------------------
// GET /checkpoints/{id}/download
// ---------------------------------------------------------------------------

/// Serves the raw checkpoint bytes as a downloadable attachment.
pub fn handle_download(id: &str, state: SharedState) -> Response<Cursor<Vec<u8>>> {
    let store = lock(&state).store();
    let Some(store) = store else {
        return crate::routes::not_found();
    };
    match store.fetch(id) {
        Ok(bytes) => crate::routes::json_download_response(bytes, &format!("{}.json", id)),
        Err(e) => {
            log::warn!("download of '{}' failed: {}", id, e);
            crate::routes::not_found()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_listing_points_at_trainer() {
        assert!(build_selection(&[]).contains("No checkpoints found"));
    }

    #[test]
    fn options_are_escaped() {
        let html = build_selection(&["a<b".to_owned()]);
        assert!(html.contains(r#"<option value="a&lt;b">a&lt;b</option>"#));
        assert!(html.contains("/checkpoints/a%3Cb/download"));
    }
}

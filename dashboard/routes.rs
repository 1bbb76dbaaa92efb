use std::io::Cursor;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::handlers;
use crate::state::{lock, Session, SharedState};
use crate::util::form::{split_url, url_decode};

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn header(field: &str, value: &str) -> Option<Header> {
    Header::from_bytes(field.as_bytes(), value.as_bytes()).ok()
}

fn response(status: u16, headers: Vec<Option<Header>>, body: Vec<u8>) -> Response<Cursor<Vec<u8>>> {
    let len = body.len();
    Response::new(
        StatusCode(status),
        headers.into_iter().flatten().collect(),
        Cursor::new(body),
        Some(len),
        None,
    )
}

pub fn html_response(body: String) -> Response<Cursor<Vec<u8>>> {
    response(200, vec![header("Content-Type", "text/html; charset=utf-8")], body.into_bytes())
}

pub fn redirect(location: &str) -> Response<Cursor<Vec<u8>>> {
    response(303, vec![header("Location", location)], Vec::new())
}

pub fn json_download_response(body: Vec<u8>, filename: &str) -> Response<Cursor<Vec<u8>>> {
    let disposition = format!("attachment; filename=\"{}\"", filename.replace('"', ""));
    response(
        200,
        vec![
            header("Content-Type", "application/json"),
            header("Content-Disposition", &disposition),
        ],
        body,
    )
}

pub fn text_response(status: u16, body: &str) -> Response<Cursor<Vec<u8>>> {
    response(status, vec![header("Content-Type", "text/plain; charset=utf-8")], body.as_bytes().to_vec())
}

pub fn not_found() -> Response<Cursor<Vec<u8>>> {
    text_response(404, "404 Not Found")
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Dispatches one request and responds to it.
///
/// While the session is blocked every page except the health check renders
/// the login/availability error instead of its normal content.
pub fn dispatch(mut request: Request, state: SharedState) {
    let method = request.method().clone();
    let url = request.url().to_owned();
    let (path, query) = split_url(&url);
    log::debug!("{} {}", method, url);

    if method == Method::Get && path == "/healthz" {
        let _ = request.respond(text_response(200, "ok"));
        return;
    }

    let blocked = match &lock(&state).session {
        Session::Blocked { message, auth } => Some((message.clone(), *auth)),
        _ => None,
    };
    if let Some((message, auth)) = blocked {
        let _ = request.respond(html_response(handlers::blocked_page(&message, auth)));
        return;
    }

    // Checkpoint download: dynamic path segment.
    if method == Method::Get && path.starts_with("/checkpoints/") && path.ends_with("/download") {
        let id = path
            .strip_prefix("/checkpoints/")
            .and_then(|s| s.strip_suffix("/download"))
            .map(url_decode)
            .unwrap_or_default();
        let _ = request.respond(handlers::checkpoints::handle_download(&id, state));
        return;
    }

    let response = match (method, path) {
        (Method::Get, "/") => redirect("/checkpoints"),
        (Method::Get, "/checkpoints") => handlers::checkpoints::handle_list(state),
        (Method::Get, "/inspect") => handlers::inspect::handle_get(query, state),
        (Method::Post, "/inspect/infer") => handlers::inspect::handle_infer(&mut request, state),
        _ => not_found(),
    };

    if let Err(e) = request.respond(response) {
        log::debug!("client went away before the response was sent: {}", e);
    }
}

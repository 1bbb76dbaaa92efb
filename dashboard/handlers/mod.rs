pub mod checkpoints;
pub mod inspect;

use crate::render::{error_card, html_escape, render_page};
use crate::state::Session;

/// Sidebar block describing the current session.
pub fn sidebar(session: &Session) -> String {
    match session {
        Session::Local { dir } => format!(
            "<h3>Checkpoints</h3><div>Local directory<br><code>{}</code></div>",
            html_escape(dir)
        ),
        Session::Registry { entity, url } => format!(
            "<h3>Registry</h3><div>Logged in as <strong>{}</strong><br><code>{}</code></div>",
            html_escape(entity),
            html_escape(url)
        ),
        Session::Blocked { .. } => "<h3>Registry</h3><div>Not connected</div>".to_owned(),
    }
}

/// Full page shown for every route while the session is blocked.
pub fn blocked_page(message: &str, auth: bool) -> String {
    let body = if auth {
        format!(
            "You are not logged in to the artifact registry.<br>{}<br><br>\
             Set <code>FERRITE_API_KEY</code> (or <code>api_key</code> in the config file) and restart the dashboard.",
            html_escape(message)
        )
    } else {
        format!("The artifact registry could not be reached.<br>{}", html_escape(message))
    };
    let title = if auth { "Login required" } else { "Registry unavailable" };
    render_page(title, &sidebar(&Session::Blocked { message: message.to_owned(), auth }), &error_card(title, &body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_auth_page_explains_login() {
        let page = blocked_page("no API key configured", true);
        assert!(page.contains("You are not logged in"));
        assert!(page.contains("FERRITE_API_KEY"));
    }

    #[test]
    fn sidebar_escapes_entity() {
        let html = sidebar(&Session::Registry { entity: "<team>".into(), url: "https://r".into() });
        assert!(html.contains("&lt;team&gt;"));
    }
}

/// Central template renderer for the dashboard.
///
/// A single HTML template (`dashboard/assets/dashboard.html`) is embedded at
/// compile time. Pages supply a title, the sidebar session block and the
/// main content; any placeholder left unfilled is blanked so raw
/// `{{TOKEN}}` strings never reach the browser.

const TEMPLATE: &str = include_str!("assets/dashboard.html");

pub fn render_page(title: &str, sidebar: &str, content: &str) -> String {
    let html = TEMPLATE
        .replace("{{TITLE}}", &html_escape(title))
        .replace("{{SIDEBAR}}", sidebar)
        .replace("{{CONTENT}}", content);
    blank_remaining(html)
}

/// Replaces any `{{TOKEN}}` that wasn't already substituted with an empty
/// string.
fn blank_remaining(mut html: String) -> String {
    while let Some(start) = html.find("{{") {
        if let Some(end) = html[start..].find("}}") {
            let abs_end = start + end + 2;
            html.replace_range(start..abs_end, "");
        } else {
            break;
        }
    }
    html
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
     .replace('<', "&lt;")
     .replace('>', "&gt;")
     .replace('"', "&quot;")
}

/// A red error card. `msg` is inserted as-is; escape user text first.
pub fn error_card(title: &str, msg: &str) -> String {
    format!(
        r#"<div class="result-card"><h2>{}</h2><div class="error-box">{}</div></div>"#,
        html_escape(title),
        msg
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_and_blanks_placeholders() {
        let page = render_page("Inspect <x>", "<p>side</p>", "<p>body {{LEFTOVER}}</p>");
        assert!(page.contains("Inspect &lt;x&gt;"));
        assert!(page.contains("<p>side</p>"));
        assert!(page.contains("<p>body </p>"));
        assert!(!page.contains("{{"));
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(html_escape(r#"<a href="x">&</a>"#), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }
}

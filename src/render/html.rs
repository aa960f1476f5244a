//! HTML document assembly

use crate::error::RendrError;
use crate::render::request::escape_json_for_script;
use std::collections::BTreeMap;
use std::error::Error as _;
use std::fmt::Write;

/// Everything that goes into a rendered page
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    pub title: &'a str,
    pub meta_tags: &'a BTreeMap<String, String>,
    pub stylesheet: &'a str,
    pub server_html: &'a str,
    pub script: &'a str,
    pub route_id: &'a str,
}

/// Render the full HTML document for a page
pub fn render_page(page: &Page<'_>) -> String {
    let mut head = String::new();
    let _ = write!(head, "<title>{}</title>", escape_html(page.title));
    for (key, value) in page.meta_tags {
        // Open Graph tags are keyed by `property`, everything else by `name`
        let attr = if key.starts_with("og:") { "property" } else { "name" };
        let _ = write!(
            head,
            "<meta {}=\"{}\" content=\"{}\">",
            attr,
            escape_html(key),
            escape_html(value)
        );
    }
    if !page.stylesheet.is_empty() {
        let _ = write!(head, "<style>{}</style>", escape_closing_tag(page.stylesheet, "style"));
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         {head}\n</head>\n<body>\n\
         <div id=\"root\" data-route-id=\"{route}\">{markup}</div>\n\
         <script>{script}</script>\n</body>\n</html>\n",
        head = head,
        route = escape_html(page.route_id),
        markup = page.server_html,
        script = escape_closing_tag(page.script, "script"),
    )
}

/// Render a developer-facing error page
///
/// Never empty: even an error with no message yields a complete document.
pub fn render_error_page(err: &RendrError, route_id: &str) -> String {
    let mut causes = String::new();
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(causes, "<li>{}</li>", escape_html(&cause.to_string()));
        source = cause.source();
    }
    if !causes.is_empty() {
        causes = format!("<h2>Caused by</h2><ul>{causes}</ul>");
    }

    let hint = err
        .hint()
        .map(|hint| format!("<p class=\"hint\">Hint: {}</p>", escape_html(hint)))
        .unwrap_or_default();

    let label = err.kind().label();
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n\
         <title>{label}</title>\n\
         <style>body{{font-family:monospace;margin:2rem;color:#1f2328}}\
         pre{{background:#fff1f0;border-left:4px solid #cf222e;padding:1rem;white-space:pre-wrap}}\
         .hint{{color:#9a6700}}</style>\n\
         </head>\n<body>\n<h1>{label}</h1>\n<p>Route: <code>{route}</code></p>\n\
         <pre>{message}</pre>\n{causes}{hint}\n</body>\n</html>\n",
        label = label,
        route = escape_html(route_id),
        message = escape_html(&err.to_string()),
        causes = causes,
        hint = hint,
    )
}

/// Script served in place of a client bundle when rendering failed
pub fn render_error_script(err: &RendrError, route_id: &str) -> String {
    let message = format!("rendr: {} in route {}: {}", err.kind().label(), route_id, err);
    let literal = serde_json::Value::String(message).to_string();
    format!("console.error({});\n", escape_json_for_script(&literal))
}

pub(crate) fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Keep inline content from terminating its element early
fn escape_closing_tag(content: &str, tag: &str) -> String {
    let needle = format!("</{tag}");
    let lower = content.to_ascii_lowercase();
    if !lower.contains(&needle) {
        return content.to_string();
    }

    let mut out = String::with_capacity(content.len() + 8);
    let mut rest = 0;
    for (idx, _) in lower.match_indices(&needle) {
        out.push_str(&content[rest..idx]);
        out.push_str("<\\/");
        rest = idx + 2;
    }
    out.push_str(&content[rest..]);
    out
}

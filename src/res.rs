use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::{AppResult, db::User};

#[macro_export]
macro_rules! include_res {
    (bytes, $p:expr) => {
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
    (str, $p:expr) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
}

/// Fills `{name}` placeholders in one pass. Values are inserted verbatim,
/// so anything user-supplied must go through [`escape`] first.
/// Unknown placeholders are left as they are.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };

        let key = &after[..end];
        match vars.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => out.push_str(value),
            None => {
                out.push('{');
                out.push_str(key);
                out.push('}');
            }
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            c => out.push(c),
        }
    }
    out
}

/// Percent-encodes a query string value.
pub fn encode_query(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn is_unsafe_url(url: &str) -> bool {
    let url = url.trim_start().to_ascii_lowercase();
    ["javascript:", "vbscript:", "data:"]
        .iter()
        .any(|scheme| url.starts_with(scheme))
}

/// Renders a bio written in Markdown. Raw HTML is shown as text.
pub fn markdown(text: &str) -> String {
    use pulldown_cmark::{Event, Options, Parser, Tag};

    let parser = Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link { link_type, dest_url, title, id }) if is_unsafe_url(&dest_url) => {
            Event::Start(Tag::Link { link_type, dest_url: "#".into(), title, id })
        }
        Event::Start(Tag::Image { link_type, dest_url, title, id }) if is_unsafe_url(&dest_url) => {
            Event::Start(Tag::Image { link_type, dest_url: "#".into(), title, id })
        }
        _ => event,
    });

    let mut html_output = String::new();
    pulldown_cmark::html::push_html(&mut html_output, parser);
    escape_braces(&html_output)
}

fn escape_braces(html: &str) -> String {
    html.replace('{', "&#123;").replace('}', "&#125;")
}

/// Wraps page content in the site layout.
pub fn page(title: &str, viewer: Option<&User>, content: &str) -> Html<String> {
    let nav = match viewer {
        Some(user) => render(
            include_res!(str, "/pages/nav_user.html"),
            &[("name", &escape(&user.display_name()))],
        ),
        None => include_res!(str, "/pages/nav_guest.html").to_owned(),
    };

    Html(render(
        include_res!(str, "/pages/layout.html"),
        &[("title", &escape(title)), ("nav", &nav), ("content", content)],
    ))
}

pub fn sorry(what: &str) -> AppResult<Response> {
    let content = render(
        include_res!(str, "/pages/sorry.html"),
        &[("what", &escape(what))],
    );
    Ok((StatusCode::NOT_FOUND, page("Not found", None, &content)).into_response())
}

pub fn forbidden(reason: &str) -> Response {
    let content = render(
        include_res!(str, "/pages/forbidden.html"),
        &[("reason", &escape(reason))],
    );
    (StatusCode::FORBIDDEN, page("Forbidden", None, &content)).into_response()
}

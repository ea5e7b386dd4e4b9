//! Directory listing rendering.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters escaped in listing links. `/` is kept so directory labels
/// stay navigable.
const HREF: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Renders a directory listing page.
///
/// `dir_path` is the decoded request path of the directory; `entries` are
/// the link labels in display order, directories already suffixed with `/`.
pub trait ListingRenderer: Send + Sync {
    fn render(&self, dir_path: &str, entries: &[String]) -> Vec<u8>;
}

/// The built-in HTML listing.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlListing;

impl ListingRenderer for HtmlListing {
    fn render(&self, dir_path: &str, entries: &[String]) -> Vec<u8> {
        let title = escape_html(dir_path);

        let mut html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(&format!("<title>Index of {title}</title>\n"));
        html.push_str("</head>\n<body>\n");
        html.push_str(&format!("<h1>Index of {title}</h1>\n<hr>\n<ul>\n"));

        // Absolute links: the request path may lack its trailing slash.
        let base = format!("{}/", dir_path.trim_end_matches('/'));
        if base != "/" {
            let parent = link(&parent_of(&base));
            html.push_str(&format!(
                "<li><a href=\"{}\">../</a></li>\n",
                escape_html(&parent)
            ));
        }

        for label in entries {
            let href = link(&format!("{base}{label}"));
            html.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                escape_html(&href),
                escape_html(label)
            ));
        }

        html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
        html.into_bytes()
    }
}

fn link(path: &str) -> String {
    utf8_percent_encode(path, HREF).to_string()
}

/// Parent of a directory path ending in `/`, itself ending in `/`.
fn parent_of(base: &str) -> String {
    match base.trim_end_matches('/').rsplit_once('/') {
        Some((parent, _)) => format!("{parent}/"),
        None => "/".to_string(),
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

//! Browsable directory listing served on `GET <path>`.
//!
//! Pages are sized by `limit` and continued with `lastFileName`, the name of
//! the last entry of the previous page.

use std::fmt::Write as _;

use filer_meta::{Entry, Filer, FilerConfig};
use filer_proto::filer as proto;
use filer_types::{FullPath, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    /// Kept as text: an unparsable value falls back to the default page size.
    pub limit: Option<String>,
    #[serde(rename = "lastFileName")]
    pub last_file_name: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub name: String,
    pub link: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryListing {
    /// Listed directory; the root is reported as `""`.
    pub path: String,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub entries: Vec<proto::Entry>,
    pub limit: usize,
    pub last_file_name: String,
    pub should_display_load_more: bool,
}

/// Breadcrumb trail for a listing path: `/a/b` gives `/`, `a/`, `b/`
/// linking to `/`, `/a`, `/a/b`.
pub fn breadcrumbs(path: &str) -> Vec<Breadcrumb> {
    let mut crumbs = vec![Breadcrumb {
        name: "/".into(),
        link: "/".into(),
    }];
    let mut link = String::new();
    for part in path.split('/').filter(|p| !p.is_empty()) {
        link.push('/');
        link.push_str(part);
        crumbs.push(Breadcrumb {
            name: format!("{part}/"),
            link: link.clone(),
        });
    }
    crumbs
}

/// Build one page of the listing of `raw_path` (already percent-decoded).
pub async fn list_directory(
    filer: &dyn Filer,
    config: &FilerConfig,
    raw_path: &str,
    query: &ListingQuery,
) -> Result<DirectoryListing> {
    let trimmed = if raw_path.len() > 1 {
        raw_path.trim_end_matches('/')
    } else {
        raw_path
    };
    let dir = FullPath::new(if trimmed.is_empty() { "/" } else { trimmed })?;

    let limit = query
        .limit
        .as_deref()
        .and_then(|l| l.trim().parse::<usize>().ok())
        .filter(|l| *l > 0)
        .unwrap_or(config.dir_listing_limit as usize);
    let mut last_file_name = query.last_file_name.clone().unwrap_or_default();

    let entries = filer
        .list_directory_entries(&dir, &last_file_name, false, limit)
        .await?;
    let should_display_load_more = entries.len() == limit;
    if let Some(last) = entries.last() {
        last_file_name = last.name().to_string();
    }
    let path = if dir.is_root() {
        String::new()
    } else {
        dir.as_str().to_string()
    };
    tracing::debug!(
        %dir,
        last_file_name = %last_file_name,
        limit,
        count = entries.len(),
        "list directory"
    );

    Ok(DirectoryListing {
        breadcrumbs: breadcrumbs(&path),
        path,
        entries: entries.iter().map(Entry::to_proto).collect(),
        limit,
        last_file_name,
        should_display_load_more,
    })
}

/// Render a listing as a minimal HTML page.
pub fn render_html(listing: &DirectoryListing) -> String {
    let mut html = String::new();
    let title = if listing.path.is_empty() { "/" } else { &listing.path };
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html><head><title>{}</title></head><body>\n<h1>",
        escape_html(title)
    );
    for crumb in &listing.breadcrumbs {
        let _ = write!(
            html,
            "<a href=\"{}\">{}</a>",
            escape_html(&encode_path(&crumb.link)),
            escape_html(&crumb.name)
        );
    }
    html.push_str("</h1>\n<table>\n<tr><th>Name</th><th>Size</th><th>Modified</th></tr>\n");
    for entry in &listing.entries {
        let link = format!("{}/{}", listing.path, entry.name);
        let attributes = entry.attributes.clone().unwrap_or_default();
        let (name, size) = if entry.is_directory {
            (format!("{}/", entry.name), String::from("-"))
        } else {
            (entry.name.clone(), attributes.file_size.to_string())
        };
        let modified = filer_types::UtcTime::from_unix_secs(attributes.mtime);
        let _ = writeln!(
            html,
            "<tr><td><a href=\"{}\">{}</a></td><td>{}</td><td>{}</td></tr>",
            escape_html(&encode_path(&link)),
            escape_html(&name),
            size,
            modified
        );
    }
    html.push_str("</table>\n");
    if listing.should_display_load_more {
        let _ = writeln!(
            html,
            "<a href=\"{}?limit={}&amp;lastFileName={}\">Load more</a>",
            escape_html(&encode_path(if listing.path.is_empty() { "/" } else { &listing.path })),
            listing.limit,
            escape_html(&encode_component(&listing.last_file_name))
        );
    }
    html.push_str("</body></html>\n");
    html
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
            c => out.push(c),
        }
    }
    out
}

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

/// Percent-encode one query or path component.
fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if is_unreserved(b) {
            out.push(b as char);
        } else {
            let _ = write!(out, "%{b:02X}");
        }
    }
    out
}

/// Percent-encode a path, keeping the separators.
fn encode_path(path: &str) -> String {
    path.split('/').map(encode_component).collect::<Vec<_>>().join("/")
}

/// Decode `%XX` escapes in a request path. Malformed escapes are kept
/// verbatim; invalid UTF-8 is replaced.
pub fn decode_path(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .filter(|h| h.bytes().all(|b| b.is_ascii_hexdigit()));
            if let Some(v) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(v);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

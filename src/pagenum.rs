//! Page numbering for a CEUR-WS volume index
//!
//! Walks the `<li>` entries of `index.html` that carry a `CEURPAGES`
//! placeholder, counts the pages of each linked paper PDF, and writes the
//! running page range (e.g. `1–12`) into the placeholder.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use kuchikiki::traits::*;
use kuchikiki::{ElementData, NodeDataRef, NodeRef};
use log::{debug, info, warn};
use crate::error::{Error, Result};
use crate::pdf::count_pages;

/// Name of the volume index inside the volume directory
pub const INDEX_FILE: &str = "index.html";

/// Suffix appended to the index path for the untouched copy
pub const BACKUP_SUFFIX: &str = ".bak";

/// Class marking the page-range placeholder of a paper entry
pub const PAGES_CLASS: &str = "CEURPAGES";

/// An inclusive page range, displayed with an en dash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub first: usize,
    pub last: usize,
}

impl PageRange {
    /// Range of `page_count` pages starting at `first`
    pub fn starting_at(first: usize, page_count: usize) -> Self {
        Self {
            first,
            last: first + page_count - 1,
        }
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\u{2013}{}", self.first, self.last)
    }
}

/// A paper entry that received a page range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedPaper {
    /// Link target of the entry, as written in the index
    pub href: String,
    pub range: PageRange,
}

/// Path of the backup copy for an index file
pub fn backup_path(index: &Path) -> PathBuf {
    let mut name = index.as_os_str().to_owned();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

fn has_class(element: &ElementData, class: &str) -> bool {
    element.attributes.borrow().get("class") == Some(class)
}

fn child_elements(node: &NodeRef) -> impl Iterator<Item = NodeDataRef<ElementData>> {
    node.children().elements()
}

/// Number the paper entries of a parsed index document in place
///
/// `page_count` maps a link target to the page count of the paper it names.
/// Entries without a linked paper keep their placeholder and do not advance
/// the page counter.
pub fn number_entries<F>(document: &NodeRef, mut page_count: F) -> Result<Vec<NumberedPaper>>
where
    F: FnMut(&str) -> Result<usize>,
{
    let entries: Vec<NodeDataRef<ElementData>> = document
        .select("li")
        .map_err(|_| Error::Html("invalid selector: li".to_string()))?
        .filter(|li| {
            child_elements(li.as_node())
                .any(|child| &*child.name.local == "span" && has_class(&child, PAGES_CLASS))
        })
        .collect();

    let mut numbered = Vec::new();
    let mut current_page = 1;

    for entry in entries {
        let href = child_elements(entry.as_node()).find_map(|child| {
            if &*child.name.local != "a" {
                return None;
            }
            let attributes = child.attributes.borrow();
            attributes.get("href").map(str::to_string)
        });
        let Some(href) = href else {
            debug!("Skipping entry without a link");
            continue;
        };

        let Some(placeholder) = child_elements(entry.as_node()).find(|child| has_class(child, PAGES_CLASS)) else {
            debug!("Skipping {}: no {} placeholder", href, PAGES_CLASS);
            continue;
        };

        let count = page_count(&href)?;
        let range = PageRange::starting_at(current_page, count);
        set_leading_text(placeholder.as_node(), &range.to_string());
        info!("{}: pages {}", href, range);

        current_page += count;
        numbered.push(NumberedPaper { href, range });
    }

    Ok(numbered)
}

/// Charset named by a `<meta charset>` or `content="...; charset=..."` near the top
fn declared_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = bytes[..bytes.len().min(1024)].to_ascii_lowercase();
    let start = head.windows(8).position(|w| w == b"charset=")? + 8;
    let rest = &head[start..];
    let rest = rest
        .strip_prefix(b"\"")
        .or_else(|| rest.strip_prefix(b"'"))
        .unwrap_or(rest);
    let end = rest
        .iter()
        .position(|&b| matches!(b, b'"' | b'\'' | b';' | b'>' | b'/') || b.is_ascii_whitespace())
        .unwrap_or(rest.len());
    Encoding::for_label(&rest[..end])
}

/// Decode index bytes: UTF-8 when valid, else the declared charset, else windows-1252
fn decode_index(bytes: &[u8]) -> (String, &'static Encoding) {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return (text.to_string(), UTF_8);
    }
    let encoding = declared_charset(bytes).unwrap_or(WINDOWS_1252);
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        warn!("index.html is not valid {}; undecodable bytes replaced", used.name());
    }
    (text.into_owned(), used)
}

/// Point `<meta>` charset declarations at UTF-8, the encoding the index is written in
fn declare_utf8(document: &NodeRef) -> Result<()> {
    let metas = document
        .select("meta")
        .map_err(|_| Error::Html("invalid selector: meta".to_string()))?;
    for meta in metas {
        let mut attributes = meta.attributes.borrow_mut();
        if attributes.contains("charset") {
            attributes.insert("charset", "utf-8".to_string());
        }
        let content_type = attributes
            .get("http-equiv")
            .is_some_and(|v| v.eq_ignore_ascii_case("content-type"));
        if content_type {
            attributes.insert("content", "text/html; charset=utf-8".to_string());
        }
    }
    Ok(())
}

/// Replace the text before the first child element, keeping child elements
fn set_leading_text(node: &NodeRef, text: &str) {
    let leading: Vec<NodeRef> = node
        .children()
        .take_while(|child| child.as_text().is_some())
        .collect();
    for child in leading {
        child.detach();
    }
    node.prepend(NodeRef::new_text(text));
}

/// Add page ranges to `<dir>/index.html`, keeping the original as `index.html.bak`
///
/// Paper links are resolved relative to `dir`. Any unreadable index or paper
/// aborts the run; the backup is written before anything is changed.
pub fn add_page_numbers(dir: &Path) -> Result<Vec<NumberedPaper>> {
    let index = dir.join(INDEX_FILE);
    if !index.exists() {
        return Err(Error::FileNotFound(index));
    }

    let backup = backup_path(&index);
    fs::copy(&index, &backup)?;
    info!("Saved original index to {}", backup.display());

    let (html, encoding) = decode_index(&fs::read(&index)?);
    let document = kuchikiki::parse_html().one(html);
    if encoding != UTF_8 {
        info!("Converting {} from {} to UTF-8", index.display(), encoding.name());
        declare_utf8(&document)?;
    }

    let numbered = number_entries(&document, |href| count_pages(&dir.join(href)))?;

    let mut output = Vec::new();
    document.serialize(&mut output)?;
    fs::write(&index, output)?;

    Ok(numbered)
}

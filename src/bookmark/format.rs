//! Bookmark text rendering.
//!
//! Line grammar shared with [`super::parse`]:
//!
//! ```text
//! top   := INDEX "." TITLE "(第" PAGE "页)"
//! child := INDENT INDEX ("." INDEX)+ " " TITLE "(第" PAGE "页)"
//! ```
//!
//! `INDENT` is four spaces per dot in the index and `PAGE` is 1-based.
//! The preview variant uses `.` after every index and wraps the lines in a
//! title header and a page-count footer.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

use crate::nav::FlatEntry;

/// Pages ahead of the first content page: cover and table of contents.
pub const FRONT_MATTER_PAGES: u32 = 2;

const INDENT: &str = "    ";

/// Title to 0-based page index, as measured in a rendered PDF
pub type PageMap = BTreeMap<String, u32>;

/// A bookmark with its page resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookmarkEntry {
    pub title: String,
    /// 0-based
    pub page_index: u32,
    pub display_index: String,
}

impl BookmarkEntry {
    /// 1-based page number shown to readers
    pub fn page_number(&self) -> u32 {
        self.page_index + 1
    }

    pub fn depth(&self) -> usize {
        self.display_index.matches('.').count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkStyle {
    /// Bare entry lines, the input of the outline injector
    Outline,
    /// Entry lines under a title header, followed by the page count
    Preview { total_pages: u32 },
}

/// 1-based page for an entry: the mapped page if the title is known,
/// otherwise its position after the front matter.
///
/// A mapped index with no following page number falls back to the estimate.
pub fn resolve_page(entry: &FlatEntry, page_map: Option<&PageMap>) -> u32 {
    let estimate = FRONT_MATTER_PAGES.saturating_add(entry.sequential_index);
    match page_map.and_then(|m| m.get(&entry.title)) {
        Some(&index) => index.checked_add(1).unwrap_or_else(|| {
            warn!(title = %entry.title, index, "page index out of range, using estimate");
            estimate
        }),
        None => estimate,
    }
}

pub fn bookmark_entries(flat: &[FlatEntry], page_map: Option<&PageMap>) -> Vec<BookmarkEntry> {
    flat.iter()
        .map(|entry| BookmarkEntry {
            title: entry.title.clone(),
            page_index: resolve_page(entry, page_map).saturating_sub(1),
            display_index: entry.display_index.clone(),
        })
        .collect()
}

pub fn render_line(entry: &BookmarkEntry, style: BookmarkStyle) -> String {
    let depth = entry.depth();
    let separator = match style {
        BookmarkStyle::Outline if depth > 0 => " ",
        _ => ".",
    };
    format!(
        "{}{}{}{}(第{}页)",
        INDENT.repeat(depth),
        entry.display_index,
        separator,
        entry.title,
        entry.page_number()
    )
}

pub fn render_bookmarks(
    flat: &[FlatEntry],
    doc_title: &str,
    page_map: Option<&PageMap>,
    style: BookmarkStyle,
) -> String {
    let lines: Vec<String> = bookmark_entries(flat, page_map)
        .iter()
        .map(|entry| render_line(entry, style))
        .collect();

    match style {
        BookmarkStyle::Outline => lines.join("\n"),
        BookmarkStyle::Preview { total_pages } => format!(
            "{}目录：\n\n{}\n\n总页数：{}",
            doc_title,
            lines.join("\n"),
            total_pages
        ),
    }
}

/// Write bookmark text, creating the destination directory if needed
pub fn write_bookmarks_file<P: AsRef<Path>>(path: P, text: &str) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, text)
        .with_context(|| format!("Failed to write bookmarks: {}", path.display()))?;

    Ok(())
}

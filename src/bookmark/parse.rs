use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;

use super::BookmarkEntry;

/// Accepts both the generated form (`1.Title(第3页)`, `    1.1 Title(第4页)`)
/// and the older spaced form (`1. Title (第3页)`). Subsection lines must be
/// indented so a chapter title starting with digits is not taken for an index.
const LINE_PATTERN: &str = r"^(?:(?P<top>\d+)\.\s*|[ \t]+(?P<child>\d+(?:\.\d+)+)(?:\.\s*|\s+))(?P<title>.+?)\s*\(第(?P<page>\d+)页\)\s*$";

const HEADER_PATTERN: &str = r"^(?P<title>.+?)目录：\s*$";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkFile {
    /// Present when the text carries a preview header
    pub doc_title: Option<String>,
    pub entries: Vec<BookmarkEntry>,
}

/// Parse bookmark text. Lines that are not entries are ignored.
pub fn parse_bookmarks(text: &str) -> Result<BookmarkFile> {
    let line_re = Regex::new(LINE_PATTERN)?;
    let header_re = Regex::new(HEADER_PATTERN)?;

    let mut file = BookmarkFile::default();

    for line in text.lines() {
        if let Some(caps) = line_re.captures(line) {
            let Some(index) = caps.name("top").or_else(|| caps.name("child")) else {
                continue;
            };
            // Pages are 1-based in the text; page 0 cannot be placed
            let Some(page_index) = caps["page"]
                .parse::<u32>()
                .ok()
                .and_then(|p| p.checked_sub(1))
            else {
                continue;
            };

            file.entries.push(BookmarkEntry {
                title: caps["title"].trim().to_string(),
                page_index,
                display_index: index.as_str().to_string(),
            });
        } else if file.doc_title.is_none() && file.entries.is_empty() {
            if let Some(caps) = header_re.captures(line) {
                file.doc_title = Some(caps["title"].trim().to_string());
            }
        }
    }

    Ok(file)
}

pub fn read_bookmarks<P: AsRef<Path>>(path: P) -> Result<BookmarkFile> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read bookmark file: {}", path.display()))?;
    parse_bookmarks(&text)
}

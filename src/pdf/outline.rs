use anyhow::{Context, Result};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, StringFormat};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

use crate::bookmark::BookmarkFile;

pub const COVER_TITLE: &str = "封面";
pub const CONTENTS_TITLE: &str = "目录";

/// One entry of a flat outline: a title pointing at a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineItem {
    pub title: String,
    /// 0-based
    pub page_index: u32,
}

impl OutlineItem {
    pub fn new(title: impl Into<String>, page_index: u32) -> Self {
        OutlineItem {
            title: title.into(),
            page_index,
        }
    }
}

/// Cover and contents entries followed by the file's bookmarks, in order
pub fn outline_items(file: &BookmarkFile) -> Vec<OutlineItem> {
    let mut items = vec![
        OutlineItem::new(COVER_TITLE, 0),
        OutlineItem::new(CONTENTS_TITLE, 1),
    ];
    items.extend(
        file.entries
            .iter()
            .map(|e| OutlineItem::new(e.title.clone(), e.page_index)),
    );
    items
}

/// Replace the document outline with a single-level list of `items`.
///
/// Items pointing past the last page are skipped. Returns the number of
/// entries written.
pub fn write_flat_outline(doc: &mut Document, items: &[OutlineItem]) -> Result<usize> {
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();

    let mut placed = Vec::new();
    for item in items {
        match pages.get(item.page_index as usize) {
            Some(&page_id) => {
                debug!(title = %item.title, page = item.page_index + 1, "bookmark placed");
                placed.push((doc.new_object_id(), item, page_id));
            }
            None => warn!(
                title = %item.title,
                page = item.page_index + 1,
                page_count = pages.len(),
                "page out of range, bookmark skipped"
            ),
        }
    }

    if placed.is_empty() {
        return Ok(0);
    }

    let outlines_id = doc.new_object_id();

    for (i, (id, item, page_id)) in placed.iter().enumerate() {
        let mut node = dictionary! {
            "Title" => encode_pdf_text(&item.title),
            "Parent" => outlines_id,
            "Dest" => vec![(*page_id).into(), "Fit".into()],
        };
        if i > 0 {
            node.set("Prev", placed[i - 1].0);
        }
        if let Some(next) = placed.get(i + 1) {
            node.set("Next", next.0);
        }
        doc.objects.insert(*id, Object::Dictionary(node));
    }

    doc.objects.insert(
        outlines_id,
        Object::Dictionary(dictionary! {
            "Type" => "Outlines",
            "First" => placed[0].0,
            "Last" => placed[placed.len() - 1].0,
            "Count" => placed.len() as i64,
        }),
    );

    let root_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .context("PDF has no document catalog")?;
    let catalog = doc
        .get_dictionary_mut(root_id)
        .context("Failed to get document catalog")?;
    catalog.set("Outlines", outlines_id);
    catalog.set("PageMode", "UseOutlines");
    catalog.set(
        "ViewerPreferences",
        dictionary! {
            "FitWindow" => true,
            "DisplayDocTitle" => true,
        },
    );

    Ok(placed.len())
}

/// PDF text string: literal for ASCII, UTF-16BE with BOM otherwise
pub fn encode_pdf_text(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let u16_chars: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        String::from_utf16_lossy(&u16_chars)
    } else {
        // PDFDocEncoding, approximated as Latin-1
        bytes.iter().map(|&b| b as char).collect()
    }
}

/// An existing outline entry.
#[derive(Debug, Clone, Serialize)]
pub struct OutlineEntry {
    pub title: String,
    /// 1-based
    pub page: Option<u32>,
    pub level: u32,
    pub children: Vec<OutlineEntry>,
}

pub fn extract_outline<P: AsRef<Path>>(path: P) -> Result<Vec<OutlineEntry>> {
    let path = path.as_ref();
    let doc =
        Document::load(path).with_context(|| format!("Failed to open PDF: {}", path.display()))?;

    extract_outline_from_doc(&doc)
}

pub fn extract_outline_from_doc(doc: &Document) -> Result<Vec<OutlineEntry>> {
    let catalog = doc
        .catalog()
        .with_context(|| "Failed to get document catalog")?;

    let outlines = match catalog.get(b"Outlines") {
        Ok(Object::Reference(r)) => match doc.get_dictionary(*r) {
            Ok(d) => d,
            Err(_) => return Ok(Vec::new()),
        },
        _ => return Ok(Vec::new()),
    };

    let first_ref = match outlines.get(b"First") {
        Ok(Object::Reference(r)) => *r,
        _ => return Ok(Vec::new()),
    };

    let page_numbers: Vec<(ObjectId, u32)> = doc
        .get_pages()
        .into_iter()
        .map(|(num, id)| (id, num))
        .collect();
    let mut seen = HashSet::new();

    Ok(read_siblings(doc, first_ref, &page_numbers, 0, &mut seen))
}

fn read_siblings(
    doc: &Document,
    first_id: ObjectId,
    page_numbers: &[(ObjectId, u32)],
    level: u32,
    seen: &mut HashSet<ObjectId>,
) -> Vec<OutlineEntry> {
    let mut entries = Vec::new();
    let mut current_id = Some(first_id);

    while let Some(id) = current_id {
        // Malformed outlines can loop through Next/First
        if !seen.insert(id) {
            break;
        }
        let Ok(dict) = doc.get_dictionary(id) else {
            break;
        };

        let title = match dict.get(b"Title") {
            Ok(Object::String(bytes, _)) => decode_pdf_string(bytes),
            _ => "Untitled".to_string(),
        };

        let children = match dict.get(b"First") {
            Ok(Object::Reference(child)) => {
                read_siblings(doc, *child, page_numbers, level + 1, seen)
            }
            _ => Vec::new(),
        };

        entries.push(OutlineEntry {
            title,
            page: destination_page(doc, dict, page_numbers),
            level,
            children,
        });

        current_id = match dict.get(b"Next") {
            Ok(Object::Reference(r)) => Some(*r),
            _ => None,
        };
    }

    entries
}

/// Page of an explicit `/Dest` or `/A << /S /GoTo /D ... >>` destination
fn destination_page(
    doc: &Document,
    dict: &Dictionary,
    page_numbers: &[(ObjectId, u32)],
) -> Option<u32> {
    let dest = match dict.get(b"Dest") {
        Ok(dest) => dest,
        Err(_) => {
            let action = match dict.get(b"A").ok()? {
                Object::Reference(r) => doc.get_dictionary(*r).ok()?,
                Object::Dictionary(d) => d,
                _ => return None,
            };
            match action.get(b"S") {
                Ok(Object::Name(kind)) if kind == b"GoTo" => action.get(b"D").ok()?,
                _ => return None,
            }
        }
    };

    let arr = match dest {
        Object::Array(arr) => arr,
        Object::Reference(r) => match doc.get_object(*r).ok()? {
            Object::Array(arr) => arr,
            _ => return None,
        },
        _ => return None,
    };

    match arr.first() {
        Some(Object::Reference(page_ref)) => page_numbers
            .iter()
            .find(|(id, _)| id == page_ref)
            .map(|(_, num)| *num),
        _ => None,
    }
}

/// Depth-first listing of an outline tree
pub fn flatten_outline(entries: &[OutlineEntry]) -> Vec<&OutlineEntry> {
    let mut result = Vec::new();
    for entry in entries {
        result.push(entry);
        result.extend(flatten_outline(&entry.children));
    }
    result
}

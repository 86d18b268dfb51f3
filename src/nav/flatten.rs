use serde::Serialize;

use super::NavigationNode;

/// One line of the linearized table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatEntry {
    pub href: String,
    pub title: String,
    /// 1 for chapters, 2 for their subsections
    pub level: u32,
    /// 1-based position in the flat list
    pub sequential_index: u32,
    /// Dotted number shown to readers, e.g. "2" or "2.3"
    pub display_index: String,
    pub has_children: bool,
}

impl FlatEntry {
    pub fn is_top_level(&self) -> bool {
        !self.display_index.contains('.')
    }
}

/// Linearize the tree in pre-order, two levels deep.
///
/// Chapters are numbered by their ordinal among chapters, subsections by
/// `"<chapter>.<ordinal>"`. Anything below a subsection is not emitted.
pub fn flatten(tree: &[NavigationNode]) -> Vec<FlatEntry> {
    let mut flat = Vec::new();

    for (chapter_idx, chapter) in tree.iter().enumerate() {
        let display_index = (chapter_idx + 1).to_string();

        flat.push(FlatEntry {
            href: chapter.href.clone(),
            title: chapter.title.clone(),
            level: 1,
            sequential_index: flat.len() as u32 + 1,
            display_index: display_index.clone(),
            has_children: chapter.is_folder(),
        });

        for (child_idx, child) in chapter.children.iter().enumerate() {
            flat.push(FlatEntry {
                href: child.href.clone(),
                title: child.title.clone(),
                level: 2,
                sequential_index: flat.len() as u32 + 1,
                display_index: format!("{}.{}", display_index, child_idx + 1),
                has_children: false,
            });
        }
    }

    flat
}

/// Keep only the first chapter and its direct subsections
pub fn first_chapter(flat: &[FlatEntry]) -> Vec<FlatEntry> {
    let Some(first) = flat.iter().find(|e| e.is_top_level()) else {
        return Vec::new();
    };
    let prefix = format!("{}.", first.display_index);

    flat.iter()
        .filter(|e| e.display_index == first.display_index || e.display_index.starts_with(&prefix))
        .cloned()
        .collect()
}

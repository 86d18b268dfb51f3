pub mod extract;
pub mod flatten;
pub mod scan;
pub mod title;
pub mod validate;

use serde::Serialize;

pub use extract::parse_menu;
pub use flatten::{first_chapter, flatten, FlatEntry};
pub use validate::{check_files, validate_structure, FileCheck, FsListing, StructureReport};

/// Number of navigation levels that carry meaning: chapters and their
/// direct subsections. Lists nested deeper than this are not followed.
pub const MAX_DEPTH: usize = 2;

/// Extension of the page files the menu links to.
pub const PAGE_EXTENSION: &str = ".html";

/// Landing page of the document set and of each chapter directory.
pub const INDEX_FILE: &str = "index.html";

/// One item of the side menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationNode {
    /// Link target relative to the source root
    pub href: String,
    pub title: String,
    pub children: Vec<NavigationNode>,
}

impl NavigationNode {
    pub fn new(href: impl Into<String>, title: impl Into<String>) -> Self {
        NavigationNode {
            href: href.into(),
            title: title.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<NavigationNode>) -> Self {
        self.children = children;
        self
    }

    pub fn is_folder(&self) -> bool {
        !self.children.is_empty()
    }
}

/// True if `name` is a page file (ends with [`PAGE_EXTENSION`]).
pub fn is_page_file(name: &str) -> bool {
    name.ends_with(PAGE_EXTENSION)
}

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::bookmark::{
    render_bookmarks, write_bookmarks_file, BookmarkStyle, PageMap, FRONT_MATTER_PAGES,
};
use crate::nav::scan::write_structure_report;
use crate::nav::title::document_title;
use crate::nav::validate::{bookmarks_allowed, DirectoryListing};
use crate::nav::{
    check_files, first_chapter, flatten, parse_menu, validate_structure, FileCheck, FlatEntry,
    FsListing, NavigationNode, StructureReport, INDEX_FILE,
};

pub const BOOKMARKS_FILE: &str = "bookmarks.txt";
pub const TEST_BOOKMARKS_FILE: &str = "test_bookmarks.txt";
pub const PREVIEW_FILE: &str = "bookmarks_preview.txt";
pub const STRUCTURE_FILE: &str = "file_structure.txt";

pub struct ParseOptions {
    pub src_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Only the first chapter and its subsections
    pub test_mode: bool,
    pub preview: bool,
    pub page_map: Option<PageMap>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            src_dir: PathBuf::from("src"),
            output_dir: PathBuf::from("output"),
            test_mode: false,
            preview: false,
            page_map: None,
        }
    }
}

/// Everything derived from one navigation document and source snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct TocAnalysis {
    pub tree: Vec<NavigationNode>,
    pub flat: Vec<FlatEntry>,
    pub structure: StructureReport,
    pub files: FileCheck,
}

impl TocAnalysis {
    pub fn bookmarks_allowed(&self) -> bool {
        bookmarks_allowed(&self.structure, &self.files)
    }
}

pub fn analyze_html<L: DirectoryListing>(html: &str, listing: &L) -> Result<TocAnalysis> {
    let tree = parse_menu(html)?;
    let flat = flatten(&tree);
    let structure = validate_structure(&tree, listing);
    let files = check_files(&flat, listing);

    Ok(TocAnalysis {
        tree,
        flat,
        structure,
        files,
    })
}

pub fn read_index<P: AsRef<Path>>(src_dir: P) -> Result<String> {
    let path = src_dir.as_ref().join(INDEX_FILE);
    std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read navigation document: {}", path.display()))
}

/// Parse a `{"title": pageIndex}` JSON object; a bad map is ignored
pub fn parse_page_map(json: &str) -> Option<PageMap> {
    match serde_json::from_str(json) {
        Ok(map) => Some(map),
        Err(e) => {
            warn!(error = %e, "ignoring malformed page map");
            None
        }
    }
}

pub fn run(options: &ParseOptions) -> Result<()> {
    info!(src = %options.src_dir.display(), "parsing navigation");
    let html = read_index(&options.src_dir)?;
    let listing = FsListing::new(&options.src_dir);
    let analysis = analyze_html(&html, &listing)?;

    log_summary(&analysis);

    let structure_path = options.output_dir.join(STRUCTURE_FILE);
    match write_structure_report(&options.src_dir, &structure_path) {
        Ok(_) => info!(path = %structure_path.display(), "structure report written"),
        Err(e) => warn!(error = %e, "failed to write structure report"),
    }

    if !analysis.bookmarks_allowed() {
        error!("skipping bookmark generation because of missing files or structure errors");
        return Ok(());
    }

    let (flat, file_name) = if options.test_mode {
        (first_chapter(&analysis.flat), TEST_BOOKMARKS_FILE)
    } else {
        (analysis.flat.clone(), BOOKMARKS_FILE)
    };

    let doc_title = document_title(&html);
    let page_map = options.page_map.as_ref();

    let bookmarks_path = options.output_dir.join(file_name);
    let text = render_bookmarks(&flat, &doc_title, page_map, BookmarkStyle::Outline);
    write_bookmarks_file(&bookmarks_path, &text)?;
    info!(path = %bookmarks_path.display(), entries = flat.len(), "bookmark file written");

    if options.preview {
        let style = BookmarkStyle::Preview {
            total_pages: FRONT_MATTER_PAGES + flat.len() as u32,
        };
        let preview_path = options.output_dir.join(PREVIEW_FILE);
        let preview = render_bookmarks(&flat, &doc_title, page_map, style);
        write_bookmarks_file(&preview_path, &preview)?;
        info!(path = %preview_path.display(), "bookmark preview written");
    }

    Ok(())
}

fn log_summary(analysis: &TocAnalysis) {
    info!(
        entries = analysis.flat.len(),
        depth = analysis.flat.iter().map(|e| e.level).max().unwrap_or(0),
        valid_files = analysis.files.valid.len(),
        missing_files = analysis.files.missing.len(),
        warnings = analysis.structure.warnings.len(),
        errors = analysis.structure.errors.len(),
        "navigation parsed"
    );

    for issue in &analysis.structure.warnings {
        warn!(kind = ?issue.kind, chapter = %issue.chapter_title, "{}", issue.message);
    }
    for issue in &analysis.structure.errors {
        error!(kind = ?issue.kind, chapter = %issue.chapter_title, "{}", issue.message);
    }
    for missing in &analysis.files.missing {
        error!(
            "missing file: {}. {} -> {}",
            missing.entry.display_index,
            missing.entry.title,
            missing.file_path.display()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const INDEX: &str = r#"<html><head><title>Guide - ACME</title></head><body>
<aside class="menu"><ul class="menu-list">
  <li><a href="a.html"><span class="menu-list-title">A</span></a>
    <ul>
      <li><a href="a/1.html"><span class="menu-list-title">A1</span></a></li>
      <li><a href="a/2.html"><span class="menu-list-title">A2</span></a></li>
    </ul>
  </li>
  <li><a href="b.html"><span class="menu-list-title">B</span></a></li>
</ul></aside></body></html>"#;

    fn site(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join(INDEX_FILE), INDEX).unwrap();
        for rel in files {
            let path = src.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "<html></html>").unwrap();
        }
        dir
    }

    fn options(dir: &TempDir) -> ParseOptions {
        ParseOptions {
            src_dir: dir.path().join("src"),
            output_dir: dir.path().join("output"),
            ..Default::default()
        }
    }

    #[test]
    fn test_run_writes_bookmarks_despite_warnings() {
        let dir = site(&["a.html", "a/1.html", "a/2.html", "a/3.html", "b.html"]);
        run(&options(&dir)).unwrap();

        let output = dir.path().join("output");
        let text = std::fs::read_to_string(output.join(BOOKMARKS_FILE)).unwrap();
        assert_eq!(
            text,
            "1.A(第3页)\n    1.1 A1(第4页)\n    1.2 A2(第5页)\n2.B(第6页)"
        );
        assert!(output.join(STRUCTURE_FILE).exists());
    }

    #[test]
    fn test_run_skips_bookmarks_when_file_missing() {
        let dir = site(&["a.html", "a/1.html", "a/2.html"]);
        run(&options(&dir)).unwrap();

        let output = dir.path().join("output");
        assert!(!output.join(BOOKMARKS_FILE).exists());
        assert!(output.join(STRUCTURE_FILE).exists());
    }

    #[test]
    fn test_run_test_mode_with_page_map_and_preview() {
        let dir = site(&["a.html", "a/1.html", "a/2.html", "b.html"]);
        let options = ParseOptions {
            test_mode: true,
            preview: true,
            page_map: parse_page_map(r#"{"A1": 4}"#),
            ..options(&dir)
        };
        run(&options).unwrap();

        let output = dir.path().join("output");
        let text = std::fs::read_to_string(output.join(TEST_BOOKMARKS_FILE)).unwrap();
        assert_eq!(text, "1.A(第3页)\n    1.1 A1(第5页)\n    1.2 A2(第5页)");
        assert!(!output.join(BOOKMARKS_FILE).exists());

        let preview = std::fs::read_to_string(output.join(PREVIEW_FILE)).unwrap();
        assert!(preview.starts_with("Guide目录：\n\n1.A(第3页)"));
        assert!(preview.ends_with("总页数：5"));
    }

    #[test]
    fn test_missing_index_is_fatal() {
        let dir = TempDir::new().unwrap();
        assert!(run(&options(&dir)).is_err());
    }

    #[test]
    fn test_analyze_html() {
        let dir = site(&["a.html", "a/1.html", "a/2.html"]);
        let listing = FsListing::new(dir.path().join("src"));
        let analysis = analyze_html(INDEX, &listing).unwrap();

        assert_eq!(analysis.tree.len(), 2);
        assert_eq!(analysis.flat.len(), 4);
        assert!(analysis.structure.warnings.is_empty());
        assert_eq!(analysis.files.missing.len(), 1);
        assert!(!analysis.bookmarks_allowed());
    }

    #[test]
    fn test_parse_page_map() {
        let map = parse_page_map(r#"{"Intro": 2, "概述": 7}"#).unwrap();
        assert_eq!(map.get("概述"), Some(&7));
        assert!(parse_page_map("not json").is_none());
        assert!(parse_page_map(r#"{"Intro": -1}"#).is_none());
    }

    #[test]
    fn test_max_page_index_renders_estimate() {
        let map = parse_page_map(r#"{"A": 4294967295}"#);
        let flat = flatten(&parse_menu(INDEX).unwrap());
        let text = render_bookmarks(&flat, "Guide", map.as_ref(), BookmarkStyle::Outline);
        assert!(text.starts_with("1.A(第3页)\n"));
    }
}

use crate::bookmark::read_bookmarks;
use crate::pdf::outline::{outline_items, write_flat_outline};
use crate::pdf::PdfDocument;
use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct InjectSummary {
    pub output_path: PathBuf,
    pub doc_title: Option<String>,
    /// Outline entries written, cover and contents included
    pub placed: usize,
    pub requested: usize,
}

/// Add the bookmark file's entries to `pdf` as a flat outline.
///
/// Writes to `output`, or `<stem>_with_bookmarks.pdf` beside the input.
pub fn inject<P: AsRef<Path>, Q: AsRef<Path>>(
    pdf: P,
    bookmarks: Q,
    output: Option<&Path>,
) -> Result<InjectSummary> {
    let bookmarks = bookmarks.as_ref();
    let file = read_bookmarks(bookmarks)?;
    if file.entries.is_empty() {
        anyhow::bail!("No bookmarks found in {}", bookmarks.display());
    }
    info!(
        path = %bookmarks.display(),
        entries = file.entries.len(),
        title = file.doc_title.as_deref().unwrap_or("-"),
        "bookmarks parsed"
    );

    let mut doc = PdfDocument::open(&pdf)?;
    info!(path = %doc.path.display(), pages = doc.page_count(), "PDF opened");
    let items = outline_items(&file);
    let placed = write_flat_outline(&mut doc.doc, &items)?;

    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| doc.bookmarked_path());
    doc.save(&output_path)?;

    Ok(InjectSummary {
        output_path,
        doc_title: file.doc_title,
        placed,
        requested: items.len(),
    })
}

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
    pdf: P,
    bookmarks: Q,
    output: Option<&Path>,
) -> Result<()> {
    let summary = inject(pdf, bookmarks, output)?;

    println!(
        "Added {} of {} bookmark(s) to {}",
        summary.placed,
        summary.requested,
        summary.output_path.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::outline::{extract_outline, CONTENTS_TITLE, COVER_TITLE};
    use crate::pdf::test_helpers::generate_pdf;
    use tempfile::TempDir;

    fn setup(pages: usize, bookmarks: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        generate_pdf(pages)
            .save(dir.path().join("document_by_toc.pdf"))
            .unwrap();
        std::fs::write(dir.path().join("bookmarks.txt"), bookmarks).unwrap();
        dir
    }

    #[test]
    fn test_inject_default_output() {
        let dir = setup(5, "1.Intro(第3页)\n    1.1 Usage(第4页)\n2.Later(第9页)");
        let summary = inject(
            dir.path().join("document_by_toc.pdf"),
            dir.path().join("bookmarks.txt"),
            None,
        )
        .unwrap();

        assert_eq!(
            summary.output_path,
            dir.path().join("document_by_toc_with_bookmarks.pdf")
        );
        assert_eq!(summary.requested, 5);
        assert_eq!(summary.placed, 4);

        let outline = extract_outline(&summary.output_path).unwrap();
        let listed: Vec<(&str, Option<u32>)> =
            outline.iter().map(|e| (e.title.as_str(), e.page)).collect();
        assert_eq!(
            listed,
            vec![
                (COVER_TITLE, Some(1)),
                (CONTENTS_TITLE, Some(2)),
                ("Intro", Some(3)),
                ("Usage", Some(4)),
            ]
        );
    }

    #[test]
    fn test_inject_explicit_output() {
        let dir = setup(3, "1.Intro(第3页)");
        let output = dir.path().join("out/final.pdf");
        let summary = inject(
            dir.path().join("document_by_toc.pdf"),
            dir.path().join("bookmarks.txt"),
            Some(&output),
        )
        .unwrap();
        assert_eq!(summary.output_path, output);
        assert!(output.exists());
    }

    #[test]
    fn test_empty_bookmark_file_fails() {
        let dir = setup(3, "nothing to see\n");
        let result = inject(
            dir.path().join("document_by_toc.pdf"),
            dir.path().join("bookmarks.txt"),
            None,
        );
        assert!(result.is_err());
        assert!(!dir.path().join("document_by_toc_with_bookmarks.pdf").exists());
    }

    #[test]
    fn test_missing_pdf_fails() {
        let dir = setup(1, "1.Intro(第1页)");
        let result = inject(
            dir.path().join("nope.pdf"),
            dir.path().join("bookmarks.txt"),
            None,
        );
        assert!(result.is_err());
    }
}

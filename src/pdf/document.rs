use anyhow::{Context, Result};
use lopdf::Document;
use std::path::{Path, PathBuf};

pub struct PdfDocument {
    pub doc: Document,
    pub path: PathBuf,
}

impl PdfDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let doc = Document::load(&path)
            .with_context(|| format!("Failed to open PDF: {}", path.display()))?;
        Ok(PdfDocument { doc, path })
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        self.doc
            .save(path)
            .with_context(|| format!("Failed to save PDF: {}", path.display()))?;
        Ok(())
    }

    /// `<dir>/<stem>_with_bookmarks.pdf` next to the source
    pub fn bookmarked_path(&self) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        self.path.with_file_name(format!("{}_with_bookmarks.pdf", stem))
    }
}

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use super::{is_page_file, FlatEntry, NavigationNode, INDEX_FILE};

/// Read access to the source tree, relative to its root.
pub trait DirectoryListing {
    /// Names of the page files directly inside `dir`, excluding its index
    /// file. `None` if `dir` is not a directory or cannot be read.
    fn page_files(&self, dir: &Path) -> Option<Vec<String>>;

    fn exists(&self, path: &Path) -> bool;

    /// The location a relative path resolves to, for reporting
    fn resolve(&self, path: &Path) -> PathBuf;
}

/// [`DirectoryListing`] over the real file system.
#[derive(Debug, Clone)]
pub struct FsListing {
    root: PathBuf,
}

impl FsListing {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        FsListing {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl DirectoryListing for FsListing {
    fn page_files(&self, dir: &Path) -> Option<Vec<String>> {
        let dir = self.root.join(dir);
        if !dir.is_dir() {
            return None;
        }

        let entries = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .collect::<Result<Vec<_>, _>>();
        let entries = match entries {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    dir = %dir.display(),
                    error = %e,
                    "cannot list directory, skipping its checks"
                );
                return None;
            }
        };

        let names = entries
            .iter()
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .filter(|name| is_page_file(name) && name != INDEX_FILE)
            .collect();
        Some(names)
    }

    fn exists(&self, path: &Path) -> bool {
        self.root.join(path).exists()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        let joined = self.root.join(path);
        std::path::absolute(&joined).unwrap_or(joined)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MismatchCount,
    MissingInHtml,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum IssueDetails {
    Counts { html_count: usize, dir_count: usize },
    Files { files: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub chapter_title: String,
    /// Depth of the node the issue was found on; chapters are 1
    pub level: u32,
    pub details: IssueDetails,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructureReport {
    pub warnings: Vec<ValidationIssue>,
    pub errors: Vec<ValidationIssue>,
}

impl StructureReport {
    fn extend(&mut self, other: StructureReport) {
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
    }
}

/// Cross-check the menu against the directories backing it.
///
/// A chapter `x.html` whose directory `x/` exists must list one child per
/// page file in `x/`. Below the top level only nodes with children of their
/// own are checked, so a subsection's asset directory is not mistaken for a
/// chapter. Findings are warnings; a node with children but no directory is
/// fine.
pub fn validate_structure<L: DirectoryListing>(
    tree: &[NavigationNode],
    listing: &L,
) -> StructureReport {
    validate_level(tree, listing, 1)
}

fn validate_level<L: DirectoryListing>(
    nodes: &[NavigationNode],
    listing: &L,
    level: u32,
) -> StructureReport {
    let mut report = StructureReport::default();

    for node in nodes {
        if level > 1 && !node.is_folder() {
            continue;
        }
        let expected_dir = Path::new(&node.href).with_extension("");

        if let Some(dir_files) = listing.page_files(&expected_dir) {
            let dir_label = expected_dir.display();

            if node.children.len() != dir_files.len() {
                report.warnings.push(ValidationIssue {
                    kind: IssueKind::MismatchCount,
                    chapter_title: node.title.clone(),
                    level,
                    details: IssueDetails::Counts {
                        html_count: node.children.len(),
                        dir_count: dir_files.len(),
                    },
                    message: format!(
                        "chapter '{}' lists {} subsection(s) but '{}/' holds {} page file(s)",
                        node.title,
                        node.children.len(),
                        dir_label,
                        dir_files.len()
                    ),
                });
            }

            let referenced: BTreeSet<&str> = node
                .children
                .iter()
                .filter_map(|c| Path::new(&c.href).file_name().and_then(|n| n.to_str()))
                .collect();
            let unreferenced: Vec<String> = dir_files
                .iter()
                .filter(|name| !referenced.contains(name.as_str()))
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();

            if !unreferenced.is_empty() {
                report.warnings.push(ValidationIssue {
                    kind: IssueKind::MissingInHtml,
                    chapter_title: node.title.clone(),
                    level,
                    message: format!(
                        "'{}/' contains files not referenced by the menu: {}",
                        dir_label,
                        unreferenced.join(", ")
                    ),
                    details: IssueDetails::Files {
                        files: unreferenced,
                    },
                });
            }
        }

        if node.is_folder() {
            report.extend(validate_level(&node.children, listing, level + 1));
        }
    }

    report
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingFile {
    #[serde(flatten)]
    pub entry: FlatEntry,
    pub file_path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileCheck {
    pub valid: Vec<FlatEntry>,
    pub missing: Vec<MissingFile>,
}

/// Partition entries by whether the file they link to exists
pub fn check_files<L: DirectoryListing>(flat: &[FlatEntry], listing: &L) -> FileCheck {
    let mut check = FileCheck::default();

    for entry in flat {
        let path = Path::new(&entry.href);
        if listing.exists(path) {
            check.valid.push(entry.clone());
        } else {
            check.missing.push(MissingFile {
                entry: entry.clone(),
                file_path: listing.resolve(path),
            });
        }
    }

    check
}

/// A bookmark file is only worth writing when a PDF build can satisfy it.
pub fn bookmarks_allowed(report: &StructureReport, files: &FileCheck) -> bool {
    report.errors.is_empty() && files.missing.is_empty()
}

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use super::{is_page_file, INDEX_FILE};

/// Directory names never treated as content
const IGNORED_DIRS: &[&str] = &["assets"];

const RULE_WIDTH: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    /// Path relative to the scanned root
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirInfo {
    pub name: String,
    pub path: PathBuf,
    pub files: Vec<FileInfo>,
    pub subdirs: Vec<DirInfo>,
}

/// Snapshot of the page files under a source root, three levels deep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectoryTree {
    pub root_files: Vec<FileInfo>,
    pub dirs: Vec<DirInfo>,
}

impl DirectoryTree {
    pub fn total_files(&self) -> usize {
        self.root_files.len()
            + self
                .dirs
                .iter()
                .map(|d| d.files.len() + d.subdirs.iter().map(|s| s.files.len()).sum::<usize>())
                .sum::<usize>()
    }

    pub fn total_dirs(&self) -> usize {
        self.dirs.len() + self.dirs.iter().map(|d| d.subdirs.len()).sum::<usize>()
    }
}

/// Scan `root` for page files.
///
/// Picks up the root's own pages, every visible subdirectory except
/// `assets`, and the visible subdirectories one level below those.
pub fn scan_directory<P: AsRef<Path>>(root: P) -> Result<DirectoryTree> {
    let root = root.as_ref();
    if !root.is_dir() {
        bail!("Source directory does not exist: {}", root.display());
    }

    let mut tree = DirectoryTree {
        root_files: page_files(root, root)?,
        dirs: Vec::new(),
    };

    for dir in subdirs(root)? {
        if IGNORED_DIRS.contains(&file_name(&dir).as_str()) {
            continue;
        }

        let mut info = dir_info(root, dir.path())?;
        for sub in subdirs(dir.path())? {
            info.subdirs.push(dir_info(root, sub.path())?);
        }
        tree.dirs.push(info);
    }

    Ok(tree)
}

fn dir_info(root: &Path, dir: &Path) -> Result<DirInfo> {
    Ok(DirInfo {
        name: dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        path: relative(root, dir),
        files: page_files(root, dir)?,
        subdirs: Vec::new(),
    })
}

fn children(dir: &Path) -> Result<Vec<DirEntry>> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .map(|e| e.with_context(|| format!("Failed to read directory: {}", dir.display())))
        .collect()
}

fn subdirs(dir: &Path) -> Result<Vec<DirEntry>> {
    Ok(children(dir)?
        .into_iter()
        .filter(|e| e.file_type().is_dir() && !file_name(e).starts_with('.'))
        .collect())
}

fn page_files(root: &Path, dir: &Path) -> Result<Vec<FileInfo>> {
    let mut files = Vec::new();

    for entry in children(dir)? {
        let name = file_name(&entry);
        if !entry.file_type().is_file() || !is_page_file(&name) || name == INDEX_FILE {
            continue;
        }

        let size = entry
            .metadata()
            .with_context(|| format!("Failed to stat {}", entry.path().display()))?
            .len();
        files.push(FileInfo {
            path: relative(root, entry.path()),
            name,
            size,
        });
    }

    Ok(files)
}

fn file_name(entry: &DirEntry) -> String {
    entry.file_name().to_string_lossy().to_string()
}

fn relative(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

/// Render the tree as the human-readable structure report
pub fn render_structure(tree: &DirectoryTree) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut lines = vec!["src/ 文件夹结构:".to_string(), rule.clone(), String::new()];

    if !tree.root_files.is_empty() {
        lines.push("根目录文件:".to_string());
        for file in &tree.root_files {
            lines.push(format!("  📄 {}", file.name));
        }
        lines.push(String::new());
    }

    for dir in &tree.dirs {
        lines.push(format!("📁 {}/", dir.name));
        for file in &dir.files {
            lines.push(format!("    📄 {}", file.name));
        }
        for sub in &dir.subdirs {
            lines.push(format!("    📁 {}/", sub.name));
            for file in &sub.files {
                lines.push(format!("        📄 {}", file.name));
            }
        }
        lines.push(String::new());
    }

    lines.push(rule);
    lines.push(format!(
        "总计: {} 个文件, {} 个目录",
        tree.total_files(),
        tree.total_dirs()
    ));

    lines.join("\n")
}

/// Scan `root` and write the structure report, creating parent directories
pub fn write_structure_report<P: AsRef<Path>, Q: AsRef<Path>>(
    root: P,
    output: Q,
) -> Result<DirectoryTree> {
    let output = output.as_ref();
    let tree = scan_directory(root)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(output, render_structure(&tree))
        .with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(tree)
}

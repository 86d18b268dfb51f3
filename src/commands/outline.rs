use crate::pdf::outline::{extract_outline, flatten_outline};
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>>(path: P) -> Result<()> {
    let entries = extract_outline(&path)?;

    if entries.is_empty() {
        println!("No outline found.");
        return Ok(());
    }

    for entry in flatten_outline(&entries) {
        let indent = "  ".repeat(entry.level as usize);
        let page_str = entry
            .page
            .map(|p| format!(" (p. {})", p))
            .unwrap_or_default();
        println!("{}{}{}", indent, entry.title, page_str);
    }

    Ok(())
}

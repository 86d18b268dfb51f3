use crate::nav::scan::{render_structure, scan_directory, write_structure_report};
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>>(src_dir: P, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let tree = write_structure_report(&src_dir, path)?;
            println!(
                "Wrote structure of {} file(s) in {} dir(s) to {}",
                tree.total_files(),
                tree.total_dirs(),
                path.display()
            );
        }
        None => {
            let tree = scan_directory(&src_dir)?;
            println!("{}", render_structure(&tree));
        }
    }

    Ok(())
}

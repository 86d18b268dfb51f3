use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tocmark")]
#[command(about = "Turn an HTML side menu into numbered PDF bookmarks")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server
    Mcp,

    /// Parse the menu in <src>/index.html, validate it and write the bookmark file
    Parse {
        /// Source directory holding index.html and the pages
        #[arg(short, long, default_value = "src")]
        src: PathBuf,

        /// Directory for bookmarks.txt and file_structure.txt
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,

        /// Only emit the first chapter and its subsections (test_bookmarks.txt)
        #[arg(long)]
        test: bool,

        /// JSON object mapping titles to 0-based page indices
        #[arg(long)]
        page_map: Option<String>,

        /// Also write a titled preview of the bookmarks
        #[arg(long)]
        preview: bool,
    },

    /// Print the page-file layout of a source directory
    Scan {
        /// Source directory
        #[arg(default_value = "src")]
        src: PathBuf,

        /// Write the report to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Add the bookmark file to a PDF as its outline
    #[command(alias = "add-bookmarks")]
    Bookmark {
        /// PDF file to add bookmarks to
        pdf: PathBuf,

        /// Bookmark file
        #[arg(default_value = "output/bookmarks.txt")]
        bookmarks: PathBuf,

        /// Output file (default: <name>_with_bookmarks.pdf next to the input)
        output: Option<PathBuf>,
    },

    /// Print the outline of a PDF
    Outline {
        /// PDF file to inspect
        path: PathBuf,
    },
}

mod bookmark;
mod cli;
mod commands;
mod mcp;
mod nav;
mod pdf;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(err) = run().await {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Mcp => {
            mcp::run_server().await?;
        }
        Commands::Parse {
            src,
            output_dir,
            test,
            page_map,
            preview,
        } => {
            let options = commands::parse::ParseOptions {
                src_dir: src,
                output_dir,
                test_mode: test,
                preview,
                page_map: page_map.as_deref().and_then(commands::parse::parse_page_map),
            };
            commands::parse::run(&options)?;
        }
        Commands::Scan { src, output } => {
            commands::scan::run(&src, output.as_deref())?;
        }
        Commands::Bookmark {
            pdf,
            bookmarks,
            output,
        } => {
            commands::bookmark::run(&pdf, &bookmarks, output.as_deref())?;
        }
        Commands::Outline { path } => {
            commands::outline::run(&path)?;
        }
    }

    Ok(())
}

// Logs go to stderr; stdout carries command output and the MCP transport
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

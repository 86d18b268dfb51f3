use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_router,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::bookmark::{render_bookmarks, BookmarkStyle, PageMap, FRONT_MATTER_PAGES};
use crate::commands::bookmark::inject;
use crate::commands::parse::{analyze_html, read_index};
use crate::nav::title::document_title;
use crate::nav::{first_chapter, FsListing};
use crate::pdf::outline::{extract_outline, flatten_outline};

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SourceRequest {
    #[schemars(description = "Source directory containing index.html and the page files")]
    pub src_dir: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct BookmarksRequest {
    #[schemars(description = "Source directory containing index.html and the page files")]
    pub src_dir: String,
    #[schemars(description = "Optional map from entry title to its 0-based page index")]
    #[serde(default)]
    pub page_map: Option<PageMap>,
    #[schemars(description = "Render the titled preview instead of the bookmark file format (default: false)")]
    #[serde(default)]
    pub preview: bool,
    #[schemars(description = "Only the first chapter and its subsections (default: false)")]
    #[serde(default)]
    pub first_chapter_only: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddBookmarksRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[schemars(description = "Path to the bookmark file")]
    pub bookmarks: String,
    #[schemars(description = "Output file path (default: <name>_with_bookmarks.pdf next to the input)")]
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TocServer {
    #[allow(dead_code)]
    tool_router: ToolRouter<Self>,
}

impl TocServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for TocServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl TocServer {
    #[tool(description = "Parse the side menu of <src_dir>/index.html into a numbered flat list and check it against the files on disk")]
    fn toc_parse(
        &self,
        Parameters(SourceRequest { src_dir }): Parameters<SourceRequest>,
    ) -> String {
        let analysis = read_index(&src_dir)
            .and_then(|html| analyze_html(&html, &FsListing::new(&src_dir)));
        match analysis {
            Ok(analysis) => {
                let result = TocParseResult {
                    bookmarks_allowed: analysis.bookmarks_allowed(),
                    analysis,
                };
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Render the bookmark text for <src_dir>/index.html, optionally using measured page indices")]
    fn toc_bookmarks(&self, Parameters(req): Parameters<BookmarksRequest>) -> String {
        let html = match read_index(&req.src_dir) {
            Ok(html) => html,
            Err(e) => return format!("Error: {}", e),
        };
        let analysis = match analyze_html(&html, &FsListing::new(&req.src_dir)) {
            Ok(a) => a,
            Err(e) => return format!("Error: {}", e),
        };

        let flat = if req.first_chapter_only {
            first_chapter(&analysis.flat)
        } else {
            analysis.flat
        };
        let style = if req.preview {
            BookmarkStyle::Preview {
                total_pages: FRONT_MATTER_PAGES + flat.len() as u32,
            }
        } else {
            BookmarkStyle::Outline
        };

        render_bookmarks(&flat, &document_title(&html), req.page_map.as_ref(), style)
    }

    #[tool(description = "Get the outline (bookmarks) of a PDF as a flat list with levels and 1-based pages")]
    fn pdf_outline(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        match extract_outline(&path) {
            Ok(entries) => {
                let result: Vec<OutlineEntryResult> = flatten_outline(&entries)
                    .into_iter()
                    .map(|e| OutlineEntryResult {
                        title: e.title.clone(),
                        page: e.page,
                        level: e.level,
                    })
                    .collect();
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Add a bookmark file to a PDF as a flat outline, preceded by cover and contents entries")]
    fn pdf_add_bookmarks(&self, Parameters(req): Parameters<AddBookmarksRequest>) -> String {
        match inject(&req.path, &req.bookmarks, req.output.as_deref().map(Path::new)) {
            Ok(summary) => {
                serde_json::to_string_pretty(&summary).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {}", e),
        }
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize)]
pub struct TocParseResult {
    #[serde(flatten)]
    pub analysis: crate::commands::parse::TocAnalysis,
    pub bookmarks_allowed: bool,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct OutlineEntryResult {
    pub title: String,
    pub page: Option<u32>,
    pub level: u32,
}

impl ServerHandler for TocServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Table-of-contents tools for HTML document sets. Use toc_parse to number the \
                 side menu and validate it against the source tree, toc_bookmarks to render the \
                 bookmark text, pdf_add_bookmarks to write it into a PDF outline, and \
                 pdf_outline to inspect the result."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server() -> Result<()> {
    let server = TocServer::new();

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}

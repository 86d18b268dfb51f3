use regex::Regex;
use scraper::{Html, Selector};

pub const DEFAULT_DOC_TITLE: &str = "文档";

/// Best-effort document title: `<title>` without site/author suffixes,
/// then the first `<h1>`, then `<meta name="title">`.
pub fn document_title(html: &str) -> String {
    let document = Html::parse_document(html);

    if let Some(title) = first_text(&document, "title").map(|t| strip_suffixes(&t)) {
        if !title.is_empty() {
            return title;
        }
    }

    if let Some(h1) = first_text(&document, "h1").filter(|t| !t.is_empty()) {
        return h1;
    }

    Selector::parse(r#"meta[name="title"]"#)
        .ok()
        .and_then(|sel| {
            document
                .select(&sel)
                .find_map(|meta| meta.value().attr("content"))
                .map(|c| c.trim().to_string())
        })
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_DOC_TITLE.to_string())
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    let sel = Selector::parse(css).ok()?;
    document
        .select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}

/// Drop trailing " - Author" and " | Site" parts
fn strip_suffixes(title: &str) -> String {
    let mut title = title.to_string();
    for pattern in [r"\s*-\s*.*$", r"\s*\|\s*.*$"] {
        if let Ok(re) = Regex::new(pattern) {
            title = re.replace(&title, "").into_owned();
        }
    }
    title.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_suffixes_removed() {
        let html = "<html><head><title>User Guide - ACME | Docs</title></head></html>";
        assert_eq!(document_title(html), "User Guide");
    }

    #[test]
    fn test_falls_back_to_h1() {
        let html = "<html><head><title> - only suffix</title></head><body><h1> Manual </h1></body></html>";
        assert_eq!(document_title(html), "Manual");
    }

    #[test]
    fn test_falls_back_to_meta() {
        let html = r#"<html><head><meta name="title" content="Handbook"></head><body></body></html>"#;
        assert_eq!(document_title(html), "Handbook");
    }

    #[test]
    fn test_default_title() {
        assert_eq!(document_title("<html><body><p>hi</p></body></html>"), DEFAULT_DOC_TITLE);
    }
}

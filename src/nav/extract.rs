use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use super::{is_page_file, NavigationNode, MAX_DEPTH};

const MENU_SELECTOR: &str = "aside.menu";
const MENU_LIST_SELECTOR: &str = "ul.menu-list";
const LIST_SELECTOR: &str = "ul";
const LINK_SELECTOR: &str = "a[href]";
const TITLE_SELECTOR: &str = "span.menu-list-title";

/// The navigation document lacks something the extractor cannot work without.
#[derive(Debug, Error)]
pub enum StructureError {
    #[error("menu container not found")]
    MenuNotFound,
    #[error("toc list not found")]
    ListNotFound,
    #[error("invalid selector {selector}: {reason}")]
    Selector {
        selector: &'static str,
        reason: String,
    },
}

struct Selectors {
    list: Selector,
    link: Selector,
    title: Selector,
}

impl Selectors {
    fn new() -> Result<Self, StructureError> {
        Ok(Selectors {
            list: selector(LIST_SELECTOR)?,
            link: selector(LINK_SELECTOR)?,
            title: selector(TITLE_SELECTOR)?,
        })
    }
}

fn selector(css: &'static str) -> Result<Selector, StructureError> {
    Selector::parse(css).map_err(|e| StructureError::Selector {
        selector: css,
        reason: format!("{:?}", e),
    })
}

/// Parse an HTML document and extract its side-menu tree
pub fn parse_menu(html: &str) -> Result<Vec<NavigationNode>, StructureError> {
    let document = Html::parse_document(html);
    extract_navigation(&document)
}

/// Extract the navigation tree from an already parsed document.
///
/// The menu is the first `aside.menu`; its list is the first `ul.menu-list`
/// inside it, or failing that the first `ul`. Items without a page link or
/// without a non-blank `span.menu-list-title` are skipped. Whitespace runs in
/// titles collapse to single spaces.
pub fn extract_navigation(document: &Html) -> Result<Vec<NavigationNode>, StructureError> {
    let selectors = Selectors::new()?;

    let menu = document
        .select(&selector(MENU_SELECTOR)?)
        .next()
        .ok_or(StructureError::MenuNotFound)?;

    let list = menu
        .select(&selector(MENU_LIST_SELECTOR)?)
        .next()
        .or_else(|| menu.select(&selectors.list).next())
        .ok_or(StructureError::ListNotFound)?;

    Ok(parse_list(list, &selectors, 1))
}

fn parse_list(list: ElementRef<'_>, selectors: &Selectors, depth: usize) -> Vec<NavigationNode> {
    let mut nodes = Vec::new();

    for item in list
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "li")
    {
        // Only the first link of the item decides whether it navigates
        let Some(link) = item.select(&selectors.link).next() else {
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if !is_page_file(href) {
            continue;
        }

        let Some(title_el) = link.select(&selectors.title).next() else {
            continue;
        };
        // Bookmark lines hold one entry each
        let title = title_el
            .text()
            .flat_map(str::split_whitespace)
            .collect::<Vec<_>>()
            .join(" ");
        if title.is_empty() {
            continue;
        }

        let children = if depth < MAX_DEPTH {
            item.select(&selectors.list)
                .next()
                .map(|sub| parse_list(sub, selectors, depth + 1))
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        nodes.push(NavigationNode::new(href, title).with_children(children));
    }

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(href: &str, title: &str, nested: &str) -> String {
        format!(
            r#"<li><a href="{}"><span class="menu-list-title">{}</span></a>{}</li>"#,
            href, title, nested
        )
    }

    fn menu(items: &str) -> String {
        format!(
            r#"<html><body><aside class="menu"><ul class="menu-list">{}</ul></aside></body></html>"#,
            items
        )
    }

    #[test]
    fn test_two_levels() {
        let children = format!(
            "<ul>{}{}</ul>",
            item("a/1.html", "A1", ""),
            item("a/2.html", "A2", "")
        );
        let html = menu(&(item("a.html", "A", &children) + &item("b.html", "B", "")));

        let tree = parse_menu(&html).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].title, "A");
        assert!(tree[0].is_folder());
        assert_eq!(
            tree[0].children,
            vec![
                NavigationNode::new("a/1.html", "A1"),
                NavigationNode::new("a/2.html", "A2"),
            ]
        );
        assert_eq!(tree[1], NavigationNode::new("b.html", "B"));
    }

    #[test]
    fn test_title_is_trimmed() {
        let html = menu(&item("intro.html", "  Intro \n", ""));
        let tree = parse_menu(&html).unwrap();
        assert_eq!(tree, vec![NavigationNode::new("intro.html", "Intro")]);
    }

    #[test]
    fn test_titles_stay_on_one_bookmark_line() {
        use crate::bookmark::{parse_bookmarks, render_bookmarks, BookmarkStyle};
        use crate::nav::flatten;

        let items = [
            item("a.html", "Part\n   One", ""),
            item("b.html", " \n ", ""),
            item("c.html", "C", ""),
        ]
        .concat();
        let tree = parse_menu(&menu(&items)).unwrap();
        assert_eq!(
            tree,
            vec![
                NavigationNode::new("a.html", "Part One"),
                NavigationNode::new("c.html", "C"),
            ]
        );

        let flat = flatten(&tree);
        let text = render_bookmarks(&flat, "Doc", None, BookmarkStyle::Outline);
        assert_eq!(text, "1.Part One(第3页)\n2.C(第4页)");

        let parsed = parse_bookmarks(&text).unwrap();
        assert_eq!(parsed.entries.len(), flat.len());
        assert_eq!(parsed.entries[0].title, "Part One");
    }

    #[test]
    fn test_skips_non_navigational_items() {
        let items = [
            r#"<li><a href="https://example.com/"><span class="menu-list-title">Ext</span></a></li>"#
                .to_string(),
            "<li>plain text</li>".to_string(),
            r#"<li><a href="untitled.html">No span</a></li>"#.to_string(),
            item("kept.html", "Kept", ""),
        ]
        .concat();
        let tree = parse_menu(&menu(&items)).unwrap();
        assert_eq!(tree, vec![NavigationNode::new("kept.html", "Kept")]);
    }

    #[test]
    fn test_deeper_lists_are_not_followed() {
        let grandchildren = format!("<ul>{}</ul>", item("a/1/x.html", "X", ""));
        let children = format!("<ul>{}</ul>", item("a/1.html", "A1", &grandchildren));
        let html = menu(&item("a.html", "A", &children));

        let tree = parse_menu(&html).unwrap();
        assert_eq!(tree[0].children.len(), 1);
        assert!(tree[0].children[0].children.is_empty());
    }

    #[test]
    fn test_falls_back_to_first_list() {
        let html = format!(
            r#"<aside class="menu"><p>Menu</p><ul>{}</ul></aside>"#,
            item("a.html", "A", "")
        );
        let tree = parse_menu(&html).unwrap();
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_missing_menu() {
        let err = parse_menu("<html><body><ul></ul></body></html>").unwrap_err();
        assert!(matches!(err, StructureError::MenuNotFound));
        assert_eq!(err.to_string(), "menu container not found");
    }

    #[test]
    fn test_missing_list() {
        let err = parse_menu(r#"<aside class="menu"><p>empty</p></aside>"#).unwrap_err();
        assert!(matches!(err, StructureError::ListNotFound));
        assert_eq!(err.to_string(), "toc list not found");
    }
}

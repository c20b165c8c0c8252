//! HTML parser for Wikidot page structures
//!
//! This module handles parsing wiki HTML to extract:
//! - Article links from the paginated listing box
//! - Page tags, primary content, and revision timestamps
//! - The pager total and tag-search candidate lists

use chrono::NaiveDateTime;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// A discovered article: display title plus absolute URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleLink {
    pub title: String,
    pub url: String,
}

/// Tags Wikidot applies to service pages rather than articles
pub const SYSTEM_TAGS: [&str; 6] = [
    "компонент",
    "навигация",
    "поиск",
    "системный",
    "структура_сайта",
    "тест",
];

/// Returns true if any of the page's tags marks it as a service page
pub fn is_system_tagged(tags: &HashSet<String>) -> bool {
    tags.iter().any(|tag| SYSTEM_TAGS.contains(&tag.as_str()))
}

/// Reads the total number of listing pages from the pager widget
///
/// The pager renders as `span.pager-no` with text like "page 1 of 27";
/// the last whitespace-separated token is the total. Listings short
/// enough to fit on one page have no pager at all, so anything missing
/// or malformed counts as a single page.
pub fn parse_total_pages(html: &str) -> usize {
    let document = Html::parse_document(html);

    let pager_selector = match Selector::parse("span.pager-no") {
        Ok(selector) => selector,
        Err(_) => return 1,
    };

    document
        .select(&pager_selector)
        .next()
        .and_then(|span| {
            let text = span.text().collect::<String>();
            text.split_whitespace()
                .last()
                .and_then(|token| token.parse::<usize>().ok())
        })
        .filter(|&total| total >= 1)
        .unwrap_or(1)
}

/// Extracts article links from a listing page
///
/// # Extraction Rules
///
/// **Include:**
/// - Anchors inside the first `div.list-pages-box`
///
/// **Exclude:**
/// - Anchors whose text is "edit" (any case) - Wikidot appends one per entry
/// - Anchors without an href
/// - The side bar and everything in it
///
/// Relative hrefs are resolved against `base_url`.
///
/// # Arguments
///
/// * `html` - The listing page HTML
/// * `base_url` - The site root for resolving relative links
///
/// # Returns
///
/// Article links in document order. Missing listing box yields an empty vector.
pub fn extract_article_links(html: &str, base_url: &Url) -> Vec<ArticleLink> {
    let mut document = Html::parse_document(html);

    // The side bar can embed its own listing module; drop it before
    // looking for the real listing box.
    if let Ok(side_bar_selector) = Selector::parse("div#side-bar") {
        detach_all(&mut document, &side_bar_selector);
    }

    let box_selector = match Selector::parse("div.list-pages-box") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };
    let anchor_selector = match Selector::parse("a") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    let listing = match document.select(&box_selector).next() {
        Some(listing) => listing,
        None => return Vec::new(),
    };

    let mut links = Vec::new();
    for anchor in listing.select(&anchor_selector) {
        let title = anchor.text().collect::<String>().trim().to_string();
        if title.eq_ignore_ascii_case("edit") {
            continue;
        }

        if let Some(href) = anchor.value().attr("href") {
            if let Ok(resolved) = base_url.join(href.trim()) {
                links.push(ArticleLink {
                    title,
                    url: resolved.to_string(),
                });
            }
        }
    }

    links
}

/// Extracts the page's tag set, lowercased
///
/// Tags live in anchors under `div.page-tags`. Pages without the block
/// yield an empty set.
pub fn extract_tags(html: &str) -> HashSet<String> {
    let document = Html::parse_document(html);
    let mut tags = HashSet::new();

    let tag_selector = match Selector::parse("div.page-tags a") {
        Ok(selector) => selector,
        Err(_) => return tags,
    };

    for anchor in document.select(&tag_selector) {
        let tag = anchor.text().collect::<String>().trim().to_lowercase();
        if !tag.is_empty() {
            tags.insert(tag);
        }
    }

    tags
}

/// Extracts the primary article text from `div#page-content`
///
/// Decorative `div.no-style` blocks inside the content are dropped
/// before text extraction. Text nodes are trimmed and joined with
/// single spaces.
///
/// # Returns
///
/// * `Some(text)` - The page has a content block (text may be empty)
/// * `None` - No content block on the page
pub fn extract_primary_content(html: &str) -> Option<String> {
    let mut document = Html::parse_document(html);

    let content_selector = Selector::parse("div#page-content").ok()?;
    let no_style_selector = Selector::parse("div.no-style").ok()?;

    let (content_id, decorative) = {
        let content = document.select(&content_selector).next()?;
        let ids: Vec<_> = content
            .select(&no_style_selector)
            .map(|element| element.id())
            .collect();
        (content.id(), ids)
    };

    for id in decorative {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    let node = document.tree.get(content_id)?;
    let content = ElementRef::wrap(node)?;
    Some(spaced_text(&content))
}

/// Reads the last-revision timestamp from the page footer
///
/// The first span in `div#page-info` carries text like
/// "17:06 03 Jul 2025 (3 days ago)"; the part before the parenthesis is
/// the revision stamp in site-local form.
pub fn extract_revision_stamp(html: &str) -> Option<NaiveDateTime> {
    let document = Html::parse_document(html);
    let info_selector = Selector::parse("div#page-info span").ok()?;

    let span = document.select(&info_selector).next()?;
    let text = span.text().collect::<String>();
    let stamp = text.split('(').next()?.trim().to_string();

    NaiveDateTime::parse_from_str(&stamp, "%H:%M %d %b %Y").ok()
}

/// Extracts candidate articles from a tag index page
///
/// Candidates are the anchors under `#tagged-pages-list`. Each carries
/// only the first requested tag; callers must confirm full tag sets
/// against the articles themselves.
pub fn extract_tag_candidates(html: &str, base_url: &Url) -> Vec<ArticleLink> {
    let document = Html::parse_document(html);

    let candidate_selector = match Selector::parse("#tagged-pages-list a") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    let mut links = Vec::new();
    for anchor in document.select(&candidate_selector) {
        if let Some(href) = anchor.value().attr("href") {
            if let Ok(resolved) = base_url.join(href.trim()) {
                links.push(ArticleLink {
                    title: anchor.text().collect::<String>().trim().to_string(),
                    url: resolved.to_string(),
                });
            }
        }
    }

    links
}

/// Detaches every node matching the selector from the document tree
fn detach_all(document: &mut Html, selector: &Selector) {
    let ids: Vec<_> = document
        .select(selector)
        .map(|element| element.id())
        .collect();

    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Collects an element's text nodes, trimmed and space-joined
fn spaced_text(element: &ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

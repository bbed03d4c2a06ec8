//! HTML to Markdown extraction.
//!
//! The article body is located with `readability` and converted to Markdown
//! with `htmd`. When readability finds nothing usable, the largest
//! `<article>`, else `<main>`, `[role=main]` or `<body>` is converted
//! instead. Navigation chrome (`nav`, `header`, `footer`, `aside`, forms,
//! scripts) never reaches the output.
//!
//! Metadata (title and publication date) is read with `scraper` from meta
//! tags, JSON-LD and `<time>` elements.

use super::ContentExtractor;
use crate::models::PageMetadata;
use htmd::HtmlToMarkdown;
use htmd::options::{BulletListMarker, HeadingStyle, Options};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Elements dropped before conversion.
const SKIP_TAGS: &[&str] = &[
    "head", "script", "style", "noscript", "nav", "header", "footer", "aside", "form", "svg",
    "iframe", "button", "template", "select", "dialog", "img", "picture", "video", "audio",
];

/// Readability rewrites relative links against a base; pages are extracted
/// without knowing their URL, so links stay relative to this placeholder.
const PLACEHOLDER_BASE: &str = "https://localhost/";

const TITLE_META: &[&str] = &[
    r#"meta[property="og:title"]"#,
    r#"meta[name="twitter:title"]"#,
];

const DATE_META: &[&str] = &[
    r#"meta[property="article:published_time"]"#,
    r#"meta[name="article:published_time"]"#,
    r#"meta[property="og:published_time"]"#,
    r#"meta[itemprop="datePublished"]"#,
    r#"meta[name="date"]"#,
    r#"meta[name="pubdate"]"#,
    r#"meta[name="publish-date"]"#,
    r#"meta[name="publish_date"]"#,
    r#"meta[name="dc.date"]"#,
    r#"meta[name="DC.date.issued"]"#,
    r#"meta[name="sailthru.date"]"#,
];

struct Selectors {
    article: Selector,
    main: Selector,
    role_main: Selector,
    body: Selector,
    title: Selector,
    h1: Selector,
    ld_json: Selector,
    time: Selector,
    title_meta: Vec<Selector>,
    date_meta: Vec<Selector>,
}

static SELECTORS: Lazy<Selectors> = Lazy::new(|| {
    let parse = |s: &str| Selector::parse(s).unwrap();
    Selectors {
        article: parse("article"),
        main: parse("main"),
        role_main: parse(r#"[role="main"]"#),
        body: parse("body"),
        title: parse("title"),
        h1: parse("h1"),
        ld_json: parse(r#"script[type="application/ld+json"]"#),
        time: parse("time[datetime]"),
        title_meta: TITLE_META.iter().map(|s| parse(s)).collect(),
        date_meta: DATE_META.iter().map(|s| parse(s)).collect(),
    }
});

fn converter() -> HtmlToMarkdown {
    HtmlToMarkdown::builder()
        .skip_tags(SKIP_TAGS.to_vec())
        .options(Options {
            heading_style: HeadingStyle::Atx,
            bullet_list_marker: BulletListMarker::Dash,
            ..Default::default()
        })
        .build()
}

/// [`ContentExtractor`] producing Markdown from the page's main content.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadableExtractor;

impl ContentExtractor for ReadableExtractor {
    fn extract(&self, html: &str) -> Option<String> {
        if let Some(md) = readability_html(html).and_then(|content| to_markdown(&content)) {
            return Some(md);
        }
        debug!("Readability found nothing; converting the content root");

        let document = Html::parse_document(html);
        let root = content_root(&document);
        to_markdown(&root.html())
    }

    fn extract_metadata(&self, html: &str) -> PageMetadata {
        let document = Html::parse_document(html);
        let s = &*SELECTORS;

        let title = meta_content(&document, &s.title_meta)
            .or_else(|| first_text(&document, &s.title))
            .or_else(|| first_text(&document, &s.h1));

        let date = meta_content(&document, &s.date_meta)
            .or_else(|| json_ld_date(&document))
            .or_else(|| {
                document
                    .select(&s.time)
                    .filter_map(|t| t.value().attr("datetime"))
                    .map(str::trim)
                    .find(|d| !d.is_empty())
                    .map(str::to_string)
            });

        PageMetadata { title, date }
    }
}

/// HTML of the block readability scores as the article.
fn readability_html(html: &str) -> Option<String> {
    let base = Url::parse(PLACEHOLDER_BASE).ok()?;
    match readability::extractor::extract(&mut html.as_bytes(), &base) {
        Ok(product) if !product.text.trim().is_empty() => Some(product.content),
        Ok(_) => None,
        Err(e) => {
            debug!(error = ?e, "Readability failed");
            None
        }
    }
}

/// Convert an HTML fragment to Markdown; `None` when nothing readable is left.
///
/// # Arguments
///
/// * `html` - A document or fragment. Tags in [`SKIP_TAGS`] are dropped with
///   their content.
///
/// # Returns
///
/// Trimmed Markdown, or `None` for a blank result or a conversion error.
pub fn to_markdown(html: &str) -> Option<String> {
    match converter().convert(html) {
        Ok(md) => {
            let md = md.trim();
            (!md.is_empty()).then(|| md.to_string())
        }
        Err(e) => {
            debug!(error = %e, "Markdown conversion failed");
            None
        }
    }
}

fn content_root(document: &Html) -> ElementRef<'_> {
    let s = &*SELECTORS;
    let largest_article = document
        .select(&s.article)
        .map(|a| (text_of(a).len(), a))
        .filter(|(len, _)| *len > 0)
        .max_by_key(|(len, _)| *len)
        .map(|(_, a)| a);

    largest_article
        .or_else(|| document.select(&s.main).next())
        .or_else(|| document.select(&s.role_main).next())
        .or_else(|| document.select(&s.body).next())
        .unwrap_or_else(|| document.root_element())
}

fn meta_content(document: &Html, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|sel| {
        document
            .select(sel)
            .filter_map(|m| m.value().attr("content"))
            .map(str::trim)
            .find(|c| !c.is_empty())
            .map(str::to_string)
    })
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .map(text_of)
        .find(|t| !t.is_empty())
}

/// All descendant text, whitespace collapsed.
fn text_of(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn json_ld_date(document: &Html) -> Option<String> {
    document.select(&SELECTORS.ld_json).find_map(|script| {
        let raw = script.text().collect::<String>();
        let value: Value = serde_json::from_str(raw.trim()).ok()?;
        find_date_published(&value)
    })
}

fn find_date_published(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => match map.get("datePublished") {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => map.values().find_map(find_date_published),
        },
        Value::Array(items) => items.iter().find_map(find_date_published),
        _ => None,
    }
}

//! Keyword-scoring topic classifier.
//!
//! Every `(category, subcategory)` pair of the taxonomy is scored by the number
//! of non-overlapping, case-insensitive keyword occurrences in the article
//! text. The highest score wins; ties go to the pair declared first.

use crate::config::Taxonomy;
use tracing::debug;

pub const FALLBACK_CATEGORY: &str = "Uncategorized";
pub const FALLBACK_SUBCATEGORY: &str = "Misc";

/// The `(category, subcategory)` pair an article is filed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: String,
    pub subcategory: String,
}

impl Classification {
    pub fn new(category: impl Into<String>, subcategory: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            subcategory: subcategory.into(),
        }
    }

    pub fn fallback() -> Self {
        Self::new(FALLBACK_CATEGORY, FALLBACK_SUBCATEGORY)
    }

    /// `category/subcategory`, as written in the article header.
    pub fn label(&self) -> String {
        format!("{}/{}", self.category, self.subcategory)
    }
}

/// Sum of non-overlapping occurrences of each keyword in already-lowercased text.
fn score(text_lower: &str, keywords: &[String]) -> usize {
    keywords
        .iter()
        .map(|k| text_lower.matches(k.to_lowercase().as_str()).count())
        .sum()
}

/// Pick the best-scoring taxonomy leaf for `text`.
///
/// Every (category, subcategory) pair scores the total number of
/// non-overlapping, case-insensitive occurrences of its keywords. Pairs are
/// visited in declaration order and only a strictly higher score replaces the
/// current best, so the first declared pair wins ties.
///
/// # Arguments
///
/// * `taxonomy` - The ordered category tree from the configuration
/// * `text` - Extracted article body
///
/// # Returns
///
/// The winning pair, or `Uncategorized/Misc` when no keyword occurs at all.
///
/// # Examples
///
/// ```ignore
/// let c = classify(&Taxonomy::default(), "a large language model and gpt");
/// assert_eq!(c.label(), "Generative AI/LLMs");
/// ```
pub fn classify(taxonomy: &Taxonomy, text: &str) -> Classification {
    let lower = text.to_lowercase();
    let mut best: Option<(&str, &str, usize)> = None;

    for (category, subcategory, keywords) in taxonomy.triples() {
        let s = score(&lower, keywords);
        if s == 0 {
            continue;
        }
        // Strictly greater: an equal score never displaces an earlier pair.
        if best.is_none_or(|(_, _, top)| s > top) {
            best = Some((category, subcategory, s));
        }
    }

    match best {
        Some((category, subcategory, s)) => {
            debug!(%category, %subcategory, score = s, "Classified content");
            Classification::new(category, subcategory)
        }
        None => Classification::fallback(),
    }
}

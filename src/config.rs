//! Runtime configuration: paths, crawl limits, URL patterns and the topic taxonomy.
//!
//! A [`Config`] is built once in `main` (built-in defaults, optionally overlaid
//! with a YAML file) and handed by reference to every component. Nothing in
//! the crate reads configuration from global state.
//!
//! # YAML overlay
//!
//! Every key is optional; missing keys keep their default value.
//!
//! ```yaml
//! output_dir: /data/NotebookLM_Sources
//! min_year: 2023
//! max_pages_per_site: 20
//! taxonomy:
//!   - name: Generative AI
//!     subcategories:
//!       - name: LLMs
//!         keywords: [llm, gpt]
//! ```

use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

/// A leaf of the taxonomy: a named bucket and the keywords that score it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Subcategory {
    pub name: String,
    pub keywords: Vec<String>,
}

/// A top-level topic grouping ordered subcategories.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    pub name: String,
    pub subcategories: Vec<Subcategory>,
}

/// Ordered category tree. Declaration order is the classifier's tie-break order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Taxonomy {
    pub categories: Vec<Category>,
}

impl Taxonomy {
    /// Iterate `(category, subcategory, keywords)` triples in declaration order.
    pub fn triples(&self) -> impl Iterator<Item = (&str, &str, &[String])> {
        self.categories.iter().flat_map(|cat| {
            cat.subcategories
                .iter()
                .map(move |sub| (cat.name.as_str(), sub.name.as_str(), sub.keywords.as_slice()))
        })
    }
}

/// Delays and timeouts used while driving the page fetcher.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlTiming {
    pub base_timeout: Duration,
    pub candidate_timeout: Duration,
    pub settle: Duration,
    pub manual_settle: Duration,
    pub scroll_wait: Duration,
    pub max_scroll_rounds: usize,
    pub jitter_min: Duration,
    pub jitter_max: Duration,
    pub site_cooldown: Duration,
}

impl Default for CrawlTiming {
    fn default() -> Self {
        Self {
            base_timeout: Duration::from_secs(60),
            candidate_timeout: Duration::from_secs(30),
            settle: Duration::from_secs(3),
            manual_settle: Duration::from_secs(2),
            scroll_wait: Duration::from_millis(1500),
            max_scroll_rounds: 10,
            jitter_min: Duration::from_millis(1500),
            jitter_max: Duration::from_millis(3000),
            site_cooldown: Duration::from_secs(5),
        }
    }
}

impl CrawlTiming {
    /// No waiting at all. Timeouts are kept so fetchers still see a bound.
    #[cfg(test)]
    pub fn immediate() -> Self {
        Self {
            settle: Duration::ZERO,
            manual_settle: Duration::ZERO,
            scroll_wait: Duration::ZERO,
            jitter_min: Duration::ZERO,
            jitter_max: Duration::ZERO,
            site_cooldown: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Immutable process-wide settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub seed_file: PathBuf,
    pub output_dir: PathBuf,
    pub ledger_file: PathBuf,
    pub log_file: PathBuf,
    pub min_year: i32,
    pub max_pages_per_site: usize,
    pub min_content_chars: usize,
    /// Path fragments that mark a link as a plausible article.
    pub include_keywords: Vec<String>,
    /// Case-insensitive substrings that disqualify a discovered link.
    pub skip_patterns: Vec<String>,
    /// Filename fragments the noise auditor flags.
    pub noise_keywords: Vec<String>,
    /// Slugified-title fragments that reveal a listing page.
    pub noise_title_markers: Vec<String>,
    /// `URL:` header fragments the noise auditor flags.
    pub noise_url_markers: Vec<String>,
    pub taxonomy: Taxonomy,
    pub timing: CrawlTiming,
}

/// Error raised when a configuration violates the taxonomy invariants.
#[derive(Debug, PartialEq, Eq)]
pub struct ConfigError(pub String);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid configuration: {}", self.0)
    }
}

impl Error for ConfigError {}

/// YAML shape of a configuration overlay; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    seed_file: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    ledger_file: Option<PathBuf>,
    log_file: Option<PathBuf>,
    min_year: Option<i32>,
    max_pages_per_site: Option<usize>,
    min_content_chars: Option<usize>,
    include_keywords: Option<Vec<String>>,
    skip_patterns: Option<Vec<String>>,
    noise_keywords: Option<Vec<String>>,
    noise_title_markers: Option<Vec<String>>,
    noise_url_markers: Option<Vec<String>>,
    taxonomy: Option<Taxonomy>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn sub(name: &str, keywords: &[&str]) -> Subcategory {
    Subcategory {
        name: name.to_string(),
        keywords: strings(keywords),
    }
}

fn cat(name: &str, subcategories: Vec<Subcategory>) -> Category {
    Category {
        name: name.to_string(),
        subcategories,
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Taxonomy {
            categories: vec![
                cat(
                    "Generative AI",
                    vec![
                        sub(
                            "LLMs",
                            &[
                                "llm",
                                "large language model",
                                "gpt",
                                "gemini",
                                "claude",
                                "llama",
                                "chatgpt",
                                "bard",
                                "mistral",
                            ],
                        ),
                        sub(
                            "RAG",
                            &[
                                "rag",
                                "retrieval augmented",
                                "vector database",
                                "embedding",
                                "context window",
                            ],
                        ),
                        sub(
                            "Computer Vision",
                            &[
                                "diffusion model",
                                "image generation",
                                "video generation",
                                "midjourney",
                                "dall-e",
                                "stable diffusion",
                            ],
                        ),
                        sub(
                            "Audio",
                            &["text-to-speech", "audio generation", "musicgen", "whisper"],
                        ),
                    ],
                ),
                cat(
                    "Infrastructure",
                    vec![
                        sub(
                            "Hardware",
                            &["gpu", "tpu", "h100", "accelerator", "nvidia", "cuda", "inference"],
                        ),
                        sub(
                            "MLOps",
                            &[
                                "mlops",
                                "pipeline",
                                "serving",
                                "deployment",
                                "monitoring",
                                "kubernetes",
                                "docker",
                            ],
                        ),
                    ],
                ),
                cat(
                    "Deep Learning",
                    vec![
                        sub(
                            "Theory",
                            &[
                                "transformer",
                                "attention mechanism",
                                "loss function",
                                "optimization",
                                "backpropagation",
                                "neural network",
                            ],
                        ),
                        sub(
                            "Reinforcement Learning",
                            &["rlhf", "ppo", "q-learning", "agent", "reinforcement learning"],
                        ),
                    ],
                ),
                cat(
                    "Agentic AI",
                    vec![
                        sub(
                            "Agents",
                            &[
                                "autonomous agent",
                                "agentic",
                                "auto-gpt",
                                "babyagi",
                                "crewai",
                                "langgraph",
                                "autogen",
                                "agent framework",
                            ],
                        ),
                        sub(
                            "Tools",
                            &["tool use", "function calling", "mcp", "model context protocol"],
                        ),
                    ],
                ),
                cat(
                    "Robotics",
                    vec![sub(
                        "Physical AI",
                        &[
                            "robotics",
                            "humanoid",
                            "optimus",
                            "figure",
                            "boston dynamics",
                            "physical ai",
                            "embodied ai",
                            "manipulation",
                        ],
                    )],
                ),
                cat(
                    "General_AI_News",
                    vec![sub(
                        "News",
                        &["startup", "funding", "regulation", "policy", "ethics", "announcement"],
                    )],
                ),
            ],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed_file: PathBuf::from("urls.txt"),
            output_dir: PathBuf::from("NotebookLM_Sources"),
            ledger_file: PathBuf::from("processed_urls.log"),
            log_file: PathBuf::from("crawler.log"),
            min_year: 2022,
            max_pages_per_site: 50,
            min_content_chars: 500,
            include_keywords: strings(&[
                "/blog/",
                "/research/",
                "/engineering/",
                "/white-paper/",
                "/news/",
                "/post/",
                "/publications/",
                "/articles/",
            ]),
            skip_patterns: strings(&[
                "twitter.com",
                "facebook.com",
                "linkedin.com",
                "reddit.com",
                "/share",
                "/intent/tweet",
                "/login",
                "/signup",
                ".xml",
                "/rss",
                "/label/",
                "/page/",
                "/category/",
                "/tag/",
                "/author/",
                "/archives/",
                "javascript:",
                "void(0)",
                "google.com/search",
                "google.com/url",
            ]),
            noise_keywords: strings(&[
                "latest_news",
                "search_result",
                "label_",
                "page_",
                "tag_",
                "category_",
                "author_",
                "archive",
                "facebook",
                "twitter",
                "linkedin",
                "reddit",
                "signup",
                "login",
                "rss_xml",
                "javascript",
                "void_0",
                "uncategorized_misc",
                "newsletter",
            ]),
            noise_title_markers: strings(&["latest_news", "search_result", "index_of"]),
            noise_url_markers: strings(&["/label/", "/tag/", "/category/", "/page/", "share="]),
            taxonomy: Taxonomy::default(),
            timing: CrawlTiming::default(),
        }
    }
}

impl Config {
    /// Build the default configuration overlaid with the YAML file at `path`.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&raw)?;
        info!(
            categories = config.taxonomy.categories.len(),
            "Loaded configuration overlay"
        );
        Ok(config)
    }

    /// Parse a YAML overlay on top of [`Config::default`] and validate the result.
    pub fn from_yaml(raw: &str) -> Result<Self, Box<dyn Error>> {
        let file: ConfigFile = if raw.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(raw)?
        };
        let base = Config::default();
        let config = Config {
            seed_file: file.seed_file.unwrap_or(base.seed_file),
            output_dir: file.output_dir.unwrap_or(base.output_dir),
            ledger_file: file.ledger_file.unwrap_or(base.ledger_file),
            log_file: file.log_file.unwrap_or(base.log_file),
            min_year: file.min_year.unwrap_or(base.min_year),
            max_pages_per_site: file.max_pages_per_site.unwrap_or(base.max_pages_per_site),
            min_content_chars: file.min_content_chars.unwrap_or(base.min_content_chars),
            include_keywords: file.include_keywords.unwrap_or(base.include_keywords),
            skip_patterns: file.skip_patterns.unwrap_or(base.skip_patterns),
            noise_keywords: file.noise_keywords.unwrap_or(base.noise_keywords),
            noise_title_markers: file.noise_title_markers.unwrap_or(base.noise_title_markers),
            noise_url_markers: file.noise_url_markers.unwrap_or(base.noise_url_markers),
            taxonomy: file.taxonomy.unwrap_or(base.taxonomy),
            timing: base.timing,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the taxonomy invariants: every subcategory has keywords, none empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.taxonomy.categories.is_empty() {
            return Err(ConfigError("taxonomy has no categories".into()));
        }
        for category in &self.taxonomy.categories {
            if category.subcategories.is_empty() {
                return Err(ConfigError(format!(
                    "category '{}' has no subcategories",
                    category.name
                )));
            }
        }
        for (category, subcategory, keywords) in self.taxonomy.triples() {
            if keywords.is_empty() {
                return Err(ConfigError(format!(
                    "{category}/{subcategory} has no keywords"
                )));
            }
            if keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(ConfigError(format!(
                    "{category}/{subcategory} has an empty keyword"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_year, 2022);
        assert_eq!(config.max_pages_per_site, 50);
        assert_eq!(config.taxonomy.categories.len(), 6);
        assert_eq!(config.taxonomy.triples().count(), 12);
    }

    #[test]
    fn test_triples_follow_declaration_order() {
        let taxonomy = Taxonomy::default();
        let first: Vec<(&str, &str)> = taxonomy.triples().map(|(c, s, _)| (c, s)).take(3).collect();
        assert_eq!(
            first,
            vec![
                ("Generative AI", "LLMs"),
                ("Generative AI", "RAG"),
                ("Generative AI", "Computer Vision"),
            ]
        );
    }

    #[test]
    fn test_yaml_overlay_keeps_defaults() {
        let config = Config::from_yaml("min_year: 2024\nmax_pages_per_site: 5\n").unwrap();
        assert_eq!(config.min_year, 2024);
        assert_eq!(config.max_pages_per_site, 5);
        assert_eq!(config.output_dir, PathBuf::from("NotebookLM_Sources"));
        assert_eq!(config.taxonomy, Taxonomy::default());
    }

    #[test]
    fn test_yaml_taxonomy_override() {
        let yaml = r#"
taxonomy:
  - name: Security
    subcategories:
      - name: Malware
        keywords: [ransomware, trojan]
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.taxonomy.categories.len(), 1);
        assert_eq!(config.taxonomy.categories[0].subcategories[0].keywords.len(), 2);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = Config::from_yaml("").unwrap();
        assert_eq!(config.min_content_chars, 500);
    }

    #[test]
    fn test_rejects_empty_keyword() {
        let yaml = r#"
taxonomy:
  - name: Security
    subcategories:
      - name: Malware
        keywords: ["", trojan]
"#;
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_rejects_subcategory_without_keywords() {
        let mut config = Config::default();
        config.taxonomy.categories[0].subcategories[0].keywords.clear();
        let err = config.validate().unwrap_err();
        assert!(err.0.contains("Generative AI/LLMs"));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(Config::from_yaml("max_pages: 3\n").is_err());
    }
}

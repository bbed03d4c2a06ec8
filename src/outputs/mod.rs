//! Article files on disk.
//!
//! Every ingested article becomes one Markdown file whose location and
//! header encode its identity:
//!
//! ```text
//! output_dir/
//! └── Generative AI/
//!     └── LLMs/
//!         ├── 2024/
//!         │   └── 2024-01-05_example_llm_update.md
//!         └── Undated/
//!             └── Undated_openai_some_post.md
//! ```
//!
//! # Submodules
//!
//! - [`article`]: Rendering, path layout and writing of article files
//! - [`scan`]: Walking existing output and reading back the `URL:` header

pub mod article;
pub mod scan;

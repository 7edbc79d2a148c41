//! # edgequake-segment
//!
//! Turn page-level text extracted from technical-analysis books into a
//! stream of structured knowledge entries.
//!
//! ## Why this crate?
//!
//! PDF text extraction gives you lines, not knowledge. Headings, captions,
//! copyright footers and half-sentences come out interleaved with the
//! paragraphs that matter. This crate walks the lines once, in order, keeping
//! track of the current chapter and section, throwing away boilerplate, typing
//! each surviving paragraph, and gluing figure captions to the paragraph that
//! explains them. The output is newline-delimited JSON ready for a downstream
//! extraction or retrieval step.
//!
//! ## Pipeline Overview
//!
//! ```text
//! pages (JSON / JSONL / form-feed text)
//!  │
//!  ├─ 1. Input      load from a path or URL
//!  ├─ 2. Normalize  strip invisible chars, optional line joining
//!  ├─ 3. Context    consume chapter and section headings
//!  ├─ 4. Validity   length, keyword, blocklist, sub-heading checks
//!  ├─ 5. Classify   definition / trading logic / caption / term / explanation
//!  ├─ 6. Merge      caption + following paragraph
//!  └─ 7. Window     previous two entries attached as context
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_segment::{segment, SegmentConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SegmentConfig::default();
//!     let output = segment("book_pages.json", &config).await?;
//!     for entry in &output.entries {
//!         println!("p{} [{:?}] {}", entry.page, entry.entry_type, entry.full_text());
//!     }
//!     eprintln!("{} entries, {} merged", output.stats.entries(), output.stats.merged_entries);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfseg` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-segment = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{BookPreset, PageSelection, SegmentConfig, SegmentConfigBuilder};
pub use convert::{inspect, segment, segment_pages, segment_sync, segment_to_file};
pub use engine::Segmenter;
pub use error::{LineError, SegmentError};
pub use output::{
    write_jsonl, EntryType, InputSummary, OutputFormat, SegmentationOutput, SegmentationStats,
    StructuredEntry,
};
pub use pipeline::input::{Page, RawLine};
pub use progress::{NoopProgressCallback, ProgressCallback, SegmentProgressCallback};
pub use prompts::build_extraction_prompt;
pub use stream::{segment_input_stream, segment_stream, EntryStream};

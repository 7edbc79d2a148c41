//! Pipeline stages for page-text segmentation.
//!
//! Each submodule implements one step and is testable on its own; the
//! [`crate::engine::Segmenter`] wires them together in a single pass.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ normalize ──▶ context ──▶ validity ──▶ classify ──▶ merge ──▶ window
//! (pages)   (clean/join)  (headings)  (gate)       (type)       (captions) (prev 2)
//! ```
//!
//! 1. [`input`]: load a JSON, JSONL or form-feed text document from a path or URL
//! 2. [`normalize`]: strip invisible characters, trim, optionally join short lines
//! 3. [`context`]: consume chapter and section headings as running labels
//! 4. [`validity`]: reject boilerplate, fragments and off-topic paragraphs
//! 5. [`classify`]: assign exactly one entry type by ordered rules
//! 6. [`merge`]: hold a figure caption until its continuation arrives
//! 7. [`window`]: attach the two previous finalised texts to standalone entries

pub mod classify;
pub mod context;
pub mod input;
pub mod merge;
pub mod normalize;
pub mod validity;
pub mod window;

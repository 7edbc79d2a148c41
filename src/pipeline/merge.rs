//! One-slot figure-caption merge buffer.
//!
//! A caption line on its own says little ("图6.57 头肩顶示例"); the paragraph
//! after it usually explains the figure. The buffer holds the most recent
//! caption until the next non-caption paragraph arrives, then fuses the two
//! into a single entry.
//!
//! ```text
//!            caption                       caption (replaces, old one lost)
//!   Empty ───────────▶ Holding ◀──────────┐
//!     ▲                   │  └────────────┘
//!     │   other paragraph │  (merge and finalise)
//!     └───────────────────┘
//! ```
//!
//! At end of stream a held caption is discarded.

use crate::output::StructuredEntry;
use crate::pipeline::context::ContextSnapshot;

/// A caption waiting for its continuation paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCaption {
    pub text: String,
    pub figure_ref: Option<String>,
    /// Page where the caption itself appeared.
    pub page: usize,
}

impl PendingCaption {
    /// Fuse the caption with its continuation.
    ///
    /// Page, chapter and section are those of the continuation line, not of
    /// the caption. The context window is always empty and the entry carries
    /// no discrete type.
    pub fn merge(
        self,
        continuation: &str,
        page: usize,
        context: ContextSnapshot,
        source: &str,
    ) -> StructuredEntry {
        let text_full = format!("{} {}", self.text, continuation);
        StructuredEntry {
            text: self.text,
            text_full: Some(text_full),
            page,
            chapter: context.chapter,
            section_title: context.section,
            figure_ref: self.figure_ref,
            entry_type: None,
            context_window: Vec::new(),
            from_figure_merge: true,
            source: source.to_string(),
        }
    }
}

/// The buffer itself; capacity is exactly one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MergeBuffer {
    #[default]
    Empty,
    Holding(PendingCaption),
}

impl MergeBuffer {
    /// Store `caption`, returning the caption it displaced, if any.
    pub fn hold(&mut self, caption: PendingCaption) -> Option<PendingCaption> {
        match std::mem::replace(self, MergeBuffer::Holding(caption)) {
            MergeBuffer::Empty => None,
            MergeBuffer::Holding(previous) => Some(previous),
        }
    }

    /// Remove and return the held caption, leaving the buffer empty.
    pub fn take(&mut self) -> Option<PendingCaption> {
        match std::mem::take(self) {
            MergeBuffer::Empty => None,
            MergeBuffer::Holding(caption) => Some(caption),
        }
    }

    pub fn is_holding(&self) -> bool {
        matches!(self, MergeBuffer::Holding(_))
    }

    pub fn pending(&self) -> Option<&PendingCaption> {
        match self {
            MergeBuffer::Empty => None,
            MergeBuffer::Holding(caption) => Some(caption),
        }
    }
}

//! Chapter and section tracking.
//!
//! Headings are consumed for context only: they update the running chapter
//! or section label and never become entries themselves. Every finalised
//! entry reads the labels as they stand at finalisation time.

use crate::config::SegmentConfig;
use crate::error::SegmentError;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Sentence punctuation; a line containing any of it is prose, not a heading.
static RE_SENTENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[，。！？；,;!?]|\.\s*$").unwrap());

/// Running chapter/section state for one document.
#[derive(Debug, Clone)]
pub struct ContextTracker {
    chapter_patterns: Vec<Regex>,
    section_keywords: Vec<String>,
    section_max_len: usize,
    current_chapter: Option<String>,
    current_section: Option<String>,
}

/// Chapter and section labels at one point in the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextSnapshot {
    pub chapter: Option<String>,
    pub section: Option<String>,
}

impl ContextTracker {
    pub fn from_config(config: &SegmentConfig) -> Result<Self, SegmentError> {
        let chapter_patterns = config
            .chapter_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    SegmentError::InvalidConfig(format!("chapter pattern '{p}': {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            chapter_patterns,
            section_keywords: config
                .section_keywords
                .iter()
                .filter(|k| !k.is_empty())
                .cloned()
                .collect(),
            section_max_len: config.section_max_len,
            current_chapter: None,
            current_section: None,
        })
    }

    /// If `line` is a chapter heading, make it the current chapter and return it.
    ///
    /// The whole trimmed line becomes the label, so `第一章 概述` keeps its title.
    pub fn try_match_chapter(&mut self, line: &str) -> Option<&str> {
        let line = line.trim();
        if !self.chapter_patterns.iter().any(|re| re.is_match(line)) {
            return None;
        }
        debug!("Chapter: {}", line);
        self.current_chapter = Some(line.to_string());
        self.current_chapter.as_deref()
    }

    /// If `line` is a section heading, make it the current section and return it.
    ///
    /// A section heading is short, mentions a section keyword and does not
    /// read as a sentence.
    pub fn try_match_section(&mut self, line: &str) -> Option<&str> {
        let line = line.trim();
        if line.is_empty()
            || line.chars().count() > self.section_max_len
            || !self.section_keywords.iter().any(|k| line.contains(k.as_str()))
            || RE_SENTENCE.is_match(line)
        {
            return None;
        }
        debug!("Section: {}", line);
        self.current_section = Some(line.to_string());
        self.current_section.as_deref()
    }

    pub fn chapter(&self) -> Option<&str> {
        self.current_chapter.as_deref()
    }

    pub fn section(&self) -> Option<&str> {
        self.current_section.as_deref()
    }

    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            chapter: self.current_chapter.clone(),
            section: self.current_section.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> ContextTracker {
        ContextTracker::from_config(&SegmentConfig::default()).unwrap()
    }

    #[test]
    fn chinese_chapter_keeps_full_line() {
        let mut t = tracker();
        assert_eq!(t.try_match_chapter("  第一章 概述 "), Some("第一章 概述"));
        assert_eq!(t.chapter(), Some("第一章 概述"));
        assert_eq!(t.try_match_chapter("第十二章"), Some("第十二章"));
    }

    #[test]
    fn chapter_needs_boundary_after_marker() {
        let mut t = tracker();
        assert_eq!(t.try_match_chapter("第一章节的内容"), None);
        assert_eq!(t.try_match_chapter("见第一章 概述"), None);
        assert_eq!(t.chapter(), None);
    }

    #[test]
    fn english_chapter() {
        let mut t = tracker();
        assert!(t.try_match_chapter("CHAPTER 7 Reversal Patterns").is_some());
        assert!(t.try_match_chapter("Chapter 12").is_some());
        assert!(t.try_match_chapter("Chapters ahead").is_none());
    }

    #[test]
    fn short_keyword_line_is_section() {
        let mut t = tracker();
        assert_eq!(t.try_match_section("头肩顶形态"), Some("头肩顶形态"));
        assert_eq!(t.section(), Some("头肩顶形态"));
    }

    #[test]
    fn sentence_is_not_section() {
        let mut t = tracker();
        assert_eq!(
            t.try_match_section("头肩顶是一种看跌反转形态，常见于趋势顶部区域。"),
            None
        );
        assert_eq!(t.section(), None);
    }

    #[test]
    fn long_or_keywordless_line_is_not_section() {
        let mut t = tracker();
        let long = "形态".repeat(30);
        assert_eq!(t.try_match_section(&long), None);
        assert_eq!(t.try_match_section("市场概述"), None);
    }

    #[test]
    fn snapshot_reflects_latest_headings() {
        let mut t = tracker();
        t.try_match_chapter("第二章 反转");
        t.try_match_section("锤子线形态");
        t.try_match_section("吞没形态");
        assert_eq!(
            t.snapshot(),
            ContextSnapshot {
                chapter: Some("第二章 反转".into()),
                section: Some("吞没形态".into()),
            }
        );
    }
}

//! Validity filter: the gatekeeper between headings and classification.
//!
//! A pure predicate over `(text, keywords, bounds, blocklist, min_tokens)`.
//! It is the main recall/precision knob of the whole pipeline, so it is
//! constructed independently of the engine and can be tuned or tested on its
//! own.

use crate::config::SegmentConfig;
use crate::error::SegmentError;
use regex::Regex;
use std::fmt;

/// Why a paragraph was rejected. Checks run in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Character count outside `[min_len, max_len]`.
    Length,
    /// None of the domain keywords occurs.
    NoKeyword,
    /// Boilerplate pattern matched.
    Blocklisted,
    /// Ends with a colon, or too few tokens: a sub-heading, not a sentence.
    Subheading,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Rejection::Length => "length out of bounds",
            Rejection::NoKeyword => "no domain keyword",
            Rejection::Blocklisted => "blocklisted",
            Rejection::Subheading => "sub-heading",
        })
    }
}

#[derive(Debug, Clone)]
pub struct ValidityFilter {
    keywords: Vec<String>,
    blocklist: Option<Regex>,
    min_len: usize,
    max_len: usize,
    min_tokens: usize,
}

impl ValidityFilter {
    /// Build a filter. An empty `blocklist` pattern disables that check.
    pub fn new<I, S>(
        keywords: I,
        blocklist: &str,
        (min_len, max_len): (usize, usize),
        min_tokens: usize,
    ) -> Result<Self, SegmentError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(Into::into)
            .filter(|k: &String| !k.trim().is_empty())
            .collect();
        if keywords.is_empty() {
            return Err(SegmentError::InvalidConfig(
                "validity filter needs at least one keyword".into(),
            ));
        }
        if min_len > max_len {
            return Err(SegmentError::InvalidConfig(format!(
                "length bounds ({min_len}, {max_len}) are inverted"
            )));
        }

        let blocklist = if blocklist.trim().is_empty() {
            None
        } else {
            Some(Regex::new(blocklist).map_err(|e| {
                SegmentError::InvalidConfig(format!("blocklist pattern: {e}"))
            })?)
        };

        Ok(Self {
            keywords,
            blocklist,
            min_len,
            max_len,
            min_tokens,
        })
    }

    pub fn from_config(config: &SegmentConfig) -> Result<Self, SegmentError> {
        Self::new(
            config.keywords.iter().cloned(),
            &config.blocklist_pattern,
            (config.min_len, config.max_len),
            config.min_tokens,
        )
    }

    /// Check `text`, returning the first failed rule.
    pub fn check(&self, text: &str) -> Result<(), Rejection> {
        let len = text.chars().count();
        if len < self.min_len || len > self.max_len {
            return Err(Rejection::Length);
        }
        if !self.keywords.iter().any(|k| text.contains(k.as_str())) {
            return Err(Rejection::NoKeyword);
        }
        if self.blocklist.as_ref().is_some_and(|re| re.is_match(text)) {
            return Err(Rejection::Blocklisted);
        }
        if text.ends_with('：') || text.ends_with(':') || text.split_whitespace().count() < self.min_tokens
        {
            return Err(Rejection::Subheading);
        }
        Ok(())
    }

    pub fn is_valid(&self, text: &str) -> bool {
        self.check(text).is_ok()
    }
}

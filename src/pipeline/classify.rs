//! Entry classification by ordered, first-match-wins rules.
//!
//! ## Rule Order
//!
//! 1. [`Rule::Definition`]: definitional copula followed by a category noun
//! 2. [`Rule::TradingLogic`]: any action keyword (buy, sell, signal, …)
//! 3. [`Rule::FigureCaption`]: a figure number such as `图6.57` or `Figure 3`
//! 4. [`Rule::Term`]: short text with a structural keyword
//!
//! Anything else is [`EntryType::Explanation`]. The order is policy: a
//! sentence that defines a pattern *and* mentions a figure is a definition,
//! and a caption that mentions a buy signal is trading logic.

use crate::config::SegmentConfig;
use crate::error::SegmentError;
use crate::output::EntryType;
use regex::Regex;

/// Finds figure-number tokens: a marker word followed by a numeral with an
/// optional sub-index (`图6.57`, `图 3-2`, `Figure 12`).
#[derive(Debug, Clone)]
pub struct FigureExtractor {
    pattern: Regex,
}

impl FigureExtractor {
    pub fn new<S: AsRef<str>>(markers: &[S]) -> Result<Self, SegmentError> {
        let alternatives: Vec<String> = markers
            .iter()
            .map(|m| m.as_ref().trim())
            .filter(|m| !m.is_empty())
            .map(|m| {
                let escaped = regex::escape(m);
                // ASCII words need a boundary so "configure 3" is not a figure.
                if m.starts_with(|c: char| c.is_ascii_alphanumeric()) {
                    format!(r"\b{escaped}")
                } else {
                    escaped
                }
            })
            .collect();

        if alternatives.is_empty() {
            return Err(SegmentError::InvalidConfig(
                "at least one figure marker is required".into(),
            ));
        }

        let pattern = Regex::new(&format!(
            r"(?i)(?:{})\s*\d+(?:[.\-]\d+)?",
            alternatives.join("|")
        ))
        .map_err(|e| SegmentError::InvalidConfig(format!("figure markers: {e}")))?;

        Ok(Self { pattern })
    }

    /// The first figure reference in `text`, if any.
    pub fn extract(&self, text: &str) -> Option<String> {
        self.pattern.find(text).map(|m| m.as_str().to_string())
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// One classification rule.
#[derive(Debug, Clone)]
pub enum Rule {
    Definition(Regex),
    TradingLogic(Vec<String>),
    FigureCaption(FigureExtractor),
    Term { max_len: usize, keywords: Vec<String> },
}

impl Rule {
    /// The type assigned when this rule matches.
    pub fn entry_type(&self) -> EntryType {
        match self {
            Rule::Definition(_) => EntryType::Definition,
            Rule::TradingLogic(_) => EntryType::TradingLogic,
            Rule::FigureCaption(_) => EntryType::FigureCaption,
            Rule::Term { .. } => EntryType::Term,
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        match self {
            Rule::Definition(re) => re.is_match(text),
            Rule::TradingLogic(keywords) => contains_any(text, keywords),
            Rule::FigureCaption(figures) => figures.is_match(text),
            Rule::Term { max_len, keywords } => {
                text.chars().count() <= *max_len && contains_any(text, keywords)
            }
        }
    }
}

fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords
        .iter()
        .any(|k| !k.is_empty() && text.contains(k.as_str()))
}

/// Ordered rule table plus the shared figure extractor.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<Rule>,
    figures: FigureExtractor,
}

impl Classifier {
    pub fn from_config(config: &SegmentConfig) -> Result<Self, SegmentError> {
        let definition = Regex::new(&config.definition_pattern)
            .map_err(|e| SegmentError::InvalidConfig(format!("definition pattern: {e}")))?;
        let figures = FigureExtractor::new(config.figure_markers.as_slice())?;

        Ok(Self {
            rules: vec![
                Rule::Definition(definition),
                Rule::TradingLogic(config.action_keywords.clone()),
                Rule::FigureCaption(figures.clone()),
                Rule::Term {
                    max_len: config.term_max_len,
                    keywords: config.term_keywords.clone(),
                },
            ],
            figures,
        })
    }

    /// Assign exactly one type: the first matching rule, else Explanation.
    pub fn classify(&self, text: &str) -> EntryType {
        self.rules
            .iter()
            .find(|rule| rule.matches(text))
            .map(Rule::entry_type)
            .unwrap_or(EntryType::Explanation)
    }

    /// Figure reference for `figure_ref`, independent of the resolved type.
    pub fn extract_figure(&self, text: &str) -> Option<String> {
        self.figures.extract(text)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

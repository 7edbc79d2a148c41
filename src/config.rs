//! Configuration types for segmentation runs.
//!
//! All engine behaviour is controlled through [`SegmentConfig`], built via its
//! [`SegmentConfigBuilder`] or loaded from a profile file. The engine itself is
//! book-agnostic: everything that differs from one source document to the next
//! (keyword sets, length bounds, boilerplate patterns, heading conventions)
//! lives here.
//!
//! Validation happens in [`SegmentConfigBuilder::build`] and
//! [`SegmentConfig::validate`], so a bad regex or inverted length bounds fails
//! before a single line is processed.

use crate::error::SegmentError;
use crate::pipeline::{classify::Classifier, context::ContextTracker, validity::ValidityFilter};
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Configuration for one segmentation run.
///
/// # Example
/// ```rust
/// use edgequake_segment::{BookPreset, SegmentConfig};
///
/// let config = SegmentConfig::builder()
///     .preset(BookPreset::MarketAnalysis)
///     .length_bounds(20, 350)
///     .source("market-analysis")
///     .build()
///     .unwrap();
/// assert_eq!(config.min_len, 20);
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Domain keywords; a paragraph must contain at least one to be kept.
    pub keywords: Vec<String>,

    /// Boilerplate regex (copyright notices, QR prompts, URLs, publisher
    /// credits). A matching paragraph is dropped. Empty disables the check.
    pub blocklist_pattern: String,

    /// Minimum paragraph length in characters, inclusive. Default: 15.
    pub min_len: usize,

    /// Maximum paragraph length in characters, inclusive. Default: 500.
    pub max_len: usize,

    /// Minimum number of whitespace-separated tokens. Default: 1.
    ///
    /// CJK text carries no spaces between words, so anything above 1 rejects
    /// nearly every Chinese sentence. Raise it for space-delimited languages.
    pub min_tokens: usize,

    /// Provenance label copied onto every entry.
    pub source: String,

    /// Chapter heading regexes, tried in order.
    pub chapter_patterns: Vec<String>,

    /// Keywords marking a short line as a section heading.
    pub section_keywords: Vec<String>,

    /// Longest line (in characters) still considered a section heading. Default: 50.
    pub section_max_len: usize,

    /// Keywords marking a paragraph as trading logic.
    pub action_keywords: Vec<String>,

    /// Regex recognising a definitional sentence.
    pub definition_pattern: String,

    /// Words that introduce a figure number (`图`, `Figure`, …).
    pub figure_markers: Vec<String>,

    /// Structural keywords for short term entries.
    pub term_keywords: Vec<String>,

    /// Longest paragraph (in characters) still classified as a term. Default: 60.
    pub term_max_len: usize,

    /// Join consecutive lines of a page into paragraphs of at least this many
    /// characters before processing. Default: None (one line = one paragraph).
    pub join_lines: Option<usize>,

    /// Page selection. Default: all pages.
    pub pages: PageSelection,

    /// HTTP timeout when the input is a URL, in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional progress callback, invoked at page boundaries.
    #[serde(skip)]
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        BookPreset::Candlestick.config()
    }
}

impl fmt::Debug for SegmentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentConfig")
            .field("keywords", &self.keywords.len())
            .field("blocklist_pattern", &self.blocklist_pattern)
            .field("min_len", &self.min_len)
            .field("max_len", &self.max_len)
            .field("min_tokens", &self.min_tokens)
            .field("source", &self.source)
            .field("chapter_patterns", &self.chapter_patterns)
            .field("section_max_len", &self.section_max_len)
            .field("term_max_len", &self.term_max_len)
            .field("join_lines", &self.join_lines)
            .field("pages", &self.pages)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn SegmentProgressCallback>"),
            )
            .finish()
    }
}

impl SegmentConfig {
    /// Create a new builder starting from the default (candlestick) preset.
    pub fn builder() -> SegmentConfigBuilder {
        SegmentConfigBuilder {
            config: Self::default(),
        }
    }

    /// Load a profile from a `.toml` or `.json` file and validate it.
    ///
    /// Fields missing from the file keep their default values.
    pub fn from_profile_file(path: impl AsRef<Path>) -> Result<Self, SegmentError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| SegmentError::ProfileLoadFailed {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let config: SegmentConfig = if is_json {
            serde_json::from_str(&contents).map_err(|e| SegmentError::ProfileLoadFailed {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?
        } else {
            toml::from_str(&contents).map_err(|e| SegmentError::ProfileLoadFailed {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?
        };

        config.validate()?;
        Ok(config)
    }

    /// Check every constraint, compiling each regex once.
    pub fn validate(&self) -> Result<(), SegmentError> {
        if self.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(SegmentError::InvalidConfig(
                "keyword set must contain at least one non-empty keyword".into(),
            ));
        }
        if self.max_len == 0 || self.min_len > self.max_len {
            return Err(SegmentError::InvalidConfig(format!(
                "length bounds must satisfy 0 ≤ min ≤ max, max > 0; got ({}, {})",
                self.min_len, self.max_len
            )));
        }
        if self.figure_markers.iter().all(|m| m.trim().is_empty()) {
            return Err(SegmentError::InvalidConfig(
                "at least one figure marker is required".into(),
            ));
        }
        if self.join_lines == Some(0) {
            return Err(SegmentError::InvalidConfig(
                "join_lines must be ≥ 1 when set".into(),
            ));
        }
        if self.source.trim().is_empty() {
            return Err(SegmentError::InvalidConfig(
                "source label must not be empty".into(),
            ));
        }

        ValidityFilter::from_config(self)?;
        ContextTracker::from_config(self)?;
        Classifier::from_config(self)?;
        Ok(())
    }
}

/// Builder for [`SegmentConfig`].
#[derive(Debug)]
pub struct SegmentConfigBuilder {
    config: SegmentConfig,
}

/// Start a builder from an existing configuration, e.g. a loaded profile.
impl From<SegmentConfig> for SegmentConfigBuilder {
    fn from(config: SegmentConfig) -> Self {
        Self { config }
    }
}

impl SegmentConfigBuilder {
    /// Replace every keyword table with a built-in book preset.
    ///
    /// Call this first: later setters override individual fields.
    pub fn preset(mut self, preset: BookPreset) -> Self {
        let callback = self.config.progress_callback.take();
        self.config = preset.config();
        self.config.progress_callback = callback;
        self
    }

    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn blocklist_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.blocklist_pattern = pattern.into();
        self
    }

    pub fn length_bounds(mut self, min_len: usize, max_len: usize) -> Self {
        self.config.min_len = min_len;
        self.config.max_len = max_len;
        self
    }

    pub fn min_len(mut self, n: usize) -> Self {
        self.config.min_len = n;
        self
    }

    pub fn max_len(mut self, n: usize) -> Self {
        self.config.max_len = n;
        self
    }

    pub fn min_tokens(mut self, n: usize) -> Self {
        self.config.min_tokens = n;
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.config.source = source.into();
        self
    }

    pub fn chapter_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.chapter_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn section_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.section_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn section_max_len(mut self, n: usize) -> Self {
        self.config.section_max_len = n;
        self
    }

    pub fn action_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.action_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn definition_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.definition_pattern = pattern.into();
        self
    }

    pub fn figure_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.figure_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    pub fn term_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.term_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn term_max_len(mut self, n: usize) -> Self {
        self.config.term_max_len = n;
        self
    }

    pub fn join_lines(mut self, min_chars: Option<usize>) -> Self {
        self.config.join_lines = min_chars;
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.config.progress_callback = Some(callback);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SegmentConfig, SegmentError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// ── Presets ──────────────────────────────────────────────────────────────

/// Built-in keyword tables for the technical-analysis books the tool was
/// first tuned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BookPreset {
    /// Japanese candlestick charting. (default)
    #[default]
    Candlestick,
    /// Technical analysis of the financial markets.
    MarketAnalysis,
}

const CANDLESTICK_KEYWORDS: &[&str] = &[
    "K线", "形态", "信号", "指标", "均线", "移动平均线", "反转", "突破", "支撑", "阻力", "成交量",
    "买入", "卖出", "头肩顶", "头肩底", "锤子线", "吞没形态", "黄昏星", "早晨星", "十字星", "跳空",
    "缺口", "MACD", "RSI", "布林带", "CCI", "SAR", "OBV", "DMI", "ATR", "实体", "影线", "顶部",
    "底部", "趋势", "上涨", "下跌",
];

const MARKET_KEYWORDS: &[&str] = &[
    "支撑", "阻力", "突破", "反转", "趋势线", "成交量", "震荡", "动能", "震荡指标", "布林带", "K线",
    "技术指标", "移动平均线", "通道", "背离", "MACD", "RSI", "OBV", "形态", "上升三法", "下降三法",
    "图表形态", "头肩顶", "双底", "三角形", "旗形", "楔形", "矩形", "买入", "卖出",
];

const DEFAULT_BLOCKLIST: &str = r"(?i)(免责声明|版权所有|微信|扫码|www\.|https?://|大学|出版社|图表来源|技术支持|copyright|all rights reserved)";

const DEFAULT_CHAPTER_PATTERNS: &[&str] = &[
    r"^第[一二三四五六七八九十百零〇两]+章(?:\s|$)",
    r"(?i)^chapter\s+\d+",
];

const DEFAULT_SECTION_KEYWORDS: &[&str] = &["形态", "模型", "K线", "线图", "指标", "趋势"];

const DEFAULT_ACTION_KEYWORDS: &[&str] = &[
    "买入", "卖出", "信号", "建议", "触发", "策略", "buy", "sell", "signal", "trigger", "strategy",
];

const DEFAULT_DEFINITION_PATTERN: &str = r"(?i)[是为指称叫属于构成].*?一种|\b(?:is|are|called|constitutes?)\b.*?\b(?:a|an)\s+(?:kind|type|form)\s+of\b";

const DEFAULT_FIGURE_MARKERS: &[&str] = &["图", "Figure", "Fig."];

const DEFAULT_TERM_KEYWORDS: &[&str] = &["形态", "模型", "K线", "指标"];

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl BookPreset {
    /// The complete default configuration for this preset.
    pub fn config(self) -> SegmentConfig {
        let (keywords, source) = match self {
            BookPreset::Candlestick => (CANDLESTICK_KEYWORDS, "日本蜡烛图技术"),
            BookPreset::MarketAnalysis => (MARKET_KEYWORDS, "金融市场技术分析"),
        };

        SegmentConfig {
            keywords: owned(keywords),
            blocklist_pattern: DEFAULT_BLOCKLIST.to_string(),
            min_len: 15,
            max_len: 500,
            min_tokens: 1,
            source: source.to_string(),
            chapter_patterns: owned(DEFAULT_CHAPTER_PATTERNS),
            section_keywords: owned(DEFAULT_SECTION_KEYWORDS),
            section_max_len: 50,
            action_keywords: owned(DEFAULT_ACTION_KEYWORDS),
            definition_pattern: DEFAULT_DEFINITION_PATTERN.to_string(),
            figure_markers: owned(DEFAULT_FIGURE_MARKERS),
            term_keywords: owned(DEFAULT_TERM_KEYWORDS),
            term_max_len: 60,
            join_lines: None,
            pages: PageSelection::default(),
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

// ── Page selection ───────────────────────────────────────────────────────

/// Specifies which pages of the document are segmented.
///
/// Unselected pages are skipped entirely, including their headings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Segment all pages (default).
    #[default]
    All,
    /// A single page (1-indexed).
    Single(usize),
    /// A contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Specific pages (1-indexed).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Whether the given 1-indexed page number is selected.
    pub fn contains(&self, page_num: usize) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Single(p) => *p == page_num,
            PageSelection::Range(start, end) => (*start..=*end).contains(&page_num),
            PageSelection::Set(pages) => pages.contains(&page_num),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        SegmentConfig::default().validate().expect("defaults must validate");
        SegmentConfig::builder()
            .preset(BookPreset::MarketAnalysis)
            .build()
            .expect("market preset must validate");
    }

    #[test]
    fn inverted_bounds_rejected() {
        let err = SegmentConfig::builder()
            .length_bounds(300, 20)
            .build()
            .unwrap_err();
        assert!(matches!(err, SegmentError::InvalidConfig(_)));
    }

    #[test]
    fn empty_keywords_rejected() {
        let err = SegmentConfig::builder()
            .keywords(Vec::<String>::new())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("keyword"), "got: {err}");
    }

    #[test]
    fn bad_blocklist_regex_rejected() {
        let err = SegmentConfig::builder()
            .blocklist_pattern("(unclosed")
            .build()
            .unwrap_err();
        assert!(matches!(err, SegmentError::InvalidConfig(_)));
    }

    #[test]
    fn bad_chapter_regex_rejected() {
        let err = SegmentConfig::builder()
            .chapter_patterns(["[第"])
            .build()
            .unwrap_err();
        assert!(matches!(err, SegmentError::InvalidConfig(_)));
    }

    #[test]
    fn zero_join_lines_rejected() {
        assert!(SegmentConfig::builder().join_lines(Some(0)).build().is_err());
        assert!(SegmentConfig::builder().join_lines(Some(120)).build().is_ok());
    }

    #[test]
    fn preset_then_override() {
        let config = SegmentConfig::builder()
            .preset(BookPreset::MarketAnalysis)
            .min_tokens(2)
            .build()
            .unwrap();
        assert_eq!(config.source, "金融市场技术分析");
        assert_eq!(config.min_tokens, 2);
        assert!(config.keywords.iter().any(|k| k == "旗形"));
    }

    #[test]
    fn page_selection_contains() {
        assert!(PageSelection::All.contains(42));
        assert!(PageSelection::Single(3).contains(3));
        assert!(!PageSelection::Single(3).contains(4));
        assert!(PageSelection::Range(2, 4).contains(4));
        assert!(!PageSelection::Range(2, 4).contains(5));
        assert!(PageSelection::Set(vec![1, 5]).contains(5));
        assert!(!PageSelection::Set(vec![1, 5]).contains(2));
    }

    #[test]
    fn toml_profile_with_partial_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.toml");
        std::fs::write(
            &path,
            "keywords = [\"楔形\"]\nmin_len = 10\nmax_len = 200\nsource = \"wedges\"\n",
        )
        .unwrap();

        let config = SegmentConfig::from_profile_file(&path).unwrap();
        assert_eq!(config.keywords, vec!["楔形".to_string()]);
        assert_eq!(config.min_len, 10);
        assert_eq!(config.source, "wedges");
        // untouched fields fall back to defaults
        assert_eq!(config.term_max_len, 60);
    }

    #[test]
    fn json_profile_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.json");
        std::fs::write(&path, r#"{"min_len": 400, "max_len": 100}"#).unwrap();

        let err = SegmentConfig::from_profile_file(&path).unwrap_err();
        assert!(matches!(err, SegmentError::InvalidConfig(_)));
    }

    #[test]
    fn missing_profile_reports_path() {
        let err = SegmentConfig::from_profile_file("/nonexistent/profile.toml").unwrap_err();
        assert!(matches!(err, SegmentError::ProfileLoadFailed { .. }));
    }
}

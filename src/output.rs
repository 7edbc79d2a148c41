//! Output records: structured entries, run statistics, and serialisation.
//!
//! Entries are immutable once the engine finalises them. The only persisted
//! form is newline-delimited JSON, one entry per line, written by
//! [`write_jsonl`].

use crate::error::SegmentError;
use crate::prompts::build_extraction_prompt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

/// Classification label of a finalised paragraph.
///
/// Serialised as snake_case English; the Chinese labels written by older
/// corpora are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    #[serde(alias = "定义")]
    Definition,
    #[serde(alias = "交易逻辑")]
    TradingLogic,
    #[serde(alias = "图注")]
    FigureCaption,
    #[serde(alias = "术语")]
    Term,
    #[serde(alias = "说明")]
    Explanation,
}

impl EntryType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Definition => "definition",
            EntryType::TradingLogic => "trading_logic",
            EntryType::FigureCaption => "figure_caption",
            EntryType::Term => "term",
            EntryType::Explanation => "explanation",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finalised knowledge entry.
///
/// For entries produced by the figure-caption merge, `text` keeps the caption
/// alone and `text_full` holds `caption + " " + continuation`; `entry_type`
/// is `None` and `from_figure_merge` is `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredEntry {
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_full: Option<String>,

    /// 1-indexed page at finalisation time. For merged entries this is the
    /// page of the continuation line.
    pub page: usize,

    pub chapter: Option<String>,

    pub section_title: Option<String>,

    pub figure_ref: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub entry_type: Option<EntryType>,

    #[serde(default)]
    pub context_window: Vec<String>,

    #[serde(default)]
    pub from_figure_merge: bool,

    pub source: String,
}

impl StructuredEntry {
    /// The text downstream consumers should read: `text_full` when merged.
    pub fn full_text(&self) -> &str {
        self.text_full.as_deref().unwrap_or(&self.text)
    }
}

/// Counters for one segmentation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentationStats {
    /// Pages fed to the engine (after page selection).
    pub pages: usize,
    /// Paragraph candidates seen, blank ones included.
    pub lines_seen: usize,
    pub blank_lines: usize,
    pub chapter_headings: usize,
    pub section_headings: usize,
    /// Lines rejected by the validity filter.
    pub invalid_lines: usize,
    /// Lines dropped because of a [`crate::error::LineError`].
    pub line_errors: usize,
    pub captions_buffered: usize,
    /// Captions discarded because another caption arrived first.
    pub captions_replaced: usize,
    /// Caption still pending when the stream ended.
    pub captions_dangling: usize,
    pub standalone_entries: usize,
    pub merged_entries: usize,
    pub duration_ms: u64,
}

impl SegmentationStats {
    /// Total entries produced.
    pub fn entries(&self) -> usize {
        self.standalone_entries + self.merged_entries
    }
}

/// Complete result of segmenting one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentationOutput {
    pub source: String,
    pub entries: Vec<StructuredEntry>,
    pub stats: SegmentationStats,
}

/// What [`crate::convert::inspect`] reports about an input without
/// segmenting it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSummary {
    pub pages: usize,
    pub lines: usize,
    /// Source label embedded in a wrapped JSON document, if any.
    pub source: Option<String>,
    /// Page records (JSON or JSONL) that failed to parse.
    pub skipped_pages: usize,
}

/// Serialisation format for a [`SegmentationOutput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// One entry per line. (default)
    #[default]
    Jsonl,
    /// The whole output, stats included, as pretty JSON.
    Json,
    /// One `{"input", "prompt"}` record per entry for the extraction step.
    Prompts,
}

#[derive(Serialize)]
struct PromptRecord<'a> {
    input: &'a str,
    prompt: String,
}

impl OutputFormat {
    /// Render the output in this format.
    pub fn render(self, output: &SegmentationOutput) -> Result<Vec<u8>, SegmentError> {
        let mut buf = Vec::new();
        match self {
            OutputFormat::Jsonl => write_jsonl(&mut buf, &output.entries)?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut buf, output)?;
                buf.push(b'\n');
            }
            OutputFormat::Prompts => {
                for entry in &output.entries {
                    let record = PromptRecord {
                        input: entry.full_text(),
                        prompt: build_extraction_prompt(entry),
                    };
                    serde_json::to_writer(&mut buf, &record)?;
                    buf.push(b'\n');
                }
            }
        }
        Ok(buf)
    }
}

/// Write entries as newline-delimited UTF-8 JSON.
pub fn write_jsonl<W: Write>(mut writer: W, entries: &[StructuredEntry]) -> Result<(), SegmentError> {
    for entry in entries {
        serde_json::to_writer(&mut writer, entry)?;
        writer
            .write_all(b"\n")
            .map_err(|e| SegmentError::Internal(format!("jsonl write: {e}")))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standalone() -> StructuredEntry {
        StructuredEntry {
            text: "头肩顶是一种看跌反转形态".into(),
            text_full: None,
            page: 3,
            chapter: Some("第一章 概述".into()),
            section_title: None,
            figure_ref: None,
            entry_type: Some(EntryType::Definition),
            context_window: vec![],
            from_figure_merge: false,
            source: "test".into(),
        }
    }

    #[test]
    fn standalone_serialises_type_and_omits_text_full() {
        let json = serde_json::to_string(&standalone()).unwrap();
        assert!(json.contains(r#""type":"definition""#), "got: {json}");
        assert!(!json.contains("text_full"));
        // non-ASCII text is written as UTF-8, not escaped
        assert!(json.contains("头肩顶"));
    }

    #[test]
    fn merged_omits_type() {
        let mut e = standalone();
        e.entry_type = None;
        e.text_full = Some("图1 示例 后续".into());
        e.from_figure_merge = true;
        let json = serde_json::to_string(&e).unwrap();
        assert!(!json.contains(r#""type""#));
        assert!(json.contains(r#""from_figure_merge":true"#));
        assert_eq!(e.full_text(), "图1 示例 后续");
    }

    #[test]
    fn legacy_chinese_labels_deserialise() {
        let t: EntryType = serde_json::from_str(r#""交易逻辑""#).unwrap();
        assert_eq!(t, EntryType::TradingLogic);
    }

    #[test]
    fn jsonl_one_record_per_line() {
        let entries = vec![standalone(), standalone()];
        let mut buf = Vec::new();
        write_jsonl(&mut buf, &entries).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.ends_with('\n'));
        let back: StructuredEntry = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(back, entries[0]);
    }

    #[test]
    fn prompts_format_uses_full_text() {
        let mut merged = standalone();
        merged.text_full = Some("图2 双底 颈线被突破".into());
        let output = SegmentationOutput {
            source: "test".into(),
            entries: vec![merged],
            stats: SegmentationStats::default(),
        };
        let rendered = String::from_utf8(OutputFormat::Prompts.render(&output).unwrap()).unwrap();
        let v: serde_json::Value = serde_json::from_str(rendered.trim()).unwrap();
        assert_eq!(v["input"], "图2 双底 颈线被突破");
        assert!(v["prompt"].as_str().unwrap().contains("图2 双底 颈线被突破"));
    }
}

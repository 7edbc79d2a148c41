//! Prompts for the downstream knowledge-card extraction step.
//!
//! Segmentation produces entries; a separate LLM pass turns each entry into a
//! structured term card. Keeping the prompt here means the JSONL written by
//! this crate and the prompt that consumes it evolve together, and tests can
//! inspect the rendered prompt without calling any model.

use crate::output::StructuredEntry;

/// Instructions prepended to every extraction prompt.
pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"You are a technical-analysis terminology assistant. Your task is to extract a structured knowledge card from a paragraph of a financial technical-analysis book.

Follow these rules precisely:

1. SCOPE
   - Decide whether the paragraph explains a technical term: a candlestick or chart pattern, an indicator, a trading signal, or an analysis method
   - If it does, fill in every field of the card below
   - If it is an introduction, table of contents or carries no term, fill in only `qa_pairs` and leave the other fields empty

2. FIDELITY
   - You may complete the usage logic of a term from the paragraph, but never invent facts

3. OUTPUT FORMAT
   - Output ONLY a JSON object that parses as-is:
     {
       "indicator_name": "term name (e.g. head and shoulders top, RSI, trend line)",
       "definition": "one concise sentence saying what it is",
       "signal_logic": "how it is used in trading, or what triggers it",
       "figure_ref": "figure number, if any",
       "qa_pairs": [{"Q": "question", "A": "answer"}]
     }"#;

/// Render the extraction prompt for one entry.
///
/// Uses `text_full` for merged figure entries and lists the context window
/// (when present) ahead of the paragraph itself.
pub fn build_extraction_prompt(entry: &StructuredEntry) -> String {
    let mut prompt = String::from(EXTRACTION_SYSTEM_PROMPT);

    if let Some(ref figure) = entry.figure_ref {
        prompt.push_str(&format!("\n\nFigure reference: {figure}"));
    }

    if !entry.context_window.is_empty() {
        prompt.push_str("\n\nPreceding paragraphs (context only):");
        for previous in &entry.context_window {
            prompt.push_str(&format!("\n\"\"\"{previous}\"\"\""));
        }
    }

    prompt.push_str(&format!(
        "\n\nAnalyse the following paragraph:\n\"\"\"{}\"\"\"",
        entry.full_text()
    ));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::EntryType;

    fn entry(window: Vec<String>) -> StructuredEntry {
        StructuredEntry {
            text: "RSI 高于 70 时发出超买信号。".into(),
            text_full: None,
            page: 12,
            chapter: None,
            section_title: None,
            figure_ref: None,
            entry_type: Some(EntryType::TradingLogic),
            context_window: window,
            from_figure_merge: false,
            source: "test".into(),
        }
    }

    #[test]
    fn prompt_ends_with_paragraph() {
        let p = build_extraction_prompt(&entry(vec![]));
        assert!(p.starts_with(EXTRACTION_SYSTEM_PROMPT));
        assert!(p.trim_end().ends_with("RSI 高于 70 时发出超买信号。\"\"\""));
        assert!(!p.contains("Preceding paragraphs"));
    }

    #[test]
    fn prompt_includes_context_window() {
        let p = build_extraction_prompt(&entry(vec!["a".into(), "b".into()]));
        assert!(p.contains("Preceding paragraphs"));
        assert!(p.find("\"\"\"a\"\"\"").unwrap() < p.find("\"\"\"b\"\"\"").unwrap());
    }
}

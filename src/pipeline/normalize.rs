//! Line normalisation: the cheap, deterministic cleanup every line gets
//! before heading detection.
//!
//! Extracted PDF text carries artefacts that break keyword matching without
//! being visible: zero-width spaces between CJK characters, a BOM on the first
//! line, soft hyphens from justified layouts, CR from Windows tooling. These
//! are removed here so that no later stage has to think about them.
//!
//! A line that cannot be trusted at all (not a string, or containing the
//! U+FFFD replacement character left behind by lossy decoding) is reported as
//! a [`LineError`] and dropped by the engine.

use crate::error::LineError;
use crate::pipeline::input::RawLine;

const INVISIBLE: [char; 6] = [
    '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
];

/// Normalise one raw line. `page` and `line` only label the error.
pub fn normalize_line(raw: &RawLine, page: usize, line: usize) -> Result<String, LineError> {
    let text = match raw {
        RawLine::Text(s) => s,
        RawLine::Other(value) => {
            return Err(LineError::Malformed {
                page,
                line,
                found: json_kind(value).to_string(),
            })
        }
    };

    if text.contains('\u{FFFD}') {
        return Err(LineError::Decoding { page, line });
    }

    Ok(remove_invisible_chars(text).replace('\r', "").trim().to_string())
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Strip zero-width characters, BOM and soft hyphens.
pub fn remove_invisible_chars(input: &str) -> String {
    input.replace(INVISIBLE, "")
}

/// Join consecutive non-blank lines into paragraphs of at least `min_chars`
/// characters, space-separated. The remainder is flushed as a final,
/// possibly shorter, paragraph.
pub fn join_lines(lines: &[String], min_chars: usize) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();

    for line in lines.iter().map(|l| l.trim()).filter(|l| !l.is_empty()) {
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(line);
        if current.chars().count() >= min_chars {
            paragraphs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    paragraphs
}

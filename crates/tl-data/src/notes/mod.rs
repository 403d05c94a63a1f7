//! Cell annotation parsing
//!
//! Comments attached to cells are often dict-like dumps written by other
//! tools. Parsing degrades through several tiers and never fails:
//! strict JSON object, tolerant rewrite of Python-style literals, loose
//! `key: value` lines, and finally the raw text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tl_core::{Cell, Row};

static PY_TRUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bTrue\b").expect("valid regex"));
static PY_FALSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bFalse\b").expect("valid regex"));
static PY_NONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bNone\b").expect("valid regex"));
static QUOTED_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^["']([^"']*)["']\s*:"#).expect("valid regex"));

/// One key/value pair of a structured note
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteEntry {
    pub key: String,
    pub value: Value,
    /// Display hint: positive styling when true
    pub truthy: bool,
}

impl NoteEntry {
    /// Value rendered for display; strings lose their quotes
    pub fn display_value(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Parsed form of a cell annotation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum NoteContent {
    /// Decoded key/value mapping, in source order
    Structured(Vec<NoteEntry>),
    /// Cleaned `key: value` lines
    Lines(Vec<String>),
    /// Original text, untouched
    Text(String),
}

/// Parse an annotation string
pub fn parse_note(text: &str) -> NoteContent {
    if let Some(entries) = decode_object(text) {
        return NoteContent::Structured(entries);
    }

    if let Some(entries) = decode_object(&tolerant_rewrite(text)) {
        return NoteContent::Structured(entries);
    }

    if text.contains(':') && text.contains(',') {
        return NoteContent::Lines(split_lines(text));
    }

    NoteContent::Text(text.to_string())
}

/// Decode `text` as a JSON object
fn decode_object(text: &str) -> Option<Vec<NoteEntry>> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Object(map) => Some(
            map.into_iter()
                .map(|(key, value)| NoteEntry {
                    truthy: is_truthy(&value),
                    key,
                    value,
                })
                .collect(),
        ),
        _ => None,
    }
}

/// Rewrite Python literal syntax into JSON
fn tolerant_rewrite(text: &str) -> String {
    let text = text.replace('\'', "\"");
    let text = PY_TRUE.replace_all(&text, "true");
    let text = PY_FALSE.replace_all(&text, "false");
    PY_NONE.replace_all(&text, "null").into_owned()
}

fn split_lines(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    let inner = trimmed.strip_prefix('{').unwrap_or(trimmed);
    let inner = inner.strip_suffix('}').unwrap_or(inner);

    inner
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| QUOTED_KEY.replace(segment, "$1:").into_owned())
        .collect()
}

/// Truthiness used for styling: false, null, 0, NaN and "" are falsy
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Everything shown when inspecting one cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellInspection {
    pub header: String,
    pub value: String,
    pub background: Option<String>,
    pub color: Option<String>,
    pub note: Option<NoteContent>,
}

/// Inspect a cell of a row; `None` when the row has no such cell
pub fn inspect_cell(row: &Row, header: &str) -> Option<CellInspection> {
    let cell: &Cell = row.cell(header)?;
    Some(CellInspection {
        header: header.to_string(),
        value: cell.text().into_owned(),
        background: cell.background_color().map(str::to_string),
        color: cell.text_color().map(str::to_string),
        note: cell
            .comment
            .as_deref()
            .filter(|comment| !comment.trim().is_empty())
            .map(parse_note),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(key: &str, value: Value, truthy: bool) -> NoteEntry {
        NoteEntry {
            key: key.to_string(),
            value,
            truthy,
        }
    }

    #[test]
    fn test_strict_json_object() {
        assert_eq!(
            parse_note(r#"{"a": true, "b": false}"#),
            NoteContent::Structured(vec![
                entry("a", json!(true), true),
                entry("b", json!(false), false),
            ])
        );
    }

    #[test]
    fn test_python_style_dict() {
        assert_eq!(
            parse_note("{'ok': True, 'err': None}"),
            NoteContent::Structured(vec![
                entry("ok", json!(true), true),
                entry("err", Value::Null, false),
            ])
        );
    }

    #[test]
    fn test_key_value_lines() {
        assert_eq!(
            parse_note("foo: 1, bar: 2"),
            NoteContent::Lines(vec!["foo: 1".to_string(), "bar: 2".to_string()])
        );
    }

    #[test]
    fn test_broken_dict_is_cleaned_into_lines() {
        assert_eq!(
            parse_note(r#"{"floor": 3, 'door': open, }"#),
            NoteContent::Lines(vec!["floor: 3".to_string(), "door: open".to_string()])
        );
    }

    #[test]
    fn test_plain_text_is_verbatim() {
        assert_eq!(parse_note("plain text"), NoteContent::Text("plain text".to_string()));
        assert_eq!(parse_note(""), NoteContent::Text(String::new()));
        assert_eq!(parse_note("a: b"), NoteContent::Text("a: b".to_string()));
    }

    #[test]
    fn test_non_object_json_falls_through() {
        assert_eq!(parse_note("[1, 2]"), NoteContent::Text("[1, 2]".to_string()));
        assert_eq!(parse_note("42"), NoteContent::Text("42".to_string()));
    }

    #[test]
    fn test_truthiness_and_display() {
        let entries = match parse_note(r#"{"n": 0, "s": "", "x": "门锁", "list": []}"#) {
            NoteContent::Structured(entries) => entries,
            other => panic!("unexpected {:?}", other),
        };
        let truthy: Vec<bool> = entries.iter().map(|e| e.truthy).collect();
        assert_eq!(truthy, vec![false, false, true, true]);
        assert_eq!(entries[2].display_value(), "门锁");
        assert_eq!(entries[0].display_value(), "0");
    }

    #[test]
    fn test_inspect_cell() {
        let row = Row::new(1).with_cell(
            "描述",
            Cell::new("电梯故障")
                .with_background("#ff0000")
                .with_comment("{'delay': 12}"),
        );

        let inspection = inspect_cell(&row, "描述").unwrap();
        assert_eq!(inspection.value, "电梯故障");
        assert_eq!(inspection.background.as_deref(), Some("#ff0000"));
        assert_eq!(
            inspection.note,
            Some(NoteContent::Structured(vec![entry("delay", json!(12), true)]))
        );
        assert!(inspect_cell(&row, "missing").is_none());
    }
}

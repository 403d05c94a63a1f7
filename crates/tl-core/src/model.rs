//! Cell, row and dataset model
//!
//! These types mirror what the upload service produces for a spreadsheet.
//! Everything downstream treats them as read-only input: rows are shared
//! behind `Arc` so derived views can reference them without copying.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Deserializer, Serialize};

use crate::time::{parse_timestamp, TimestampMs};

/// Opaque row identifier, unique within a dataset
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Int(id) => write!(f, "{}", id),
            RowId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for RowId {
    fn from(id: i64) -> Self {
        RowId::Int(id)
    }
}

impl From<i32> for RowId {
    fn from(id: i32) -> Self {
        RowId::Int(i64::from(id))
    }
}

impl From<&str> for RowId {
    fn from(id: &str) -> Self {
        RowId::Text(id.to_string())
    }
}

/// Raw cell value as delivered by the upload service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Stringified form, as used for search and display
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            CellValue::Text(text) => Cow::Borrowed(text.as_str()),
            other => Cow::Owned(other.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Bool(b) => write!(f, "{}", b),
            // Integral numbers print without a trailing ".0"
            CellValue::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for CellValue {
    fn from(text: &str) -> Self {
        CellValue::Text(text.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// Visual style carried over from the spreadsheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A single cell of a row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Cell content; `None` and an empty string both mean "no content"
    #[serde(default)]
    pub value: Option<CellValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<CellStyle>,

    /// Free-text annotation attached to the cell
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Cell {
    /// Create a plain cell with a value and nothing else
    pub fn new(value: impl Into<CellValue>) -> Self {
        Self {
            value: Some(value.into()),
            style: None,
            comment: None,
        }
    }

    /// Attach a background color
    pub fn with_background(mut self, color: impl Into<String>) -> Self {
        self.style.get_or_insert_with(CellStyle::default).background_color = Some(color.into());
        self
    }

    /// Attach a text color
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.style.get_or_insert_with(CellStyle::default).color = Some(color.into());
        self
    }

    /// Attach a comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Stringified value, empty when the cell has no content
    pub fn text(&self) -> Cow<'_, str> {
        self.value
            .as_ref()
            .map(CellValue::as_text)
            .unwrap_or(Cow::Borrowed(""))
    }

    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }

    pub fn background_color(&self) -> Option<&str> {
        self.style.as_ref()?.background_color.as_deref()
    }

    pub fn text_color(&self) -> Option<&str> {
        self.style.as_ref()?.color.as_deref()
    }

    /// Parsed timestamp of the value, if it looks like one
    pub fn timestamp(&self) -> Option<TimestampMs> {
        self.value.as_ref().and_then(parse_timestamp)
    }
}

/// One data record of the dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,

    #[serde(default, deserialize_with = "null_as_default")]
    pub cells: IndexMap<String, Cell>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "IndexSet::is_empty")]
    pub tags: IndexSet<String>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "IndexMap::is_empty")]
    pub global_attributes: IndexMap<String, serde_json::Value>,
}

impl Row {
    /// Create an empty row
    pub fn new(id: impl Into<RowId>) -> Self {
        Self {
            id: id.into(),
            cells: IndexMap::new(),
            tags: IndexSet::new(),
            global_attributes: IndexMap::new(),
        }
    }

    /// Builder-style cell insertion
    pub fn with_cell(mut self, header: impl Into<String>, cell: Cell) -> Self {
        self.cells.insert(header.into(), cell);
        self
    }

    /// Builder-style tag insertion
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Builder-style global attribute insertion
    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.global_attributes.insert(key.into(), value);
        self
    }

    pub fn cell(&self, header: &str) -> Option<&Cell> {
        self.cells.get(header)
    }

    /// Stringified value of a column, empty when absent
    pub fn text(&self, header: &str) -> Cow<'_, str> {
        self.cells
            .get(header)
            .map(Cell::text)
            .unwrap_or(Cow::Borrowed(""))
    }

    /// Parsed timestamp held in the given column
    pub fn timestamp(&self, header: &str) -> Option<TimestampMs> {
        self.cells.get(header).and_then(Cell::timestamp)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// A parsed spreadsheet: one sheet, its headers and rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub sheet_name: String,

    /// Column headers; order is significant
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub rows: Vec<Arc<Row>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_version: Option<String>,
}

impl Dataset {
    /// Create a dataset from headers and rows
    pub fn new(sheet_name: impl Into<String>, headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            headers,
            rows: rows.into_iter().map(Arc::new).collect(),
            server_version: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() || self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Look a row up by its identifier
    pub fn row(&self, id: &RowId) -> Option<&Arc<Row>> {
        self.rows.iter().find(|row| &row.id == id)
    }
}

/// Treat an explicit JSON `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

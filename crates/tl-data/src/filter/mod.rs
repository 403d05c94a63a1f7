//! Row filtering pipeline
//!
//! Every predicate is a pure function of one row and the filter state, so
//! the pipeline result is the same regardless of predicate order.

use std::sync::Arc;

use tl_core::{FilterState, Row, TimeRange, ALL_DEVICES};
use tracing::debug;

use crate::config::PipelineConfig;
use crate::schema::Columns;

/// A single row filter
pub trait RowPredicate: Send + Sync {
    /// Short name for logging
    fn name(&self) -> &'static str;

    fn accepts(&self, row: &Row) -> bool;
}

/// Keep rows whose device cell equals the selection exactly
pub struct DevicePredicate {
    column: String,
    device: String,
}

impl DevicePredicate {
    pub fn new(column: impl Into<String>, device: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            device: device.into(),
        }
    }
}

impl RowPredicate for DevicePredicate {
    fn name(&self) -> &'static str {
        "device"
    }

    fn accepts(&self, row: &Row) -> bool {
        row.text(&self.column) == self.device.as_str()
    }
}

/// Keep rows where some cell value or comment contains the needle,
/// ignoring case
pub struct SearchPredicate {
    needle: String,
}

impl SearchPredicate {
    pub fn new(text: &str) -> Self {
        Self {
            needle: text.to_lowercase(),
        }
    }
}

impl RowPredicate for SearchPredicate {
    fn name(&self) -> &'static str {
        "search"
    }

    fn accepts(&self, row: &Row) -> bool {
        row.cells.values().any(|cell| {
            cell.text().to_lowercase().contains(&self.needle)
                || cell
                    .comment
                    .as_ref()
                    .map(|comment| comment.to_lowercase().contains(&self.needle))
                    .unwrap_or(false)
        })
    }
}

/// Keep rows whose time lies in the window. Rows without a parsable time
/// always pass.
pub struct TimeRangePredicate {
    column: String,
    range: TimeRange,
}

impl TimeRangePredicate {
    pub fn new(column: impl Into<String>, range: TimeRange) -> Self {
        Self {
            column: column.into(),
            range,
        }
    }
}

impl RowPredicate for TimeRangePredicate {
    fn name(&self) -> &'static str {
        "time_range"
    }

    fn accepts(&self, row: &Row) -> bool {
        match row.timestamp(&self.column) {
            Some(ts) => self.range.contains(ts),
            None => true,
        }
    }
}

/// Drop rows carrying the non-critical tag
pub struct NonCriticalPredicate {
    tag: String,
}

impl NonCriticalPredicate {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

impl RowPredicate for NonCriticalPredicate {
    fn name(&self) -> &'static str {
        "non_critical"
    }

    fn accepts(&self, row: &Row) -> bool {
        !row.has_tag(&self.tag)
    }
}

/// Conjunction of row predicates
#[derive(Default)]
pub struct FilterPipeline {
    predicates: Vec<Box<dyn RowPredicate>>,
}

impl FilterPipeline {
    /// Build the active predicates for a filter state
    pub fn from_state(state: &FilterState, columns: &Columns, config: &PipelineConfig) -> Self {
        let mut predicates: Vec<Box<dyn RowPredicate>> = Vec::new();

        if state.selected_device != ALL_DEVICES {
            predicates.push(Box::new(DevicePredicate::new(
                columns.device_col.clone(),
                state.selected_device.clone(),
            )));
        }

        if !state.search_text.is_empty() {
            predicates.push(Box::new(SearchPredicate::new(&state.search_text)));
        }

        if state.time_filter_active() {
            if let Some(time_col) = &columns.time_col {
                predicates.push(Box::new(TimeRangePredicate::new(
                    time_col.clone(),
                    state.time_range,
                )));
            }
        }

        if state.hide_non_critical {
            predicates.push(Box::new(NonCriticalPredicate::new(
                config.non_critical_tag.clone(),
            )));
        }

        Self { predicates }
    }

    /// Build a pipeline from explicit predicates
    pub fn with_predicates(predicates: Vec<Box<dyn RowPredicate>>) -> Self {
        Self { predicates }
    }

    pub fn predicates(&self) -> &[Box<dyn RowPredicate>] {
        &self.predicates
    }

    pub fn accepts(&self, row: &Row) -> bool {
        self.predicates.iter().all(|predicate| predicate.accepts(row))
    }

    /// Filter rows, preserving input order
    pub fn apply(&self, rows: &[Arc<Row>]) -> Vec<Arc<Row>> {
        let filtered: Vec<Arc<Row>> = rows
            .iter()
            .filter(|row| self.accepts(row))
            .cloned()
            .collect();

        debug!(
            "Filter [{}] kept {} of {} rows",
            self.predicates
                .iter()
                .map(|p| p.name())
                .collect::<Vec<_>>()
                .join(", "),
            filtered.len(),
            rows.len()
        );
        filtered
    }
}

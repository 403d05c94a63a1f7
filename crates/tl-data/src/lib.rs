//! Data pipeline of the timeline viewer
//!
//! Column inference, row filtering, event classification, time-axis
//! layout and annotation parsing. Every stage is a pure function of the
//! dataset and the current selections.

pub mod cache;
pub mod classify;
pub mod config;
pub mod filter;
pub mod index;
pub mod notes;
pub mod schema;
pub mod views;

use thiserror::Error;

// Re-exports
pub use cache::Derivations;
pub use classify::{sort_by_time, Classification, EventClassifier, HeartbeatEvent, MarkerMatch, TimelineEvent};
pub use config::{HeartbeatKind, MarkerRule, PipelineConfig};
pub use filter::{FilterPipeline, RowPredicate};
pub use index::{full_time_range, position, StripPoint, Strips, TimeScale};
pub use notes::{inspect_cell, parse_note, CellInspection, NoteContent, NoteEntry};
pub use schema::{Columns, SchemaInferrer};
pub use views::{initial_filters, DatasetViews, DerivedViews, DisplayRow, Summary};

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

//! Core types of the timeline workspace
//!
//! This crate provides the cell/row model delivered by the upload service,
//! the rule-debug wire types, the view-state value with its transitions, and
//! the seam to the external backend.

pub mod backend;
pub mod debug;
pub mod events;
pub mod model;
pub mod state;
pub mod time;

// Re-export commonly used types
pub use backend::TimelineBackend;
pub use debug::{AttributeRow, DebugPreview, DelayedRow, IgnoredRow, PreviewRequest};
pub use events::EventBus;
pub use model::{Cell, CellStyle, CellValue, Dataset, Row, RowId};
pub use state::{
    FilterState, Notice, NoticeLevel, RequestTicket, StripKind, StripVisibility, TimeRange,
    ViewAction, ViewState, ALL_DEVICES,
};
pub use time::{format_timestamp, parse_timestamp, parse_timestamp_str, TimestampMs};

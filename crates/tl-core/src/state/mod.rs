//! View state and its transitions
//!
//! `ViewState` is an immutable value: every transition consumes the current
//! state and returns the next one. Derived views are never stored here; they
//! are recomputed from the dataset and the filter selections.

use std::fmt::Display;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::debug::DebugPreview;
use crate::model::Dataset;
use crate::time::TimestampMs;

/// Device selector value meaning "no device filter"
pub const ALL_DEVICES: &str = "All";

/// Inclusive time interval in epoch milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: TimestampMs,
    pub end: TimestampMs,
}

impl TimeRange {
    /// Create a range, swapping the bounds if they are reversed
    pub fn new(a: TimestampMs, b: TimestampMs) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn contains(&self, ts: TimestampMs) -> bool {
        ts >= self.start && ts <= self.end
    }

    /// Clamp this range into `bounds`
    pub fn clamp_to(&self, bounds: &TimeRange) -> Self {
        Self::new(
            self.start.clamp(bounds.start, bounds.end),
            self.end.clamp(bounds.start, bounds.end),
        )
    }
}

/// User filter selections
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterState {
    /// Exact device value, or [`ALL_DEVICES`]
    pub selected_device: String,

    /// Case-insensitive substring searched in values and comments
    pub search_text: String,

    /// Currently selected window
    pub time_range: TimeRange,

    /// Bounds of the whole dataset; an end of 0 disables time filtering
    pub full_time_range: TimeRange,

    pub hide_non_critical: bool,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            selected_device: ALL_DEVICES.to_string(),
            search_text: String::new(),
            time_range: TimeRange::default(),
            full_time_range: TimeRange::default(),
            hide_non_critical: false,
        }
    }
}

impl FilterState {
    /// Initial selections for a dataset spanning `full`
    pub fn with_full_range(full: TimeRange) -> Self {
        Self {
            time_range: full,
            full_time_range: full,
            ..Self::default()
        }
    }

    /// Whether the time-range predicate participates
    pub fn time_filter_active(&self) -> bool {
        self.full_time_range.end > 0
    }
}

/// Visualization lanes that can be toggled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StripKind {
    DeviceHeartbeats,
    ElevatorHeartbeats,
    Events,
}

/// Which strips are shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripVisibility {
    pub device_heartbeats: bool,
    pub elevator_heartbeats: bool,
    pub events: bool,
}

impl Default for StripVisibility {
    fn default() -> Self {
        Self {
            device_heartbeats: true,
            elevator_heartbeats: true,
            events: true,
        }
    }
}

impl StripVisibility {
    pub fn is_visible(&self, kind: StripKind) -> bool {
        match kind {
            StripKind::DeviceHeartbeats => self.device_heartbeats,
            StripKind::ElevatorHeartbeats => self.elevator_heartbeats,
            StripKind::Events => self.events,
        }
    }

    fn toggle(&mut self, kind: StripKind) {
        let flag = match kind {
            StripKind::DeviceHeartbeats => &mut self.device_heartbeats,
            StripKind::ElevatorHeartbeats => &mut self.elevator_heartbeats,
            StripKind::Events => &mut self.events,
        };
        *flag = !*flag;
    }
}

/// Severity of a user-visible notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient message shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

/// Identifies one in-flight request.
///
/// A completion is applied only if its ticket is still the pending one and
/// the dataset generation it was issued against is still current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket {
    generation: u64,
    sequence: u64,
}

impl RequestTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// User-driven state changes
#[derive(Debug, Clone, PartialEq)]
pub enum ViewAction {
    SelectDevice(String),
    SetSearch(String),
    SetTimeRange(TimeRange),
    SetHideNonCritical(bool),
    ToggleStrip(StripKind),
    SetDebugContext(String),
    ResetFilters,
    DismissNotices,
}

/// Complete state of one timeline view
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    dataset: Option<Arc<Dataset>>,
    generation: u64,
    filters: FilterState,
    initial_filters: FilterState,
    strips: StripVisibility,
    debug_context: String,
    debug_logs: Option<Arc<DebugPreview>>,
    notices: Vec<Notice>,
    pending_upload: Option<RequestTicket>,
    pending_debug: Option<RequestTicket>,
    next_sequence: u64,
}

impl ViewState {
    /// Create an empty state with no dataset
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dataset(&self) -> Option<&Arc<Dataset>> {
        self.dataset.as_ref()
    }

    /// Incremented every time the dataset is replaced
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn strips(&self) -> StripVisibility {
        self.strips
    }

    pub fn debug_context(&self) -> &str {
        &self.debug_context
    }

    pub fn debug_logs(&self) -> Option<&Arc<DebugPreview>> {
        self.debug_logs.as_ref()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn is_uploading(&self) -> bool {
        self.pending_upload.is_some()
    }

    pub fn is_debugging(&self) -> bool {
        self.pending_debug.is_some()
    }

    /// Whether a response for `ticket` would still be applied
    pub fn accepts_debug(&self, ticket: RequestTicket) -> bool {
        self.pending_debug == Some(ticket) && ticket.generation == self.generation
    }

    pub fn accepts_upload(&self, ticket: RequestTicket) -> bool {
        self.pending_upload == Some(ticket)
    }

    /// Apply a user action
    pub fn apply(mut self, action: ViewAction) -> Self {
        debug!("Applying view action {:?}", action);
        match action {
            ViewAction::SelectDevice(device) => self.filters.selected_device = device,
            ViewAction::SetSearch(text) => self.filters.search_text = text,
            ViewAction::SetTimeRange(range) => {
                self.filters.time_range = if self.filters.time_filter_active() {
                    range.clamp_to(&self.filters.full_time_range)
                } else {
                    range
                };
            }
            ViewAction::SetHideNonCritical(hide) => self.filters.hide_non_critical = hide,
            ViewAction::ToggleStrip(kind) => self.strips.toggle(kind),
            ViewAction::SetDebugContext(context) => self.debug_context = context,
            ViewAction::ResetFilters => self.filters = self.initial_filters.clone(),
            ViewAction::DismissNotices => self.notices.clear(),
        }
        self
    }

    /// Replace the dataset and reset every selection that depends on it
    pub fn load_dataset(mut self, dataset: Arc<Dataset>, initial_filters: FilterState) -> Self {
        info!(
            "Loaded sheet '{}' with {} rows and {} columns",
            dataset.sheet_name,
            dataset.rows.len(),
            dataset.headers.len()
        );
        self.generation += 1;
        self.dataset = Some(dataset);
        self.filters = initial_filters.clone();
        self.initial_filters = initial_filters;
        self.strips = StripVisibility::default();
        self.debug_logs = None;
        // Any debug request in flight refers to the old rows
        self.pending_debug = None;
        self
    }

    /// Mark an upload as in flight
    pub fn begin_upload(mut self) -> (Self, RequestTicket) {
        let ticket = self.issue_ticket();
        self.pending_upload = Some(ticket);
        (self, ticket)
    }

    /// Finish an upload. `initial_filters` derives the starting selections
    /// for the new dataset.
    pub fn complete_upload<E, F>(
        mut self,
        ticket: RequestTicket,
        result: Result<Arc<Dataset>, E>,
        initial_filters: F,
    ) -> Self
    where
        E: Display,
        F: FnOnce(&Dataset) -> FilterState,
    {
        if !self.accepts_upload(ticket) {
            warn!("Discarding stale upload response (request {})", ticket.sequence);
            return self;
        }
        self.pending_upload = None;

        match result {
            Ok(dataset) => {
                let filters = initial_filters(&dataset);
                let notice = Notice::info(format!(
                    "Loaded {} rows from sheet '{}'",
                    dataset.rows.len(),
                    dataset.sheet_name
                ));
                let mut next = self.load_dataset(dataset, filters);
                next.notices.push(notice);
                next
            }
            Err(e) => {
                warn!("Upload failed: {}", e);
                self.notices.push(Notice::error(format!("Upload failed: {}", e)));
                self
            }
        }
    }

    /// Mark a rule-debug preview as in flight. Returns no ticket when there
    /// are no rows to send.
    pub fn begin_debug(mut self) -> (Self, Option<RequestTicket>) {
        if self.dataset.is_none() {
            self.notices.push(Notice::error("No data loaded"));
            return (self, None);
        }
        let ticket = self.issue_ticket();
        self.pending_debug = Some(ticket);
        self.debug_logs = None;
        (self, Some(ticket))
    }

    /// Finish a rule-debug preview; stale responses are dropped
    pub fn complete_debug<E: Display>(
        mut self,
        ticket: RequestTicket,
        result: Result<DebugPreview, E>,
    ) -> Self {
        if !self.accepts_debug(ticket) {
            warn!(
                "Discarding stale rule preview (request {}, generation {} vs {})",
                ticket.sequence, ticket.generation, self.generation
            );
            return self;
        }
        self.pending_debug = None;

        match result {
            Ok(preview) => {
                info!("Rule preview returned {} categorized rows", preview.total());
                self.debug_logs = Some(Arc::new(preview));
            }
            Err(e) => {
                warn!("Rule preview failed: {}", e);
                self.debug_logs = None;
                self.notices.push(Notice::error(format!("Rule preview failed: {}", e)));
            }
        }
        self
    }

    fn issue_ticket(&mut self) -> RequestTicket {
        self.next_sequence += 1;
        RequestTicket {
            generation: self.generation,
            sequence: self.next_sequence,
        }
    }
}

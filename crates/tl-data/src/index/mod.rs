//! Time axis normalization shared by every strip
//!
//! The scale is always built from the filtered row set, never from a
//! classified subset, so all strips line up on one horizontal axis.

use std::sync::Arc;

use serde::Serialize;
use tl_core::{Row, RowId, StripKind, StripVisibility, TimeRange, TimestampMs};

use crate::classify::{Classification, HeartbeatEvent};

/// Position given to every point of a degenerate (single instant) scale
pub const DEGENERATE_POSITION: f64 = 50.0;

/// Bounds of the parsable times of a row set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeScale {
    min: TimestampMs,
    max: TimestampMs,
}

impl TimeScale {
    /// Scale over a set of times; `None` when the set is empty
    pub fn from_times<I>(times: I) -> Option<Self>
    where
        I: IntoIterator<Item = TimestampMs>,
    {
        times.into_iter().fold(None, |scale, ts| {
            Some(match scale {
                None => TimeScale { min: ts, max: ts },
                Some(TimeScale { min, max }) => TimeScale {
                    min: min.min(ts),
                    max: max.max(ts),
                },
            })
        })
    }

    /// Scale over the parsable times held in `time_col`
    pub fn from_rows(rows: &[Arc<Row>], time_col: &str) -> Option<Self> {
        Self::from_times(rows.iter().filter_map(|row| row.timestamp(time_col)))
    }

    pub fn bounds(&self) -> TimeRange {
        TimeRange::new(self.min, self.max)
    }

    /// Horizontal position of `ts` as a percentage in `[0, 100]`
    pub fn position(&self, ts: TimestampMs) -> f64 {
        if self.max == self.min {
            return DEGENERATE_POSITION;
        }
        // i64 differences overflow for widely spread values
        let span = self.max as f64 - self.min as f64;
        ((ts as f64 - self.min as f64) / span * 100.0).clamp(0.0, 100.0)
    }
}

/// Position of `event_time` against the times of the current filtered set
pub fn position(event_time: TimestampMs, all_times: &[TimestampMs]) -> Option<f64> {
    TimeScale::from_times(all_times.iter().copied()).map(|scale| scale.position(event_time))
}

/// Bounds used to initialise the time-range filter; `(0, 0)` when no row
/// has a parsable time
pub fn full_time_range(rows: &[Arc<Row>], time_col: &str) -> TimeRange {
    TimeScale::from_rows(rows, time_col)
        .map(|scale| scale.bounds())
        .unwrap_or_default()
}

/// A point drawn on a strip
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StripPoint {
    pub id: RowId,
    pub time: TimestampMs,
    pub position: f64,
    /// Fill color; heartbeats use the renderer default
    pub color: Option<String>,
}

/// All strips of the timeline, laid out on one shared scale
#[derive(Debug, Clone, Default, Serialize)]
pub struct Strips {
    pub device_heartbeats: Vec<StripPoint>,
    pub elevator_heartbeats: Vec<StripPoint>,
    pub events: Vec<StripPoint>,
}

impl Strips {
    /// Lay out the classified rows. Rows without a parsable time are not
    /// drawn, and hidden strips stay empty.
    pub fn build(
        classification: &Classification,
        scale: Option<&TimeScale>,
        visibility: StripVisibility,
    ) -> Self {
        let Some(scale) = scale else {
            return Self::default();
        };

        let heartbeat_points = |events: &[HeartbeatEvent], kind: StripKind| -> Vec<StripPoint> {
            if !visibility.is_visible(kind) {
                return Vec::new();
            }
            events
                .iter()
                .filter_map(|event| {
                    let time = event.time?;
                    Some(StripPoint {
                        id: event.id.clone(),
                        time,
                        position: scale.position(time),
                        color: None,
                    })
                })
                .collect()
        };

        let events = if visibility.is_visible(StripKind::Events) {
            classification
                .event_history
                .iter()
                .filter_map(|event| {
                    let time = event.time?;
                    Some(StripPoint {
                        id: event.id.clone(),
                        time,
                        position: scale.position(time),
                        color: Some(event.color.clone()),
                    })
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            device_heartbeats: heartbeat_points(&classification.device_heartbeats, StripKind::DeviceHeartbeats),
            elevator_heartbeats: heartbeat_points(&classification.elevator_heartbeats, StripKind::ElevatorHeartbeats),
            events,
        }
    }

    /// Find the point drawn for a row on any strip
    pub fn find(&self, id: &RowId) -> Option<&StripPoint> {
        self.device_heartbeats
            .iter()
            .chain(&self.elevator_heartbeats)
            .chain(&self.events)
            .find(|point| &point.id == id)
    }
}

//! Event classification
//!
//! Splits the filtered rows into device heartbeats, elevator heartbeats and
//! the generic event history. Heartbeat buckets may overlap; the event
//! history holds exactly the rows matching no marker.

use std::sync::Arc;

use serde::Serialize;
use tl_core::{Row, RowId, TimeRange, TimestampMs};

use crate::config::{HeartbeatKind, PipelineConfig};
use crate::schema::Columns;

/// A heartbeat row placed on a heartbeat strip
#[derive(Debug, Clone, Serialize)]
pub struct HeartbeatEvent {
    pub id: RowId,
    pub time: Option<TimestampMs>,
    pub row: Arc<Row>,
}

/// A non-heartbeat row of the event history
#[derive(Debug, Clone, Serialize)]
pub struct TimelineEvent {
    pub id: RowId,
    pub time: Option<TimestampMs>,
    pub row: Arc<Row>,
    /// Row background, or the neutral color when unstyled
    pub color: String,
}

/// Heartbeat markers found in a row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkerMatch {
    pub device: bool,
    pub elevator: bool,
}

impl MarkerMatch {
    pub fn any(&self) -> bool {
        self.device || self.elevator
    }

    pub fn contains(&self, kind: HeartbeatKind) -> bool {
        match kind {
            HeartbeatKind::Device => self.device,
            HeartbeatKind::Elevator => self.elevator,
        }
    }

    fn set(&mut self, kind: HeartbeatKind) {
        match kind {
            HeartbeatKind::Device => self.device = true,
            HeartbeatKind::Elevator => self.elevator = true,
        }
    }
}

/// Output of the classifier
#[derive(Debug, Clone, Default, Serialize)]
pub struct Classification {
    pub device_heartbeats: Vec<HeartbeatEvent>,
    pub elevator_heartbeats: Vec<HeartbeatEvent>,
    pub event_history: Vec<TimelineEvent>,
    /// First and last time of the sorted input; informational only
    pub time_span: Option<TimeRange>,
}

impl Classification {
    pub fn heartbeats(&self, kind: HeartbeatKind) -> &[HeartbeatEvent] {
        match kind {
            HeartbeatKind::Device => &self.device_heartbeats,
            HeartbeatKind::Elevator => &self.elevator_heartbeats,
        }
    }

    fn heartbeats_mut(&mut self, kind: HeartbeatKind) -> &mut Vec<HeartbeatEvent> {
        match kind {
            HeartbeatKind::Device => &mut self.device_heartbeats,
            HeartbeatKind::Elevator => &mut self.elevator_heartbeats,
        }
    }
}

/// Classifies rows using the marker table of a [`PipelineConfig`]
pub struct EventClassifier<'a> {
    config: &'a PipelineConfig,
}

impl<'a> EventClassifier<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// First non-default background of the row, scanning cells in header order
    pub fn row_background<'r>(&self, row: &'r Row, headers: &[String]) -> Option<&'r str> {
        headers
            .iter()
            .filter_map(|header| row.cell(header))
            .filter_map(|cell| cell.background_color())
            .find(|color| !self.config.is_default_background(color))
    }

    /// First text color of the row, scanning cells in header order
    pub fn row_text_color<'r>(&self, row: &'r Row, headers: &[String]) -> Option<&'r str> {
        headers
            .iter()
            .filter_map(|header| row.cell(header))
            .filter_map(|cell| cell.text_color())
            .find(|color| !color.trim().is_empty())
    }

    /// Heartbeat markers present in the content columns of a row
    pub fn detect_markers(&self, row: &Row, content_cols: &[String]) -> MarkerMatch {
        let mut found = MarkerMatch::default();
        for column in content_cols {
            let text = row.text(column);
            if text.is_empty() {
                continue;
            }
            for rule in &self.config.markers {
                if rule.matches(&text) {
                    found.set(rule.kind);
                }
            }
        }
        found
    }

    /// Event color: the row background if styled, otherwise the neutral color
    pub fn event_color(&self, row: &Row, headers: &[String]) -> String {
        self.row_background(row, headers)
            .unwrap_or(self.config.neutral_color.as_str())
            .to_string()
    }

    /// Classify time-sorted rows
    pub fn classify(&self, sorted_rows: &[Arc<Row>], columns: &Columns, headers: &[String]) -> Classification {
        let time_col = columns.time_col();
        let mut classification = Classification {
            time_span: time_span(sorted_rows, time_col),
            ..Classification::default()
        };

        for row in sorted_rows {
            let time = row.timestamp(time_col);
            let markers = self.detect_markers(row, &columns.content_cols);

            for kind in [HeartbeatKind::Device, HeartbeatKind::Elevator] {
                if markers.contains(kind) {
                    classification.heartbeats_mut(kind).push(HeartbeatEvent {
                        id: row.id.clone(),
                        time,
                        row: row.clone(),
                    });
                }
            }

            if !markers.any() {
                classification.event_history.push(TimelineEvent {
                    id: row.id.clone(),
                    time,
                    row: row.clone(),
                    color: self.event_color(row, headers),
                });
            }
        }

        classification
    }
}

/// Sort rows ascending by time. The sort is stable; rows without a parsable
/// time keep their relative order and go last.
pub fn sort_by_time(rows: &[Arc<Row>], time_col: &str) -> Vec<Arc<Row>> {
    let mut keyed: Vec<(Option<TimestampMs>, Arc<Row>)> = rows
        .iter()
        .map(|row| (row.timestamp(time_col), row.clone()))
        .collect();
    keyed.sort_by_key(|(time, _)| (time.is_none(), *time));
    keyed.into_iter().map(|(_, row)| row).collect()
}

/// Times of the first and last timed rows of a sorted slice
fn time_span(sorted_rows: &[Arc<Row>], time_col: &str) -> Option<TimeRange> {
    let first = sorted_rows.iter().find_map(|row| row.timestamp(time_col))?;
    let last = sorted_rows.iter().rev().find_map(|row| row.timestamp(time_col))?;
    Some(TimeRange::new(first, last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaInferrer;
    use tl_core::Cell;

    fn headers() -> Vec<String> {
        vec!["时间".to_string(), "合同号".to_string(), "描述".to_string()]
    }

    fn row(id: i64, time: f64, desc: &str) -> Row {
        Row::new(id)
            .with_cell("时间", Cell::new(time))
            .with_cell("合同号", Cell::new("474"))
            .with_cell("描述", Cell::new(desc))
    }

    fn classify(rows: Vec<Row>) -> Classification {
        let config = PipelineConfig::default();
        let columns = SchemaInferrer::new().infer(&headers());
        let rows: Vec<Arc<Row>> = rows.into_iter().map(Arc::new).collect();
        let sorted = sort_by_time(&rows, columns.time_col());
        EventClassifier::new(&config).classify(&sorted, &columns, &headers())
    }

    #[test]
    fn test_buckets() {
        let classification = classify(vec![
            row(1, 100.0, "装置心跳正常"),
            row(2, 200.0, "电梯心跳正常"),
            Row::new(3)
                .with_cell("时间", Cell::new(150.0))
                .with_cell("描述", Cell::new("电梯故障").with_background("#ff0000")),
        ]);

        assert_eq!(classification.device_heartbeats.len(), 1);
        assert_eq!(classification.device_heartbeats[0].id, RowId::Int(1));
        assert_eq!(classification.elevator_heartbeats[0].id, RowId::Int(2));
        assert_eq!(classification.event_history.len(), 1);
        assert_eq!(classification.event_history[0].color, "#ff0000");
        assert_eq!(classification.time_span, Some(TimeRange::new(100, 200)));
    }

    #[test]
    fn test_row_with_both_markers_is_in_both_heartbeat_buckets() {
        let classification = classify(vec![row(1, 100.0, "装置心跳 / 电梯心跳")]);
        assert_eq!(classification.device_heartbeats.len(), 1);
        assert_eq!(classification.elevator_heartbeats.len(), 1);
        assert!(classification.event_history.is_empty());
    }

    #[test]
    fn test_markers_only_count_in_content_columns() {
        // The marker sits in the device column, which is not content
        let classification = classify(vec![Row::new(1)
            .with_cell("时间", Cell::new(100.0))
            .with_cell("合同号", Cell::new("装置心跳"))
            .with_cell("描述", Cell::new("门锁故障"))]);
        assert!(classification.device_heartbeats.is_empty());
        assert_eq!(classification.event_history.len(), 1);
    }

    #[test]
    fn test_first_styled_cell_wins_and_defaults_are_skipped() {
        let config = PipelineConfig::default();
        let classifier = EventClassifier::new(&config);
        let row = Row::new(1)
            .with_cell("时间", Cell::new(1.0).with_background("#FFFFFF"))
            .with_cell("合同号", Cell::new("474").with_background("#00ff00"))
            .with_cell("描述", Cell::new("x").with_background("#ff0000").with_color("#9C0006"));

        assert_eq!(classifier.row_background(&row, &headers()), Some("#00ff00"));
        assert_eq!(classifier.row_text_color(&row, &headers()), Some("#9C0006"));
    }

    #[test]
    fn test_unstyled_event_gets_neutral_color() {
        let classification = classify(vec![row(1, 100.0, "门锁故障")]);
        assert_eq!(
            classification.event_history[0].color,
            PipelineConfig::default().neutral_color
        );
    }

    #[test]
    fn test_sort_puts_untimed_rows_last() {
        let rows: Vec<Arc<Row>> = vec![
            Row::new(1).with_cell("时间", Cell::new("??")),
            row(2, 300.0, "a"),
            Row::new(3),
            row(4, 100.0, "b"),
        ]
        .into_iter()
        .map(Arc::new)
        .collect();

        let sorted: Vec<RowId> = sort_by_time(&rows, "时间").iter().map(|r| r.id.clone()).collect();
        assert_eq!(sorted, vec![RowId::Int(4), RowId::Int(2), RowId::Int(1), RowId::Int(3)]);
    }

    #[test]
    fn test_custom_marker_extends_a_category() {
        let mut config = PipelineConfig::default();
        config.add_marker(crate::config::MarkerRule::new("扶梯心跳", HeartbeatKind::Elevator));
        let columns = SchemaInferrer::new().infer(&headers());
        let rows = vec![Arc::new(row(1, 100.0, "扶梯心跳"))];

        let classification = EventClassifier::new(&config).classify(&rows, &columns, &headers());
        assert_eq!(classification.heartbeats(HeartbeatKind::Elevator).len(), 1);
    }
}

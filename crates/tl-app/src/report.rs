//! Plain-text rendering of the derived views

use std::fmt::Write;

use tl_core::{format_timestamp, DebugPreview, NoticeLevel, ViewState};
use tl_data::{CellInspection, DerivedViews, NoteContent, StripPoint};

/// Width of an ASCII strip lane
pub const LANE_WIDTH: usize = 60;

/// Full timeline report
pub fn render_timeline(state: &ViewState, views: &DerivedViews) -> String {
    let mut out = String::new();
    let Some(dataset) = state.dataset() else {
        out.push_str("No data loaded\n");
        render_notices(&mut out, state);
        return out;
    };

    let filters = state.filters();
    let _ = writeln!(out, "Sheet: {} ({} columns)", dataset.sheet_name, dataset.headers.len());
    let _ = writeln!(
        out,
        "Filters: device={} search={:?} hide_non_critical={}",
        filters.selected_device, filters.search_text, filters.hide_non_critical
    );
    if filters.time_filter_active() {
        let _ = writeln!(
            out,
            "Window: {} .. {}",
            format_timestamp(filters.time_range.start),
            format_timestamp(filters.time_range.end)
        );
    }

    let summary = views.summary;
    let _ = writeln!(
        out,
        "Rows: {} total, {} filtered, {} in event table",
        summary.total_rows, summary.filtered_rows, summary.display_rows
    );

    if let Some(scale) = views.scale {
        let bounds = scale.bounds();
        let _ = writeln!(
            out,
            "\nAxis: {} .. {}",
            format_timestamp(bounds.start),
            format_timestamp(bounds.end)
        );
    }
    let strips = state.strips();
    if strips.device_heartbeats {
        render_strip(&mut out, "Device heartbeats", &views.strips.device_heartbeats);
    }
    if strips.elevator_heartbeats {
        render_strip(&mut out, "Elevator heartbeats", &views.strips.elevator_heartbeats);
    }
    if strips.events {
        render_strip(&mut out, "Events", &views.strips.events);
    }

    let columns = &views.dataset.columns;
    let _ = writeln!(out, "\nEvents ({}):", views.display_rows.len());
    for display in &views.display_rows {
        let row = &display.row;
        let time = row
            .timestamp(columns.time_col())
            .map(format_timestamp)
            .unwrap_or_else(|| row.text(columns.time_col()).into_owned());
        let content: Vec<String> = columns
            .content_cols
            .iter()
            .map(|col| row.text(col))
            .filter(|text| !text.is_empty())
            .map(|text| text.into_owned())
            .collect();
        let _ = write!(
            out,
            "  [{}] {}  {}  {}",
            row.id,
            time,
            row.text(&columns.device_col),
            content.join(" | ")
        );
        if let Some(background) = &display.background {
            let _ = write!(out, "  ({})", background);
        }
        out.push('\n');
    }

    render_notices(&mut out, state);
    out
}

fn render_strip(out: &mut String, label: &str, points: &[StripPoint]) {
    let _ = writeln!(out, "{:<20} {} ({})", label, render_lane(points, LANE_WIDTH), points.len());
}

/// Draw points on a lane of `width` cells; coinciding points show as `#`
pub fn render_lane(points: &[StripPoint], width: usize) -> String {
    let mut lane = vec!['-'; width.max(1)];
    let last = lane.len() - 1;
    for point in points {
        let cell = ((point.position / 100.0) * last as f64).round() as usize;
        let slot = &mut lane[cell.min(last)];
        *slot = if *slot == '-' { '|' } else { '#' };
    }
    lane.into_iter().collect()
}

fn render_notices(out: &mut String, state: &ViewState) {
    for notice in state.notices() {
        let tag = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Error => "error",
        };
        let _ = writeln!(out, "[{}] {}", tag, notice.message);
    }
}

/// Rule-debug preview report
pub fn render_preview(preview: &DebugPreview) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Delayed ({}):", preview.delayed_rows.len());
    for row in &preview.delayed_rows {
        let _ = writeln!(out, "  [{}] +{:.1} min  {}", row.id, row.delay_min, row.content);
    }
    let _ = writeln!(out, "Attributes ({}):", preview.attribute_rows.len());
    for row in &preview.attribute_rows {
        let _ = writeln!(out, "  [{}] {}  {}", row.id, row.extracted_attrs.join(", "), row.content);
    }
    let _ = writeln!(out, "Ignored ({}):", preview.ignored_rows.len());
    for row in &preview.ignored_rows {
        let _ = writeln!(out, "  [{}] {}  {}", row.id, row.reason, row.content);
    }
    out
}

/// Annotation report
pub fn render_note(note: &NoteContent) -> String {
    let mut out = String::new();
    match note {
        NoteContent::Structured(entries) => {
            for entry in entries {
                let mark = if entry.truthy { '+' } else { '-' };
                let _ = writeln!(out, "{} {}: {}", mark, entry.key, entry.display_value());
            }
        }
        NoteContent::Lines(lines) => {
            for line in lines {
                let _ = writeln!(out, "  {}", line);
            }
        }
        NoteContent::Text(text) => {
            let _ = writeln!(out, "{}", text);
        }
    }
    out
}

/// Cell inspection report
pub fn render_inspection(inspection: &CellInspection) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}: {}", inspection.header, inspection.value);
    if let Some(background) = &inspection.background {
        let _ = writeln!(out, "background: {}", background);
    }
    if let Some(color) = &inspection.color {
        let _ = writeln!(out, "color: {}", color);
    }
    if let Some(note) = &inspection.note {
        out.push_str(&render_note(note));
    }
    out
}

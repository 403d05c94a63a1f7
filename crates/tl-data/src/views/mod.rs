//! Derived views of a dataset
//!
//! Columns, device options and attribute keys depend only on the dataset.
//! Everything else depends on the dataset and the filter selections.

use std::sync::Arc;

use ahash::AHashSet;
use serde::Serialize;
use tl_core::{Dataset, FilterState, Row, StripVisibility, ALL_DEVICES};
use tracing::debug;

use crate::classify::{sort_by_time, Classification, EventClassifier};
use crate::config::PipelineConfig;
use crate::filter::FilterPipeline;
use crate::index::{full_time_range, Strips, TimeScale};
use crate::schema::{Columns, SchemaInferrer};

/// Views that depend on the dataset alone
#[derive(Debug, Clone, Default, Serialize)]
pub struct DatasetViews {
    pub columns: Columns,
    /// `"All"` followed by each distinct device value
    pub device_options: Vec<String>,
    /// Global attribute keys in first-seen order
    pub attribute_keys: Vec<String>,
}

impl DatasetViews {
    pub fn compute(dataset: &Dataset, config: &PipelineConfig) -> Self {
        let columns = SchemaInferrer::from_config(config).infer(&dataset.headers);
        let device_options = device_options(&dataset.rows, &columns.device_col);
        let attribute_keys = attribute_keys(&dataset.rows);
        Self {
            columns,
            device_options,
            attribute_keys,
        }
    }
}

/// A row of the event table
#[derive(Debug, Clone, Serialize)]
pub struct DisplayRow {
    pub row: Arc<Row>,
    pub background: Option<String>,
    pub text_color: Option<String>,
}

/// Row counts of the current views
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_rows: usize,
    pub filtered_rows: usize,
    pub display_rows: usize,
    pub device_heartbeats: usize,
    pub elevator_heartbeats: usize,
    pub events: usize,
}

/// Everything the timeline renders
#[derive(Debug, Clone, Default, Serialize)]
pub struct DerivedViews {
    pub dataset: Arc<DatasetViews>,
    /// Filtered rows in dataset order
    pub filtered_rows: Vec<Arc<Row>>,
    pub classification: Classification,
    /// Filtered rows matching no heartbeat marker, in dataset order
    pub display_rows: Vec<DisplayRow>,
    /// Shared scale of every strip
    pub scale: Option<TimeScale>,
    pub strips: Strips,
    pub summary: Summary,
}

impl DerivedViews {
    /// Run the filter, classification and layout stages
    pub fn compute(
        dataset: &Dataset,
        dataset_views: Arc<DatasetViews>,
        filters: &FilterState,
        visibility: StripVisibility,
        config: &PipelineConfig,
    ) -> Self {
        let columns = &dataset_views.columns;
        if columns.is_empty() {
            return Self {
                summary: Summary {
                    total_rows: dataset.rows.len(),
                    ..Summary::default()
                },
                dataset: dataset_views,
                ..Self::default()
            };
        }

        let filtered_rows = FilterPipeline::from_state(filters, columns, config).apply(&dataset.rows);

        let classifier = EventClassifier::new(config);
        let sorted = sort_by_time(&filtered_rows, columns.time_col());
        let classification = classifier.classify(&sorted, columns, &dataset.headers);

        let display_rows: Vec<DisplayRow> = filtered_rows
            .iter()
            .filter(|row| !classifier.detect_markers(row, &columns.content_cols).any())
            .map(|row| DisplayRow {
                row: row.clone(),
                background: classifier.row_background(row, &dataset.headers).map(str::to_string),
                text_color: classifier.row_text_color(row, &dataset.headers).map(str::to_string),
            })
            .collect();

        let scale = TimeScale::from_rows(&filtered_rows, columns.time_col());
        let strips = Strips::build(&classification, scale.as_ref(), visibility);

        let summary = Summary {
            total_rows: dataset.rows.len(),
            filtered_rows: filtered_rows.len(),
            display_rows: display_rows.len(),
            device_heartbeats: classification.device_heartbeats.len(),
            elevator_heartbeats: classification.elevator_heartbeats.len(),
            events: classification.event_history.len(),
        };
        debug!("Derived views: {:?}", summary);

        Self {
            dataset: dataset_views,
            filtered_rows,
            classification,
            display_rows,
            scale,
            strips,
            summary,
        }
    }

    /// Whether there is anything to show
    pub fn has_data(&self) -> bool {
        !self.dataset.columns.is_empty() && self.summary.total_rows > 0
    }
}

/// Initial filter selections for a freshly loaded dataset
pub fn initial_filters(dataset: &Dataset, config: &PipelineConfig) -> FilterState {
    let columns = SchemaInferrer::from_config(config).infer(&dataset.headers);
    FilterState::with_full_range(full_time_range(&dataset.rows, columns.time_col()))
}

/// Options of the device selector
pub fn device_options(rows: &[Arc<Row>], device_col: &str) -> Vec<String> {
    let mut options = vec![ALL_DEVICES.to_string()];
    if device_col.is_empty() {
        return options;
    }

    let mut seen = AHashSet::new();
    for row in rows {
        let device = row.text(device_col);
        if !device.is_empty() && seen.insert(device.to_string()) {
            options.push(device.into_owned());
        }
    }
    options
}

/// Global attribute keys across all rows
pub fn attribute_keys(rows: &[Arc<Row>]) -> Vec<String> {
    let mut seen = AHashSet::new();
    rows.iter()
        .flat_map(|row| row.global_attributes.keys())
        .filter(|key| seen.insert(key.as_str()))
        .cloned()
        .collect()
}

//! Memoization of derived views
//!
//! Datasets are immutable once loaded, so an entry is keyed on the dataset
//! allocation plus the selections it was computed for. Holding the `Arc`
//! keeps the allocation alive, which makes pointer identity a sound key.

use std::sync::Arc;

use parking_lot::RwLock;
use tl_core::{Dataset, FilterState, StripVisibility, ViewState};
use tracing::trace;

use crate::config::PipelineConfig;
use crate::views::{DatasetViews, DerivedViews};

struct DatasetEntry {
    dataset: Arc<Dataset>,
    views: Arc<DatasetViews>,
}

struct ViewEntry {
    dataset: Arc<Dataset>,
    filters: FilterState,
    visibility: StripVisibility,
    views: Arc<DerivedViews>,
}

/// Cache of the most recent derivation
pub struct Derivations {
    config: Arc<PipelineConfig>,
    dataset_views: RwLock<Option<DatasetEntry>>,
    views: RwLock<Option<ViewEntry>>,
}

impl Derivations {
    pub fn new(config: Arc<PipelineConfig>) -> Self {
        Self {
            config,
            dataset_views: RwLock::new(None),
            views: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Views for the current state; empty when no dataset is loaded
    pub fn views(&self, state: &ViewState) -> Arc<DerivedViews> {
        match state.dataset() {
            Some(dataset) => self.derive(dataset, state.filters(), state.strips()),
            None => Arc::new(DerivedViews::default()),
        }
    }

    /// Views for a dataset and selections, reusing the last result when the
    /// inputs are unchanged
    pub fn derive(
        &self,
        dataset: &Arc<Dataset>,
        filters: &FilterState,
        visibility: StripVisibility,
    ) -> Arc<DerivedViews> {
        if let Some(entry) = self.views.read().as_ref() {
            if Arc::ptr_eq(&entry.dataset, dataset)
                && entry.filters == *filters
                && entry.visibility == visibility
            {
                trace!("Derived views cache hit");
                return entry.views.clone();
            }
        }

        let dataset_views = self.dataset_views(dataset);
        let views = Arc::new(DerivedViews::compute(
            dataset,
            dataset_views,
            filters,
            visibility,
            &self.config,
        ));

        *self.views.write() = Some(ViewEntry {
            dataset: dataset.clone(),
            filters: filters.clone(),
            visibility,
            views: views.clone(),
        });
        views
    }

    /// Selection-independent views of a dataset
    pub fn dataset_views(&self, dataset: &Arc<Dataset>) -> Arc<DatasetViews> {
        if let Some(entry) = self.dataset_views.read().as_ref() {
            if Arc::ptr_eq(&entry.dataset, dataset) {
                return entry.views.clone();
            }
        }

        let views = Arc::new(DatasetViews::compute(dataset, &self.config));
        *self.dataset_views.write() = Some(DatasetEntry {
            dataset: dataset.clone(),
            views: views.clone(),
        });
        views
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tl_core::{Cell, Row, TimeRange, ViewAction};

    fn dataset() -> Arc<Dataset> {
        Arc::new(Dataset::new(
            "Timeline",
            vec!["Time".to_string(), "Device".to_string(), "Text".to_string()],
            vec![
                Row::new(1)
                    .with_cell("Time", Cell::new(100.0))
                    .with_cell("Device", Cell::new("D1"))
                    .with_cell("Text", Cell::new("door fault")),
                Row::new(2)
                    .with_cell("Time", Cell::new(200.0))
                    .with_cell("Device", Cell::new("D2"))
                    .with_cell("Text", Cell::new("装置心跳")),
            ],
        ))
    }

    #[test]
    fn test_unchanged_inputs_reuse_views() {
        let cache = Derivations::new(Arc::new(PipelineConfig::default()));
        let dataset = dataset();
        let filters = FilterState::with_full_range(TimeRange::new(100, 200));

        let first = cache.derive(&dataset, &filters, StripVisibility::default());
        let second = cache.derive(&dataset, &filters, StripVisibility::default());
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_changed_filters_recompute_but_share_dataset_views() {
        let cache = Derivations::new(Arc::new(PipelineConfig::default()));
        let dataset = dataset();
        let filters = FilterState::with_full_range(TimeRange::new(100, 200));

        let first = cache.derive(&dataset, &filters, StripVisibility::default());
        let narrowed = FilterState {
            selected_device: "D1".to_string(),
            ..filters
        };
        let second = cache.derive(&dataset, &narrowed, StripVisibility::default());

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first.dataset, &second.dataset));
        assert_eq!(second.filtered_rows.len(), 1);
    }

    #[test]
    fn test_equal_but_distinct_dataset_is_a_miss() {
        let cache = Derivations::new(Arc::new(PipelineConfig::default()));
        let filters = FilterState::default();

        let first = cache.derive(&dataset(), &filters, StripVisibility::default());
        let second = cache.derive(&dataset(), &filters, StripVisibility::default());
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_views_follow_view_state() {
        let cache = Derivations::new(Arc::new(PipelineConfig::default()));
        assert!(!cache.views(&ViewState::new()).has_data());

        let dataset = dataset();
        let state = ViewState::new()
            .load_dataset(dataset, FilterState::with_full_range(TimeRange::new(100, 200)))
            .apply(ViewAction::SetSearch("FAULT".to_string()));
        let views = cache.views(&state);
        assert_eq!(views.filtered_rows.len(), 1);
        assert_eq!(views.dataset.device_options.len(), 3);
    }
}

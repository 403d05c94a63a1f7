//! Drives a [`ViewState`] against a backend
//!
//! Asynchronous operations are split into a `begin_*` step that issues a
//! request ticket and a `finish_*` step that applies the response, so a
//! response arriving after its request was superseded is dropped.

use std::sync::Arc;

use tl_core::events::{
    DatasetLoaded, DebugPreviewFailed, DebugPreviewReady, StaleResponseDiscarded, UploadFailed,
};
use tl_core::{Dataset, DebugPreview, EventBus, RequestTicket, RowId, TimelineBackend, ViewAction, ViewState};
use tl_data::{initial_filters, inspect_cell, CellInspection, Derivations, DerivedViews, PipelineConfig};
use tracing::{debug, info};

pub struct Controller<B> {
    backend: B,
    state: ViewState,
    derivations: Derivations,
    events: EventBus,
}

impl<B: TimelineBackend> Controller<B> {
    pub fn new(backend: B, config: Arc<PipelineConfig>) -> Self {
        Self {
            backend,
            state: ViewState::new(),
            derivations: Derivations::new(config),
            events: EventBus::new(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Derived views of the current state
    pub fn views(&self) -> Arc<DerivedViews> {
        self.derivations.views(&self.state)
    }

    pub fn dispatch(&mut self, action: ViewAction) {
        self.transition(|state| state.apply(action));
    }

    /// Load a dataset that did not come through the backend
    pub fn load(&mut self, dataset: Dataset) {
        let dataset = Arc::new(dataset);
        let filters = initial_filters(&dataset, self.derivations.config());
        self.transition(|state| state.load_dataset(dataset, filters));
        self.publish_loaded();
    }

    /// Upload a spreadsheet and load the resulting dataset
    pub async fn upload(&mut self, file_name: &str, bytes: Vec<u8>) {
        let ticket = self.begin_upload();
        info!("Uploading {} to {}", file_name, self.backend.endpoint());
        let result = self.backend.upload(file_name, bytes).await;
        self.finish_upload(ticket, file_name, result);
    }

    pub fn begin_upload(&mut self) -> RequestTicket {
        let (state, ticket) = std::mem::take(&mut self.state).begin_upload();
        self.state = state;
        ticket
    }

    pub fn finish_upload(&mut self, ticket: RequestTicket, file_name: &str, result: anyhow::Result<Dataset>) {
        if !self.state.accepts_upload(ticket) {
            self.events.publish(StaleResponseDiscarded {
                sequence: ticket.sequence(),
            });
            return;
        }

        let result = result.map(Arc::new).map_err(|e| format!("{:#}", e));
        if let Err(error) = &result {
            self.events.publish(UploadFailed {
                file_name: file_name.to_string(),
                error: error.clone(),
            });
        }

        let succeeded = result.is_ok();
        let config = self.derivations.config().clone();
        self.transition(|state| state.complete_upload(ticket, result, |dataset| initial_filters(dataset, &config)));
        if succeeded {
            self.publish_loaded();
        }
    }

    /// Send the full row set to the rule engine
    pub async fn preview_rules(&mut self) {
        let Some(ticket) = self.begin_debug() else {
            return;
        };
        let Some(dataset) = self.state.dataset().cloned() else {
            return;
        };
        let context = self.state.debug_context().to_string();
        let result = self.backend.preview_rules(&dataset.rows, &context).await;
        self.finish_debug(ticket, result);
    }

    pub fn begin_debug(&mut self) -> Option<RequestTicket> {
        let (state, ticket) = std::mem::take(&mut self.state).begin_debug();
        self.state = state;
        ticket
    }

    pub fn finish_debug(&mut self, ticket: RequestTicket, result: anyhow::Result<DebugPreview>) {
        if !self.state.accepts_debug(ticket) {
            self.events.publish(StaleResponseDiscarded {
                sequence: ticket.sequence(),
            });
            return;
        }

        let result = result.map_err(|e| format!("{:#}", e));
        match &result {
            Ok(preview) => self.events.publish(DebugPreviewReady {
                delayed: preview.delayed_rows.len(),
                attributes: preview.attribute_rows.len(),
                ignored: preview.ignored_rows.len(),
            }),
            Err(error) => self.events.publish(DebugPreviewFailed { error: error.clone() }),
        }
        self.transition(|state| state.complete_debug(ticket, result));
    }

    /// Inspect one cell of the loaded dataset
    pub fn inspect(&self, id: &RowId, header: &str) -> Option<CellInspection> {
        let row = self.state.dataset()?.row(id)?;
        inspect_cell(row, header)
    }

    fn transition(&mut self, f: impl FnOnce(ViewState) -> ViewState) {
        self.state = f(std::mem::take(&mut self.state));
        debug!("View state generation {}", self.state.generation());
    }

    fn publish_loaded(&self) {
        if let Some(dataset) = self.state.dataset() {
            self.events.publish(DatasetLoaded {
                sheet_name: dataset.sheet_name.clone(),
                row_count: dataset.rows.len(),
                column_count: dataset.headers.len(),
                generation: self.state.generation(),
            });
        }
    }
}

//! Timeline viewer entry point

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tl_client::HttpBackend;
use tl_core::events::{
    DatasetLoaded, DebugPreviewFailed, DebugPreviewReady, StaleResponseDiscarded, UploadFailed,
};
use tl_core::{Dataset, EventBus, NoticeLevel, TimelineBackend, ViewAction};
use tl_data::parse_note;

mod cli;
mod controller;
mod report;
mod settings;

use cli::{Cli, Command, FilterArgs, InputArgs};
use controller::Controller;
use settings::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        config.client.base_url = base_url;
    }
    if let Some(timeout) = cli.timeout {
        config.client.timeout_secs = timeout;
    }

    if let Command::Note { text } = &cli.command {
        print!("{}", report::render_note(&parse_note(text)));
        return Ok(());
    }

    let backend = HttpBackend::new(&config.client).context("Failed to create HTTP client")?;
    let mut controller = Controller::new(backend, Arc::new(config.pipeline));
    log_events(controller.events());

    match cli.command {
        Command::Show { input, filters, json } => {
            load_input(&mut controller, &input).await?;
            apply_filters(&mut controller, &filters);
            let views = controller.views();
            if json {
                println!("{}", serde_json::to_string_pretty(&*views)?);
            } else {
                print!("{}", report::render_timeline(controller.state(), &views));
            }
        }
        Command::Preview { input, context, json } => {
            load_input(&mut controller, &input).await?;
            controller.dispatch(ViewAction::SetDebugContext(context));
            controller.preview_rules().await;
            fail_on_error_notice(&controller)?;
            if let Some(preview) = controller.state().debug_logs() {
                if json {
                    println!("{}", serde_json::to_string_pretty(&**preview)?);
                } else {
                    print!("{}", report::render_preview(preview));
                }
            }
        }
        Command::Inspect { input, row, column } => {
            load_input(&mut controller, &input).await?;
            let id = cli::parse_row_id(&row);
            match controller.inspect(&id, &column) {
                Some(inspection) => print!("{}", report::render_inspection(&inspection)),
                None => bail!("No cell '{}' in row {}", column, id),
            }
        }
        Command::Note { .. } => {}
    }

    Ok(())
}

fn log_events(bus: &EventBus) {
    bus.subscribe(|event: &DatasetLoaded| {
        info!(
            "Loaded sheet '{}': {} rows, {} columns (generation {})",
            event.sheet_name, event.row_count, event.column_count, event.generation
        );
    });
    bus.subscribe(|event: &UploadFailed| error!("Upload of {} failed: {}", event.file_name, event.error));
    bus.subscribe(|event: &DebugPreviewReady| {
        info!(
            "Rule preview: {} delayed, {} attributes, {} ignored",
            event.delayed, event.attributes, event.ignored
        );
    });
    bus.subscribe(|event: &DebugPreviewFailed| error!("Rule preview failed: {}", event.error));
    bus.subscribe(|event: &StaleResponseDiscarded| {
        warn!("Discarded response to superseded request #{}", event.sequence);
    });
}

/// Load the dataset either from a converted JSON file or through the backend
async fn load_input<B: TimelineBackend>(controller: &mut Controller<B>, input: &InputArgs) -> Result<()> {
    let path = input.input.as_path();
    if input.is_dataset_json() {
        let dataset = read_dataset(path)?;
        info!("Read {} rows from {}", dataset.rows.len(), path.display());
        controller.load(dataset);
    } else {
        let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.xlsx".to_string());
        controller.upload(&file_name, bytes).await;
        fail_on_error_notice(controller)?;
    }
    Ok(())
}

fn read_dataset(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse dataset {}", path.display()))
}

fn apply_filters<B: TimelineBackend>(controller: &mut Controller<B>, filters: &FilterArgs) {
    if let Some(device) = &filters.device {
        controller.dispatch(ViewAction::SelectDevice(device.clone()));
    }
    if let Some(search) = &filters.search {
        controller.dispatch(ViewAction::SetSearch(search.clone()));
    }
    if let Some(range) = filters.time_range(controller.state().filters().full_time_range) {
        controller.dispatch(ViewAction::SetTimeRange(range));
    }
    if filters.hide_non_critical {
        controller.dispatch(ViewAction::SetHideNonCritical(true));
    }
    for strip in &filters.hidden_strips {
        let kind = (*strip).into();
        if controller.state().strips().is_visible(kind) {
            controller.dispatch(ViewAction::ToggleStrip(kind));
        }
    }
}

/// Transport failures end up as notices; surface the last one as an error
fn fail_on_error_notice<B: TimelineBackend>(controller: &Controller<B>) -> Result<()> {
    if let Some(notice) = controller
        .state()
        .notices()
        .iter()
        .rev()
        .find(|notice| notice.level == NoticeLevel::Error)
    {
        bail!("{}", notice.message);
    }
    Ok(())
}

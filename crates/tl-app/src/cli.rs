//! Command line interface

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tl_core::{parse_timestamp_str, RowId, StripKind, TimeRange, TimestampMs};

#[derive(Debug, Parser)]
#[command(name = "timeline", version, about = "Event timeline viewer for spreadsheet logs")]
pub struct Cli {
    /// JSON file with `pipeline` and `client` sections
    #[arg(long, global = true, env = "TIMELINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the upload and rule-evaluation service
    #[arg(long, global = true, env = "TIMELINE_BASE_URL")]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "TIMELINE_TIMEOUT")]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render the timeline of a dataset
    Show {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        filters: FilterArgs,

        /// Print the derived views as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the rule-debug preview over the full row set
    Preview {
        #[command(flatten)]
        input: InputArgs,

        /// Free-text context sent with the rows
        #[arg(long, default_value = "")]
        context: String,

        #[arg(long)]
        json: bool,
    },

    /// Show the value, style and note of one cell
    Inspect {
        #[command(flatten)]
        input: InputArgs,

        /// Row identifier
        #[arg(long)]
        row: String,

        /// Column header
        #[arg(long)]
        column: String,
    },

    /// Parse an annotation string
    Note {
        text: String,
    },
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Spreadsheet to upload, or a dataset `.json` already converted
    pub input: PathBuf,
}

impl InputArgs {
    /// Whether the input is a converted dataset rather than a spreadsheet
    pub fn is_dataset_json(&self) -> bool {
        self.input
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }
}

#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Keep only rows of this device
    #[arg(long)]
    pub device: Option<String>,

    /// Case-insensitive search over values and comments
    #[arg(long)]
    pub search: Option<String>,

    /// Window start (epoch ms or date/time)
    #[arg(long, value_parser = parse_time_arg)]
    pub from: Option<TimestampMs>,

    /// Window end (epoch ms or date/time)
    #[arg(long, value_parser = parse_time_arg)]
    pub to: Option<TimestampMs>,

    #[arg(long)]
    pub hide_non_critical: bool,

    /// Strips to hide
    #[arg(long = "hide-strip", value_enum)]
    pub hidden_strips: Vec<StripArg>,
}

impl FilterArgs {
    /// Requested window, with open ends taken from `full`
    pub fn time_range(&self, full: TimeRange) -> Option<TimeRange> {
        if self.from.is_none() && self.to.is_none() {
            return None;
        }
        Some(TimeRange::new(
            self.from.unwrap_or(full.start),
            self.to.unwrap_or(full.end),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StripArg {
    Device,
    Elevator,
    Events,
}

impl From<StripArg> for StripKind {
    fn from(arg: StripArg) -> Self {
        match arg {
            StripArg::Device => StripKind::DeviceHeartbeats,
            StripArg::Elevator => StripKind::ElevatorHeartbeats,
            StripArg::Events => StripKind::Events,
        }
    }
}

fn parse_time_arg(text: &str) -> Result<TimestampMs, String> {
    parse_timestamp_str(text).ok_or_else(|| format!("unrecognized time '{}'", text))
}

/// Row ids are integers when they look like one
pub fn parse_row_id(text: &str) -> RowId {
    text.trim()
        .parse::<i64>()
        .map(RowId::Int)
        .unwrap_or_else(|_| RowId::Text(text.to_string()))
}

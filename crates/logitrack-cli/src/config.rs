use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use logitrack_core::{Category, RecordFilter, Status};
use logitrack_service::{ClientConfig, DEFAULT_SERVER_URL, DEFAULT_TIMEOUT_SECS};

#[derive(Debug, Parser)]
#[command(name = "logitrack", about = "Logistics record and spreadsheet client")]
pub struct Cli {
    /// Backend origin
    #[arg(long, env = "LOGITRACK_SERVER_URL", default_value = DEFAULT_SERVER_URL, global = true)]
    pub server_url: String,

    /// Request timeout in seconds
    #[arg(long, env = "LOGITRACK_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(&self.server_url).with_timeout(Duration::from_secs(self.timeout))
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List a category's records
    List {
        #[arg(value_parser = parse_category)]
        category: &'static Category,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Print one record as JSON
    Show {
        #[arg(value_parser = parse_category)]
        category: &'static Category,
        id: String,
    },
    /// Save a record's attachment to disk
    Download {
        #[arg(value_parser = parse_category)]
        category: &'static Category,
        id: String,
        /// Target directory
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        /// File name to save under (defaults to the attachment's own)
        #[arg(long)]
        name: Option<String>,
    },
    /// Print the rows of a record's attachment
    View {
        #[arg(value_parser = parse_category)]
        category: &'static Category,
        id: String,
        /// Only rows containing this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Change one cell of a record's attachment and upload it
    SetCell {
        #[arg(value_parser = parse_category)]
        category: &'static Category,
        id: String,
        /// Row index as printed by `view`
        #[arg(long)]
        row: usize,
        #[arg(long)]
        column: String,
        #[arg(long)]
        value: String,
    },
    /// Re-upload a record's attachment under a new file name
    Rename {
        #[arg(value_parser = parse_category)]
        category: &'static Category,
        id: String,
        filename: String,
    },
    /// Create a record
    Create {
        #[arg(value_parser = parse_category)]
        category: &'static Category,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, value_parser = parse_status, default_value = "incomplete")]
        status: Status,
        #[arg(long, env = "LOGITRACK_USER")]
        created_by: String,
        /// Spreadsheet to attach
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Edit a record's fields, optionally replacing its attachment
    Edit {
        #[arg(value_parser = parse_category)]
        category: &'static Category,
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = parse_status)]
        status: Option<Status>,
        #[arg(long)]
        created_by: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Delete a record
    Delete {
        #[arg(value_parser = parse_category)]
        category: &'static Category,
        id: String,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Case-insensitive text to look for in any field
    #[arg(long, default_value = "")]
    pub search: String,
    /// Earliest creation date, YYYY-MM-DD
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// Latest creation date, YYYY-MM-DD
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

impl From<FilterArgs> for RecordFilter {
    fn from(args: FilterArgs) -> Self {
        RecordFilter {
            search: args.search,
            start: args.from,
            end: args.to,
        }
    }
}

fn parse_category(s: &str) -> Result<&'static Category, String> {
    Category::from_key(s).ok_or_else(|| {
        let keys: Vec<&str> = Category::ALL.iter().map(|c| c.key).collect();
        format!("unknown category '{s}' (expected one of: {})", keys.join(", "))
    })
}

fn parse_status(s: &str) -> Result<Status, String> {
    Status::from_str(s).ok_or_else(|| format!("unknown status '{s}' (completed or incomplete)"))
}

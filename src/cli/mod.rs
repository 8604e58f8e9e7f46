pub mod backup;
pub mod calc;
pub mod history;
pub mod init;
pub mod status;
pub mod threshold;

use clap::{Parser, Subcommand};

use microcalc::error::Result;
use microcalc::models::ActivityType;
use microcalc::settings::{load_settings, Settings};
use microcalc::SqliteStore;

#[derive(Parser)]
#[command(
    name = "microcalc",
    version,
    about = "Social contributions and revenue thresholds for micro-entrepreneurs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for microcalc data (default: ~/.local/share/microcalc)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Default activity: vente, prestations, liberales
        #[arg(long = "type")]
        activity: Option<String>,
        /// Apply the ACRE discount by default
        #[arg(long)]
        acre: bool,
    },
    /// Compute contributions and net income for a revenue figure.
    Calc {
        /// Declared revenue, e.g. 1500 or 1500,50
        #[arg(allow_hyphen_values = true)]
        revenue: String,
        /// Activity: vente, prestations, liberales
        #[arg(long = "type")]
        activity: Option<String>,
        /// Apply the ACRE discount (rate halved)
        #[arg(long)]
        acre: bool,
        /// Ignore the configured ACRE default for this calculation
        #[arg(long = "no-acre", conflicts_with = "acre")]
        no_acre: bool,
        /// Save the calculation to history
        #[arg(long)]
        save: bool,
    },
    /// List saved calculations, most recent first.
    History {
        /// Only show this year
        #[arg(long)]
        year: Option<i32>,
    },
    /// Delete one saved calculation.
    Delete {
        /// Calculation ID (see `microcalc history`)
        id: i64,
    },
    /// Delete every saved calculation.
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Annual revenue against the regime threshold.
    Threshold {
        /// Year to total (default: current year)
        #[arg(long)]
        year: Option<i32>,
        /// Activity: vente, prestations, liberales
        #[arg(long = "type")]
        activity: Option<String>,
    },
    /// Show data location and history size.
    Status,
    /// Copy the database to a backup file.
    Backup {
        /// Output path (default: <data-dir>/backups/microcalc-<timestamp>.db)
        #[arg(long)]
        output: Option<String>,
    },
}

pub(crate) fn resolve_activity(flag: Option<&str>, settings: &Settings) -> ActivityType {
    flag.map(ActivityType::from_tag).unwrap_or(settings.default_activity)
}

/// Explicit flags win over the configured default.
pub(crate) fn resolve_acre(acre: bool, no_acre: bool, settings: &Settings) -> bool {
    if no_acre {
        false
    } else {
        acre || settings.acre
    }
}

pub(crate) fn open_store() -> Result<(Settings, SqliteStore)> {
    let settings = load_settings();
    std::fs::create_dir_all(&settings.data_dir)?;
    let store = SqliteStore::open(&settings.db_path())?;
    Ok((settings, store))
}

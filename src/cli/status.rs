use std::path::PathBuf;

use microcalc::error::Result;
use microcalc::fmt::format_bytes;
use microcalc::settings::load_settings;
use microcalc::{CalculationStore, SqliteStore};

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = PathBuf::from(&settings.data_dir);
    let db_path = settings.db_path();

    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", db_path.display());
    println!(
        "Defaults:   {} ({}), ACRE {}",
        settings.default_activity.label(),
        settings.default_activity,
        if settings.acre { "on" } else { "off" }
    );

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let store = SqliteStore::open(&db_path)?;
        let records = store.list_all()?;
        println!();
        println!("Calculations:  {}", records.len());
        if let Some(latest) = records.first() {
            println!("Latest:        #{} ({})", latest.id, latest.period_label);
        }
    } else {
        println!();
        println!("Database not found. Run `microcalc init` to set up.");
    }

    Ok(())
}

use std::path::PathBuf;

use microcalc::error::Result;
use microcalc::models::ActivityType;
use microcalc::settings::{load_settings, save_settings, shellexpand_path};
use microcalc::SqliteStore;

pub fn run(data_dir: Option<String>, activity: Option<String>, acre: bool) -> Result<()> {
    let mut settings = load_settings();

    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    if let Some(tag) = activity {
        settings.default_activity = ActivityType::from_tag(&tag);
    }
    settings.acre = acre;

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;
    SqliteStore::open(&settings.db_path())?;
    save_settings(&settings)?;

    log::info!("Initialized data directory {}", resolved.display());
    println!("Initialized microcalc at {}", resolved.display());
    println!(
        "Default activity: {} ({}), ACRE: {}",
        settings.default_activity.label(),
        settings.default_activity,
        if settings.acre { "yes" } else { "no" }
    );
    Ok(())
}

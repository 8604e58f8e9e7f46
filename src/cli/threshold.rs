use chrono::{Datelike, Local};
use colored::Colorize;
use comfy_table::{Cell, Table};

use microcalc::charges::ThresholdStatus;
use microcalc::error::Result;
use microcalc::fmt::{euros, percent, progress, progress_bar};
use microcalc::quote;

use crate::cli::{open_store, resolve_activity};

pub fn run(year: Option<i32>, activity: Option<&str>) -> Result<()> {
    let (settings, store) = open_store()?;
    let activity = resolve_activity(activity, &settings);
    let year = year.unwrap_or_else(|| Local::now().year());
    let status = quote::threshold_status(&store, year, activity)?;
    print_status(&status);
    Ok(())
}

pub fn print_status(status: &ThresholdStatus) {
    let mut table = Table::new();
    table.set_header(vec![format!("Revenue {}", status.year), String::new()]);
    table.add_row(vec![Cell::new("Annual revenue"), Cell::new(euros(status.annual_revenue))]);
    table.add_row(vec![
        Cell::new(format!("Threshold ({})", status.activity.label())),
        Cell::new(euros(status.threshold)),
    ]);
    table.add_row(vec![Cell::new("Remaining"), Cell::new(euros(status.remaining))]);
    table.add_row(vec![
        Cell::new("Reached"),
        Cell::new(format!(
            "{} {}",
            progress_bar(status.percentage, 20),
            percent(progress(status.percentage))
        )),
    ]);
    println!("Threshold\n{table}");

    if status.over {
        println!(
            "{}",
            "Threshold exceeded: revenue is above the micro-entrepreneur limit."
                .red()
                .bold()
        );
    }
}

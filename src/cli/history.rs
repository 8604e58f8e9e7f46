use chrono::Local;
use colored::Colorize;
use comfy_table::{Cell, Table};

use microcalc::charges::annual_revenue_total;
use microcalc::error::Result;
use microcalc::fmt::euros;
use microcalc::CalculationStore;

use crate::cli::open_store;

pub fn list(year: Option<i32>) -> Result<()> {
    let (_, store) = open_store()?;
    let records = match year {
        Some(y) => store.list_by_year(y)?,
        None => store.list_all()?,
    };

    if records.is_empty() {
        println!("No saved calculations.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "ID",
        "Saved",
        "Period",
        "Activity",
        "Revenue",
        "Contributions",
        "Net income",
    ]);
    for r in &records {
        table.add_row(vec![
            Cell::new(r.id),
            Cell::new(r.timestamp.with_timezone(&Local).format("%d/%m/%Y %H:%M")),
            Cell::new(&r.period_label),
            Cell::new(r.activity_type.label()),
            Cell::new(euros(r.revenue)),
            Cell::new(euros(r.contributions)),
            Cell::new(euros(r.net_income)),
        ]);
    }
    println!("History\n{table}");

    if let Some(y) = year {
        println!("Total revenue {y}: {}", euros(annual_revenue_total(&records, y)));
    }
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let (_, store) = open_store()?;
    if store.delete_by_id(id)? {
        println!("Deleted calculation #{id}");
    } else {
        println!("No calculation #{id}, nothing deleted.");
    }
    Ok(())
}

pub fn clear(yes: bool) -> Result<()> {
    let (_, store) = open_store()?;
    if !yes {
        println!(
            "{}",
            "Delete ALL saved calculations? This cannot be undone. [y/N]: ".yellow()
        );
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !matches!(input.trim().to_lowercase().as_str(), "y" | "yes" | "o" | "oui") {
            println!("Cancelled.");
            return Ok(());
        }
    }
    let removed = store.delete_all()?;
    println!("Deleted {removed} calculation(s).");
    Ok(())
}

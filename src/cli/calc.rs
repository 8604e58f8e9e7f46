use chrono::{Datelike, Local};
use colored::Colorize;
use comfy_table::{Cell, Table};
use rust_decimal::Decimal;

use microcalc::charges::ThresholdStatus;
use microcalc::error::Result;
use microcalc::fmt::{euros, percent};
use microcalc::quote;
use microcalc::CalculationStore;

use crate::cli::{open_store, resolve_acre, resolve_activity};

pub fn run(
    revenue: &str,
    activity: Option<&str>,
    acre: bool,
    no_acre: bool,
    save: bool,
) -> Result<()> {
    let (settings, store) = open_store()?;
    let activity = resolve_activity(activity, &settings);
    let acre = resolve_acre(acre, no_acre, &settings);

    if let Err(e) = quote::parse_revenue(revenue) {
        if save {
            return Err(e.into());
        }
        println!("{}", format!("Invalid revenue ({e}), showing zero.").yellow());
    }
    let estimate = quote::estimate_input(revenue, activity, acre);

    let mut table = Table::new();
    table.set_header(vec!["", "Amount"]);
    table.add_row(vec![Cell::new("Activity"), Cell::new(activity.label())]);
    table.add_row(vec![
        Cell::new("Rate"),
        Cell::new(format!(
            "{}{}",
            percent(estimate.rate * Decimal::ONE_HUNDRED),
            if acre { " (ACRE)" } else { "" }
        )),
    ]);
    table.add_row(vec![Cell::new("Revenue"), Cell::new(euros(estimate.revenue))]);
    table.add_row(vec![
        Cell::new("Contributions".red().bold()),
        Cell::new(euros(estimate.contributions)),
    ]);
    table.add_row(vec![
        Cell::new("Net income".green().bold()),
        Cell::new(euros(estimate.net_income)),
    ]);
    println!("Estimate\n{table}");

    if save {
        let record = quote::save(&store, revenue, activity, acre, &Local::now())?;
        println!("Saved calculation #{} ({})", record.id, record.period_label);
    }

    let year = Local::now().year();
    let records = store.list_by_year(year)?;
    let status = ThresholdStatus::for_year(&records, year, activity);
    println!();
    crate::cli::threshold::print_status(&status);
    Ok(())
}

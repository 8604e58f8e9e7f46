use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Format an amount with two decimals and a euro suffix: 1234.5 -> "1234.50 €"
pub fn euros(val: Decimal) -> String {
    format!("{:.2} €", val.round_dp(2))
}

/// Format a percentage with two decimals: "79.49 %"
pub fn percent(val: Decimal) -> String {
    format!("{:.2} %", val.round_dp(2))
}

/// Clamp a threshold percentage into [0, 100] for progress display.
pub fn progress(val: Decimal) -> Decimal {
    val.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
}

/// Text progress bar of `width` cells for a percentage.
pub fn progress_bar(val: Decimal, width: usize) -> String {
    let filled = (progress(val) * Decimal::from(width) / Decimal::ONE_HUNDRED)
        .round()
        .to_usize()
        .unwrap_or(0)
        .min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

pub fn format_bytes(bytes: u64) -> String {
    match bytes {
        b if b >= 1024 * 1024 => format!("{:.1} MB", b as f64 / (1024.0 * 1024.0)),
        b if b >= 1024 => format!("{:.1} KB", b as f64 / 1024.0),
        b => format!("{b} B"),
    }
}

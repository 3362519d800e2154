// Invoice number assignment.
//
// Numbers are per-owner, per-calendar-month sequences in the form
// INV-{year}{month}-{sequence}, e.g. INV-202608-007. The sequence is
// 1 + the owner's invoice count inside the UTC month window; the repository
// serializes allocation with a unique index on invoice_number plus bounded
// retry of the whole create transaction.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};

use crate::core::{AppError, Result};

/// Attempts before numbering contention is surfaced as a retryable conflict
pub const MAX_NUMBERING_ATTEMPTS: u32 = 3;

/// Format an invoice number for a given period and sequence
pub fn format_invoice_number(year: i32, month: u32, sequence: i64) -> String {
    format!("INV-{}{:02}-{:03}", year, month, sequence)
}

/// Half-open UTC window [start of month, start of next month) containing `now`
pub fn month_window(now: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = month_start(now.year(), now.month())?;
    let end = if now.month() == 12 {
        month_start(now.year() + 1, 1)?
    } else {
        month_start(now.year(), now.month() + 1)?
    };

    Ok((start, end))
}

fn month_start(year: i32, month: u32) -> Result<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| AppError::internal(format!("Invalid period: {}-{}", year, month)))?;

    Ok(Utc.from_utc_datetime(&date))
}

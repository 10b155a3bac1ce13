// ABOUTME: Formats SMPP relative time values (YYMMDDhhmmss000R) for validity_period
// ABOUTME: Relative periods avoid depending on the local clock agreeing with the SMSC

use std::time::Duration;

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;
const DAYS_PER_MONTH: u64 = 30;
const MONTHS_PER_YEAR: u64 = 12;

/// Encodes `period` as an SMPP relative time string.
///
/// Each component is two digits, so periods are normalised carrying days
/// into 30-day months and months into years. Anything beyond 99 years is
/// clamped. Sub-second precision is dropped; the tenths digit is always 0.
///
/// ```
/// use smpp_session::datatypes::relative_time;
/// use std::time::Duration;
///
/// assert_eq!(relative_time(Duration::from_secs(10 * 60)), "000000001000000R");
/// ```
pub fn relative_time(period: Duration) -> String {
    let mut secs = period.as_secs();

    let mut days = secs / SECS_PER_DAY;
    secs %= SECS_PER_DAY;
    let hours = secs / SECS_PER_HOUR;
    secs %= SECS_PER_HOUR;
    let minutes = secs / SECS_PER_MINUTE;
    let seconds = secs % SECS_PER_MINUTE;

    let mut months = 0;
    if days > 99 {
        months = days / DAYS_PER_MONTH;
        days %= DAYS_PER_MONTH;
    }
    let years = (months / MONTHS_PER_YEAR).min(99);
    months %= MONTHS_PER_YEAR;

    format!("{years:02}{months:02}{days:02}{hours:02}{minutes:02}{seconds:02}000R")
}

//! Rounding and calendar helpers shared by the stages

use chrono::{Datelike, NaiveDate};

/// Round half away from zero to a fixed number of decimals
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Day of week numbered 1 = Sunday through 7 = Saturday, the convention
/// the downstream dashboard queries filter on
pub fn day_of_week(date: NaiveDate) -> u32 {
    date.weekday().number_from_sunday()
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(day_of_week(date), 1 | 7)
}

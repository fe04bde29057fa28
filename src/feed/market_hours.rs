//! US equity market session check

use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use chrono_tz::America::New_York;

/// Whether the regular US session (Mon-Fri 09:30-16:00 New York time) is open
///
/// Exchange holidays are not modelled.
pub fn is_market_open(at: DateTime<Utc>) -> bool {
    let local = at.with_timezone(&New_York);

    if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
        return false;
    }

    let (Some(open), Some(close)) = (
        NaiveTime::from_hms_opt(9, 30, 0),
        NaiveTime::from_hms_opt(16, 0, 0),
    ) else {
        return false;
    };

    let time = local.time();
    time >= open && time <= close
}

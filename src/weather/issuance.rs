//! Forecast issuance-time computation.
//!
//! Each upstream endpoint publishes on its own fixed schedule, and a
//! query must target the latest issuance not after the current moment:
//! asking for a not-yet-published base time returns no data. These are
//! pure functions of the wall clock so they can be pinned in tests.

use chrono::{Duration, NaiveDateTime, Timelike};

/// A resolved issuance timestamp in the split form the KMA APIs take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseTime {
    /// `YYYYMMDD`
    pub date: String,
    /// `HHMM`
    pub time: String,
}

impl BaseTime {
    /// Combined `YYYYMMDDHHMM` form used by the mid-range `tmFc` param.
    pub fn compact(&self) -> String {
        format!("{}{}", self.date, self.time)
    }
}

/// Current-conditions observations publish every hour on the hour.
pub fn hourly_base(now: NaiveDateTime) -> BaseTime {
    BaseTime {
        date: now.format("%Y%m%d").to_string(),
        time: format!("{:02}00", now.hour()),
    }
}

/// Short-range 3-day forecast issuance hours (eight per day).
const SHORT_FORECAST_HOURS: [u32; 8] = [2, 5, 8, 11, 14, 17, 20, 23];

/// Most recent short-range issuance not later than `now`. Before the
/// day's first issuance (02:00) this rolls back to yesterday 23:00.
pub fn short_forecast_base(now: NaiveDateTime) -> BaseTime {
    let latest = SHORT_FORECAST_HOURS
        .iter()
        .rev()
        .find(|&&h| now.hour() >= h);

    match latest {
        Some(&hour) => BaseTime {
            date: now.format("%Y%m%d").to_string(),
            time: format!("{hour:02}00"),
        },
        None => BaseTime {
            date: (now - Duration::days(1)).format("%Y%m%d").to_string(),
            time: "2300".to_string(),
        },
    }
}

/// Most recent mid-range issuance not later than `now`. Mid-range
/// forecasts publish twice daily at 06:00 and 18:00; before 06:00 this
/// rolls back to yesterday 18:00.
pub fn mid_forecast_base(now: NaiveDateTime) -> BaseTime {
    if now.hour() >= 18 {
        BaseTime {
            date: now.format("%Y%m%d").to_string(),
            time: "1800".to_string(),
        }
    } else if now.hour() >= 6 {
        BaseTime {
            date: now.format("%Y%m%d").to_string(),
            time: "0600".to_string(),
        }
    } else {
        BaseTime {
            date: (now - Duration::days(1)).format("%Y%m%d").to_string(),
            time: "1800".to_string(),
        }
    }
}

/// Hour-bucketed cache key component (`YYYYMMDDHH`). Entries roll over
/// naturally when the clock hour changes.
pub fn hour_bucket(now: NaiveDateTime) -> String {
    now.format("%Y%m%d%H").to_string()
}

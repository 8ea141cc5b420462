use std::fmt;
use std::ops::Sub;

use chrono::Timelike;
use serde::{Deserialize, Serialize};

const SECOND_MS: f64 = 1000.0;
const MINUTE_MS: f64 = 60.0 * SECOND_MS;
const HOUR_MS: f64 = 60.0 * MINUTE_MS;
const DAY_MS: f64 = 24.0 * HOUR_MS;

/// Milliseconds since local midnight. Schedules cover one service day, so a
/// day offset is all the engine ever compares.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Time(f64);

impl Time {
    pub fn from_millis(ms: f64) -> Time {
        Time(ms)
    }

    pub fn from_seconds(seconds: f64) -> Time {
        Time(seconds * SECOND_MS)
    }

    pub fn as_millis(self) -> f64 {
        self.0
    }

    /// The wall clock, as an offset into the current local day.
    // TODO Timezone awareness; the feed is authored for Europe/Amsterdam
    pub fn current_day_offset() -> Time {
        let now = chrono::Local::now().time();
        Time(f64::from(now.num_seconds_from_midnight()) * SECOND_MS
            + f64::from(now.nanosecond() / 1_000_000))
    }
}

impl fmt::Display for Time {
    /// "HH:MM", wrapping past-midnight times back into the day.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let into_day = self.0.rem_euclid(DAY_MS);
        let hours = (into_day / HOUR_MS).floor();
        let minutes = ((into_day - hours * HOUR_MS) / MINUTE_MS).floor();
        write!(f, "{:02}:{:02}", hours as u32, minutes as u32)
    }
}

impl Sub for Time {
    type Output = f64;

    /// Difference in milliseconds.
    fn sub(self, other: Time) -> f64 {
        self.0 - other.0
    }
}

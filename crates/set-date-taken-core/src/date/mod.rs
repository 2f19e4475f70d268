pub mod month;
pub mod resolve;
pub mod taken;

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Calendar date plus time of day, as stamped into the Date Taken tags.
///
/// Fields are plain integers so that parsed or user-supplied values can be
/// held before they are known to form a real date. Validity is never cached:
/// call [`DateValue::is_valid`] after the last field is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateValue {
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub hour: i32,
    pub minute: i32,
    pub second: i32,
}

impl DateValue {
    /// The undefined state: no date, midnight.
    pub const fn invalid() -> Self {
        Self {
            year: -1,
            month: -1,
            day: -1,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }

    pub fn new(year: i32, month: i32, day: i32, hour: i32, minute: i32, second: i32) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    /// True if the fields compose a real date-time with a four-digit year.
    pub fn is_valid(&self) -> bool {
        self.to_naive().is_some()
    }

    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        if !(1..=9999).contains(&self.year) {
            return None;
        }
        let date = NaiveDate::from_ymd_opt(
            self.year,
            u32::try_from(self.month).ok()?,
            u32::try_from(self.day).ok()?,
        )?;
        let time = NaiveTime::from_hms_opt(
            u32::try_from(self.hour).ok()?,
            u32::try_from(self.minute).ok()?,
            u32::try_from(self.second).ok()?,
        )?;
        Some(date.and_time(time))
    }

    pub fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay {
            hour: self.hour,
            minute: self.minute,
            second: self.second,
        }
    }

    /// Canonical EXIF text form, `YYYY:MM:DD HH:MM:SS`.
    pub fn format_date(&self) -> String {
        format!(
            "{:04}:{:02}:{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

impl Default for DateValue {
    fn default() -> Self {
        Self::invalid()
    }
}

impl fmt::Display for DateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_date())
    }
}

/// The year/month/day given on the command line, applied to every file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedDate {
    pub year: i32,
    pub month: i32,
    pub day: i32,
}

impl FixedDate {
    pub fn new(year: i32, month: i32, day: i32) -> Self {
        Self { year, month, day }
    }

    /// The fixed date at midnight, used to validate the date on its own.
    pub fn at_midnight(&self) -> DateValue {
        self.at(TimeOfDay::MIDNIGHT)
    }

    pub fn at(&self, time: TimeOfDay) -> DateValue {
        DateValue::new(
            self.year,
            self.month,
            self.day,
            time.hour,
            time.minute,
            time.second,
        )
    }

    pub fn is_valid(&self) -> bool {
        self.at_midnight().is_valid()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    pub hour: i32,
    pub minute: i32,
    pub second: i32,
}

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay {
        hour: 0,
        minute: 0,
        second: 0,
    };

    pub fn new(hour: i32, minute: i32, second: i32) -> Self {
        Self {
            hour,
            minute,
            second,
        }
    }
}

//! # RTC
//! Calendar types and the clock seam the alarm engine reads time through.

use embassy_time::Instant;

/// Day of the week, numbered the way the RTC does it (Sunday = 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DayOfWeek {
    /// 0
    Sunday = 0,
    /// 1
    Monday,
    /// 2
    Tuesday,
    /// 3
    Wednesday,
    /// 4
    Thursday,
    /// 5
    Friday,
    /// 6
    Saturday,
}

impl DayOfWeek {
    /// Build from a day number, wrapping modulo 7
    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        match index % 7 {
            0 => Self::Sunday,
            1 => Self::Monday,
            2 => Self::Tuesday,
            3 => Self::Wednesday,
            4 => Self::Thursday,
            5 => Self::Friday,
            _ => Self::Saturday,
        }
    }

    /// Day number, Sunday = 0
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Bit of this day in a weekday mask
    #[must_use]
    pub const fn mask(self) -> u8 {
        1 << (self as u8)
    }
}

/// Local calendar date and wall-clock time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    /// Full year, e.g. 2024
    pub year: u16,
    /// 1-12
    pub month: u8,
    /// 1-31
    pub day: u8,
    /// Weekday
    pub day_of_week: DayOfWeek,
    /// 0-23
    pub hour: u8,
    /// 0-59
    pub minute: u8,
    /// 0-59
    pub second: u8,
}

/// Seconds per day
const SECS_PER_DAY: u32 = 86_400;

impl DateTime {
    /// Convert seconds since 1970-01-01 00:00:00 into a calendar date.
    /// 1970-01-01 was a Thursday.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_unix(secs: u32) -> Self {
        let mut days = secs / SECS_PER_DAY;
        let rem = secs % SECS_PER_DAY;
        let day_of_week = DayOfWeek::from_index(((days + 4) % 7) as u8);

        let mut year: u16 = 1970;
        loop {
            let year_days = if is_leap_year(year) { 366 } else { 365 };
            if days < year_days {
                break;
            }
            days -= year_days;
            year += 1;
        }

        let mut month: u8 = 1;
        loop {
            let month_days = days_in_month(month, year) as u32;
            if days < month_days {
                break;
            }
            days -= month_days;
            month += 1;
        }

        Self {
            year,
            month,
            day: days as u8 + 1,
            day_of_week,
            hour: (rem / 3600) as u8,
            minute: ((rem % 3600) / 60) as u8,
            second: (rem % 60) as u8,
        }
    }

    /// Minutes since midnight
    #[must_use]
    pub const fn minute_of_day(&self) -> u16 {
        self.hour as u16 * 60 + self.minute as u16
    }
}

/// Get the number of days in a month
const fn days_in_month(month: u8, year: u16) -> u8 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 31,
    }
}

/// Check if a year is a leap year
const fn is_leap_year(year: u16) -> bool {
    year.is_multiple_of(4) && !year.is_multiple_of(100) || year.is_multiple_of(400)
}

/// Time sources of the clock.
///
/// `now` is the free-running millisecond timer, which stops while the CPU
/// sleeps. `epoch` comes from the RTC and keeps counting through sleep, so
/// anything spanning minutes (the snooze window) is measured with it.
pub trait Clock {
    /// Millisecond timer
    fn now(&self) -> Instant;
    /// RTC seconds since the unix epoch, UTC
    fn epoch(&self) -> u32;
    /// Local wall-clock time
    fn local_time(&self) -> DateTime;
}

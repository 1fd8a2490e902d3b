use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DayIdError;

// Four digit years only, so the string form always sorts chronologically
const MIN_YEAR: i32 = 0;
const MAX_YEAR: i32 = 9999;

/// A calendar day in UTC. This is the key of every journal record.
///
/// The string form is always `YYYY-MM-DD`, which means comparing two
/// serialized ids as strings gives the same answer as comparing the dates.
/// Range subscriptions against the record store depend on that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayId(NaiveDate);

impl DayId {
    /// `month` is 1-based. Returns `None` for impossible dates and for years
    /// that don't fit in four digits.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).and_then(Self::from_date)
    }

    pub fn from_date(date: NaiveDate) -> Option<Self> {
        if (MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
            Some(Self(date))
        } else {
            None
        }
    }

    /// The first representable day, `0000-01-01`.
    pub fn earliest() -> Self {
        Self(NaiveDate::from_yo_opt(MIN_YEAR, 1).unwrap_or(NaiveDate::MIN))
    }

    /// Today's date in UTC.
    pub fn today_utc() -> Self {
        Self(Utc::now().date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// 1-based month
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// 0-based month, the way calendar sections are indexed
    pub fn month_index(&self) -> u32 {
        self.0.month0()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    /// Move by `days` (negative goes back in time). `None` when the result
    /// leaves the representable range.
    pub fn checked_shift(&self, days: i64) -> Option<Self> {
        self.0
            .checked_add_signed(Duration::days(days))
            .and_then(Self::from_date)
    }

    /// The day `n` days before this one.
    pub fn checked_days_ago(&self, n: u64) -> Option<Self> {
        let n = i64::try_from(n).ok()?;
        self.checked_shift(-n)
    }

    pub fn prev(&self) -> Option<Self> {
        self.checked_shift(-1)
    }

    pub fn next(&self) -> Option<Self> {
        self.checked_shift(1)
    }

    /// Strictly after `today`. Future days are never navigable and never
    /// show cover imagery.
    pub fn is_future(&self, today: DayId) -> bool {
        *self > today
    }

    /// `MM-DD-YYYY`, the header format of the entry screen.
    pub fn format_mdy(&self) -> String {
        format!("{:02}-{:02}-{:04}", self.month(), self.day(), self.year())
    }

    /// Split into the pieces a list card shows: `JUN`, `01`, `2024`.
    pub fn parts(&self) -> DayParts {
        DayParts {
            month: self.0.format("%b").to_string().to_uppercase(),
            day: format!("{:02}", self.day()),
            year: format!("{:04}", self.year()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayParts {
    pub month: String,
    pub day: String,
    pub year: String,
}

impl fmt::Display for DayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.year(),
            self.month(),
            self.day()
        )
    }
}

impl FromStr for DayId {
    type Err = DayIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
            return Err(DayIdError::Malformed(s.to_owned()));
        }

        let digits_ok = bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
        if !digits_ok {
            return Err(DayIdError::Malformed(s.to_owned()));
        }

        // all ascii digits at this point
        let year: i32 = s[0..4].parse().map_err(|_| DayIdError::Malformed(s.to_owned()))?;
        let month: u32 = s[5..7].parse().map_err(|_| DayIdError::Malformed(s.to_owned()))?;
        let day: u32 = s[8..10].parse().map_err(|_| DayIdError::Malformed(s.to_owned()))?;

        DayId::from_ymd(year, month, day).ok_or_else(|| DayIdError::NoSuchDay(s.to_owned()))
    }
}

impl Serialize for DayId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DayId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

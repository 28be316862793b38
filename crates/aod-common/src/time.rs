//! Daily partition keys.
//!
//! Granules and composites are partitioned by a 7-digit `YYYYDDD` code
//! (year followed by day of year), the same code MODIS embeds in its
//! filenames as `.AYYYYDDD.`.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Year + day-of-year identifying one daily partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey {
    year: i32,
    ordinal: u32,
}

impl DateKey {
    /// Build a key, rejecting ordinals that do not exist in `year`.
    pub fn new(year: i32, ordinal: u32) -> Result<Self, DateKeyError> {
        NaiveDate::from_yo_opt(year, ordinal)
            .ok_or(DateKeyError::InvalidOrdinal { year, ordinal })?;
        Ok(Self { year, ordinal })
    }

    /// Parse exactly seven ASCII digits, e.g. `2019296`.
    pub fn parse(s: &str) -> Result<Self, DateKeyError> {
        if s.len() != 7 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DateKeyError::InvalidFormat(s.to_string()));
        }
        let year: i32 = s[..4]
            .parse()
            .map_err(|_| DateKeyError::InvalidFormat(s.to_string()))?;
        let ordinal: u32 = s[4..]
            .parse()
            .map_err(|_| DateKeyError::InvalidFormat(s.to_string()))?;
        Self::new(year, ordinal)
    }

    /// Find the `.AYYYYDDD.` acquisition code in a granule filename.
    pub fn find_in_filename(name: &str) -> Option<Self> {
        let bytes = name.as_bytes();
        name.match_indices(".A").find_map(|(pos, _)| {
            let start = pos + 2;
            let end = start + 7;
            if bytes.get(end) != Some(&b'.') {
                return None;
            }
            Self::parse(name.get(start..end)?).ok()
        })
    }

    /// Parse the key from the first seven characters of a name like `2019296_merged.tif`.
    pub fn from_prefix(name: &str) -> Option<Self> {
        name.get(..7).and_then(|s| Self::parse(s).ok())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            ordinal: date.ordinal(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    /// Calendar date of this key.
    pub fn to_date(&self) -> NaiveDate {
        // Validated on construction.
        NaiveDate::from_yo_opt(self.year, self.ordinal).unwrap_or_default()
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:03}", self.year, self.ordinal)
    }
}

impl FromStr for DateKey {
    type Err = DateKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DateKey {
    type Error = DateKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DateKey> for String {
    fn from(key: DateKey) -> Self {
        key.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateKeyError {
    #[error("Invalid date key '{0}': expected 7 digits YYYYDDD")]
    InvalidFormat(String),

    #[error("Day {ordinal} does not exist in {year}")]
    InvalidOrdinal { year: i32, ordinal: u32 },
}

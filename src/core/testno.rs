//! Test numbers: type code + YYMMDD date stamp + two-digit daily counter
//!
//! `AR25060103` is the third raw material received on 2025-06-01. Because the
//! stamp and the counter are fixed width, same-day numbers sort
//! lexicographically in counter order.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::core::error::{InventoryError, Result};

/// Highest counter value a single day can hand out
pub const MAX_SEQUENCE: u8 = 99;

/// Length of a complete test number
pub const TEST_NUMBER_LEN: usize = 10;

/// Length of the type code + date stamp prefix
pub const PREFIX_LEN: usize = 8;

/// Record type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TypeCode {
    /// Raw material receiving
    Ar,
    /// Packing material receiving
    Ap,
}

impl TypeCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeCode::Ar => "AR",
            TypeCode::Ap => "AP",
        }
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TypeCode {
    type Err = TestNumberError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "AR" => Ok(TypeCode::Ar),
            "AP" => Ok(TypeCode::Ap),
            _ => Err(TestNumberError::InvalidTypeCode(s.to_string())),
        }
    }
}

/// A validated test number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TestNumber {
    code: TypeCode,
    date: NaiveDate,
    sequence: u8,
}

impl TestNumber {
    /// Build a test number from its parts
    pub fn new(code: TypeCode, date: NaiveDate, sequence: u8) -> std::result::Result<Self, TestNumberError> {
        if sequence == 0 || sequence > MAX_SEQUENCE {
            return Err(TestNumberError::SequenceOutOfRange(sequence.into()));
        }
        if !(2000..=2099).contains(&date.year()) {
            return Err(TestNumberError::YearOutOfRange(date.year()));
        }
        Ok(Self {
            code,
            date,
            sequence,
        })
    }

    pub fn type_code(&self) -> TypeCode {
        self.code
    }

    /// Calendar date encoded in the stamp (years are read as 20YY)
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn sequence(&self) -> u8 {
        self.sequence
    }

    /// The `AR250601` part shared by every number of that type and day
    pub fn prefix(&self) -> String {
        prefix_for(self.code, self.date)
    }

    pub fn parse(s: &str) -> std::result::Result<Self, TestNumberError> {
        s.parse()
    }
}

impl fmt::Display for TestNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:02}", self.prefix(), self.sequence)
    }
}

impl FromStr for TestNumber {
    type Err = TestNumberError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.len() != TEST_NUMBER_LEN || !s.is_ascii() {
            return Err(TestNumberError::InvalidLength(s.to_string()));
        }

        let code: TypeCode = s[..2].parse()?;
        let stamp = &s[2..PREFIX_LEN];
        let counter = &s[PREFIX_LEN..];

        if !stamp.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TestNumberError::InvalidDateStamp(stamp.to_string()));
        }
        let yy: i32 = stamp[0..2].parse().unwrap_or(0);
        let mm: u32 = stamp[2..4].parse().unwrap_or(0);
        let dd: u32 = stamp[4..6].parse().unwrap_or(0);
        let date = NaiveDate::from_ymd_opt(2000 + yy, mm, dd)
            .ok_or_else(|| TestNumberError::InvalidDateStamp(stamp.to_string()))?;

        let sequence = parse_counter(counter)
            .ok_or_else(|| TestNumberError::InvalidCounter(counter.to_string()))?;

        Self::new(code, date, sequence)
    }
}

impl Serialize for TestNumber {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TestNumber {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl rusqlite::ToSql for TestNumber {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(rusqlite::types::ToSqlOutput::from(self.to_string()))
    }
}

impl rusqlite::types::FromSql for TestNumber {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: TestNumberError| rusqlite::types::FromSqlError::Other(Box::new(e)))
    }
}

/// Errors that can occur when parsing test numbers
#[derive(Debug, Error)]
pub enum TestNumberError {
    #[error("invalid type code '{0}' (valid: AR, AP)")]
    InvalidTypeCode(String),

    #[error("test number '{0}' must be exactly 10 characters, e.g. AR25060101")]
    InvalidLength(String),

    #[error("invalid date stamp '{0}' (expected YYMMDD)")]
    InvalidDateStamp(String),

    #[error("invalid counter '{0}' (expected 01-99)")]
    InvalidCounter(String),

    #[error("counter {0} is outside 01-99")]
    SequenceOutOfRange(u32),

    #[error("year {0} cannot be stamped (test numbers cover 2000-2099)")]
    YearOutOfRange(i32),
}

impl From<TestNumberError> for InventoryError {
    fn from(err: TestNumberError) -> Self {
        InventoryError::Validation(err.to_string())
    }
}

/// Zero-padded `YYMMDD` for a calendar date
pub fn date_stamp(date: NaiveDate) -> String {
    format!(
        "{:02}{:02}{:02}",
        date.year().rem_euclid(100),
        date.month(),
        date.day()
    )
}

/// Type code + date stamp, e.g. `AP250601`
pub fn prefix_for(code: TypeCode, date: NaiveDate) -> String {
    format!("{}{}", code, date_stamp(date))
}

fn parse_counter(counter: &str) -> Option<u8> {
    if counter.len() != 2 || !counter.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    counter.parse().ok()
}

/// Derive the next test number for `date` from the numbers already issued
///
/// `existing` may contain numbers for other days or types; only those sharing
/// the computed prefix are considered. Entries whose counter is not two digits
/// are skipped. Nothing is reserved: the caller still has to insert under the
/// storage uniqueness constraint.
pub fn next_test_number<I, S>(code: TypeCode, date: NaiveDate, existing: I) -> Result<TestNumber>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let prefix = prefix_for(code, date);

    let last = existing
        .into_iter()
        .filter_map(|tn| {
            let tn = tn.as_ref();
            if tn.len() == TEST_NUMBER_LEN && tn.starts_with(&prefix) {
                parse_counter(&tn[PREFIX_LEN..])
            } else {
                None
            }
        })
        .max()
        .unwrap_or(0);

    if last >= MAX_SEQUENCE {
        return Err(InventoryError::CapacityExceeded { prefix });
    }

    Ok(TestNumber::new(code, date, last + 1)?)
}

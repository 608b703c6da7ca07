use std::{
    error::Error,
    fmt::{Display, Formatter},
    str::FromStr,
};

use chrono::{Datelike, NaiveDate};

pub const MIN_YEAR: i32 = 1900;

/// A validated birth date, displayed as `DD.MM.YYYY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BirthDate(NaiveDate);

impl Display for BirthDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%d.%m.%Y"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    Format,
    Day(u32),
    Month(u32),
    Year(i32),
    NoSuchDate,
    InFuture,
}

impl Display for DateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use DateError::*;
        match self {
            Format => write!(f, "expected DD.MM.YYYY"),
            Day(day) => write!(f, "day {day} is out of range"),
            Month(month) => write!(f, "month {month} is out of range"),
            Year(year) => write!(f, "year {year} is out of range"),
            NoSuchDate => write!(f, "no such calendar date"),
            InFuture => write!(f, "date is in the future"),
        }
    }
}

impl Error for DateError {}

/// Parses `DD.MM.YYYY` (day and month may be a single digit) and checks it
/// is a real date between 1900 and `today`.
pub fn parse_birth_date(input: &str, today: NaiveDate) -> Result<BirthDate, DateError> {
    let parts: Vec<&str> = input.trim().split('.').collect();
    let [day, month, year] = parts.as_slice() else {
        return Err(DateError::Format);
    };

    let day: u32 = component(day, 1..=2)?;
    let month: u32 = component(month, 1..=2)?;
    let year: i32 = component(year, 4..=4)?;

    if !(1..=31).contains(&day) {
        return Err(DateError::Day(day));
    }
    if !(1..=12).contains(&month) {
        return Err(DateError::Month(month));
    }
    if !(MIN_YEAR..=today.year()).contains(&year) {
        return Err(DateError::Year(year));
    }

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(DateError::NoSuchDate)?;
    if date > today {
        return Err(DateError::InFuture);
    }
    Ok(BirthDate(date))
}

fn component<T: FromStr>(
    part: &str,
    digits: std::ops::RangeInclusive<usize>,
) -> Result<T, DateError> {
    if !digits.contains(&part.len()) || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DateError::Format);
    }
    part.parse().map_err(|_| DateError::Format)
}

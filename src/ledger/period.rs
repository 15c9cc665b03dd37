//! Calendar periods in the reporting offset.

use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::error::{AppError, AppResult};

/// Every instant from `start` up to, but excluding, `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

fn first_instant(year: i32, month: Month, offset: UtcOffset) -> AppResult<OffsetDateTime> {
    let date = Date::from_calendar_date(year, month, 1)
        .map_err(|_| AppError::validation(format!("Year {year} is out of range")))?;
    Ok(PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_offset(offset))
}

fn following_year(year: i32) -> AppResult<i32> {
    year.checked_add(1)
        .ok_or_else(|| AppError::validation(format!("Year {year} is out of range")))
}

impl Period {
    /// The calendar month `month` (1-12) of `year`.
    pub fn month(year: i32, month: u8, offset: UtcOffset) -> AppResult<Self> {
        let month = Month::try_from(month)
            .map_err(|_| AppError::validation("Month must be between 1 and 12"))?;
        let (next_year, next_month) = match month {
            Month::December => (following_year(year)?, Month::January),
            m => (year, m.next()),
        };
        Ok(Self {
            start: first_instant(year, month, offset)?,
            end: first_instant(next_year, next_month, offset)?,
        })
    }

    pub fn year(year: i32, offset: UtcOffset) -> AppResult<Self> {
        Ok(Self {
            start: first_instant(year, Month::January, offset)?,
            end: first_instant(following_year(year)?, Month::January, offset)?,
        })
    }
}

/// Parses the `month` and `year` query values of a summary request.
pub fn parse_month_year(month: Option<&str>, year: Option<&str>) -> AppResult<(i32, u8)> {
    let (Some(month), Some(year)) = (
        month.filter(|m| !m.trim().is_empty()),
        year.filter(|y| !y.trim().is_empty()),
    ) else {
        return Err(AppError::validation("Month and year are required"));
    };
    let month = month
        .trim()
        .parse::<u8>()
        .map_err(|_| AppError::validation("Month must be between 1 and 12"))?;
    Ok((parse_year(year)?, month))
}

pub fn parse_year(year: &str) -> AppResult<i32> {
    year.trim()
        .parse::<i32>()
        .map_err(|_| AppError::validation("Year must be a number"))
}

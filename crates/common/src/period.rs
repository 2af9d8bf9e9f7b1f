use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A calendar month. Income, budgets and expenses are all scoped by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthYear {
    pub year: i32,
    pub month: u32,
}

impl MonthYear {
    pub fn new(month: u32, year: i32) -> Result<Self, String> {
        if !(1..=12).contains(&month) {
            return Err(format!("Invalid month {}. Expected 1-12", month));
        }
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(format!("Invalid year {}", year));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self { year: date.year(), month: date.month() }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn last_day(&self) -> NaiveDate {
        let first = self.first_day();
        (first + chrono::Months::new(1)).pred_opt().unwrap_or(first)
    }

    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// `YYYY-MM`, the form SQLite's `strftime('%Y-%m', ...)` produces.
    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Optional `?month&year` query parameters; missing parts fall back to today.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct MonthQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

impl MonthQuery {
    pub fn resolve(&self, today: NaiveDate) -> Result<MonthYear, String> {
        MonthYear::new(
            self.month.unwrap_or_else(|| today.month()),
            self.year.unwrap_or_else(|| today.year()),
        )
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| "Invalid date format, expected YYYY-MM-DD".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_bounds() {
        let feb = MonthYear::new(2, 2028).unwrap();
        assert_eq!(feb.days_in_month(), 29);
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2028, 2, 29).unwrap());
        assert_eq!(feb.key(), "2028-02");
    }

    #[test]
    fn test_invalid_month_rejected() {
        assert!(MonthYear::new(0, 2026).is_err());
        assert!(MonthYear::new(13, 2026).is_err());
    }

    #[test]
    fn test_query_falls_back_to_today() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let resolved = MonthQuery { month: None, year: Some(2025) }.resolve(today).unwrap();
        assert_eq!(resolved, MonthYear { year: 2025, month: 10 });

        let resolved = MonthQuery::default().resolve(today).unwrap();
        assert_eq!(resolved, MonthYear { year: 2026, month: 10 });
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2026-01-31").unwrap(), NaiveDate::from_ymd_opt(2026, 1, 31).unwrap());
        assert!(parse_date("31/01/2026").is_err());
    }
}

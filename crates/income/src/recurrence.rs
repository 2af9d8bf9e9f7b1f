//! Expands recurring income rows into the dates they pay out on.
//!
//! A recurring row stands for every occurrence from its start date onward.
//! A child row (one with `parent_income_id`) is a materialized occurrence: it
//! counts once on its own date and replaces the parent's occurrence there.

use crate::models::{Income, MonthlyIncome, Occurrence};
use chrono::{Datelike, NaiveDate};
use common::MonthYear;
use std::collections::{HashMap, HashSet};

/// Dates in `month` on which an income starting at `start` pays out.
pub fn occurrences_in_month(start: NaiveDate, occurrence: Occurrence, month: MonthYear) -> Vec<NaiveDate> {
    let first = month.first_day();
    let last = month.last_day();
    if start > last {
        return Vec::new();
    }

    match occurrence {
        Occurrence::Once => {
            if month.contains(start) { vec![start] } else { Vec::new() }
        }
        Occurrence::Daily => {
            let from = start.max(first);
            from.iter_days().take_while(|d| *d <= last).collect()
        }
        Occurrence::Weekly => {
            let from = start.max(first);
            let offset = (from - start).num_days();
            let skip = (7 - offset % 7) % 7;
            let mut dates = Vec::new();
            let mut day = from + chrono::Duration::days(skip);
            while day <= last {
                dates.push(day);
                day += chrono::Duration::days(7);
            }
            dates
        }
        Occurrence::Monthly => {
            let day = clamp_day(month, start.day());
            if day >= start { vec![day] } else { Vec::new() }
        }
        Occurrence::Yearly => {
            if month.month != start.month() {
                return Vec::new();
            }
            let day = clamp_day(month, start.day());
            if day >= start { vec![day] } else { Vec::new() }
        }
    }
}

fn clamp_day(month: MonthYear, day: u32) -> NaiveDate {
    let day = day.min(month.days_in_month());
    NaiveDate::from_ymd_opt(month.year, month.month, day).unwrap_or_else(|| month.last_day())
}

/// Sums every occurrence of `incomes` that falls in `month`.
pub fn monthly_income(incomes: &[Income], month: MonthYear) -> MonthlyIncome {
    let mut materialized: HashMap<i64, HashSet<NaiveDate>> = HashMap::new();
    for child in incomes.iter().filter(|i| i.parent_income_id.is_some()) {
        if let Some(parent) = child.parent_income_id {
            materialized.entry(parent).or_default().insert(child.date);
        }
    }

    let mut total = 0;
    let mut count = 0;
    for income in incomes {
        let dates = income_dates_in_month(income, month);
        let replaced = materialized.get(&income.id);
        for date in dates {
            if replaced.is_some_and(|set| set.contains(&date)) {
                continue;
            }
            total += income.amount;
            count += 1;
        }
    }

    MonthlyIncome { has_income: count > 0, total_income: total }
}

/// Dates `income` itself contributes in `month`, before child replacement.
pub fn income_dates_in_month(income: &Income, month: MonthYear) -> Vec<NaiveDate> {
    if income.parent_income_id.is_some() || !income.is_recurring {
        return occurrences_in_month(income.date, Occurrence::Once, month);
    }
    occurrences_in_month(income.date, income.occurrence, month)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IncomeType;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn month(m: u32, y: i32) -> MonthYear {
        MonthYear::new(m, y).unwrap()
    }

    fn income(id: i64, amount: i64, start: NaiveDate, occurrence: Occurrence, parent: Option<i64>) -> Income {
        Income {
            id,
            user_id: 1,
            income_type: IncomeType::Active,
            source: "Employer".into(),
            title: "Salary".into(),
            amount,
            date: start,
            occurrence,
            is_recurring: occurrence.is_recurring() && parent.is_none(),
            parent_income_id: parent,
        }
    }

    #[test]
    fn test_once_only_in_its_month() {
        assert_eq!(occurrences_in_month(date(2026, 3, 5), Occurrence::Once, month(3, 2026)), vec![date(2026, 3, 5)]);
        assert!(occurrences_in_month(date(2026, 3, 5), Occurrence::Once, month(4, 2026)).is_empty());
    }

    #[test]
    fn test_daily_counts_days_from_start() {
        assert_eq!(occurrences_in_month(date(2026, 4, 21), Occurrence::Daily, month(4, 2026)).len(), 10);
        assert_eq!(occurrences_in_month(date(2026, 1, 1), Occurrence::Daily, month(2, 2026)).len(), 28);
    }

    #[test]
    fn test_weekly_keeps_weekday() {
        // 2026-03-02 is a Monday
        let dates = occurrences_in_month(date(2026, 3, 2), Occurrence::Weekly, month(4, 2026));
        assert_eq!(dates, vec![date(2026, 4, 6), date(2026, 4, 13), date(2026, 4, 20), date(2026, 4, 27)]);
        assert!(dates.iter().all(|d| d.weekday() == chrono::Weekday::Mon));
    }

    #[test]
    fn test_monthly_clamps_to_month_end() {
        let dates = occurrences_in_month(date(2026, 1, 31), Occurrence::Monthly, month(2, 2026));
        assert_eq!(dates, vec![date(2026, 2, 28)]);
    }

    #[test]
    fn test_nothing_before_start() {
        assert!(occurrences_in_month(date(2026, 5, 1), Occurrence::Monthly, month(4, 2026)).is_empty());
        assert!(occurrences_in_month(date(2026, 5, 1), Occurrence::Daily, month(4, 2026)).is_empty());
    }

    #[test]
    fn test_yearly_only_in_anniversary_month() {
        assert_eq!(occurrences_in_month(date(2024, 2, 29), Occurrence::Yearly, month(2, 2026)), vec![date(2026, 2, 28)]);
        assert!(occurrences_in_month(date(2024, 2, 29), Occurrence::Yearly, month(3, 2026)).is_empty());
    }

    #[test]
    fn test_monthly_income_sums_recurring_and_one_off() {
        let incomes = vec![
            income(1, 2000_00, date(2026, 1, 25), Occurrence::Monthly, None),
            income(2, 150_00, date(2026, 3, 10), Occurrence::Once, None),
            income(3, 999_00, date(2026, 2, 10), Occurrence::Once, None),
        ];
        let result = monthly_income(&incomes, month(3, 2026));
        assert!(result.has_income);
        assert_eq!(result.total_income, 2150_00);
    }

    #[test]
    fn test_child_replaces_parent_occurrence() {
        let incomes = vec![
            income(1, 2000_00, date(2026, 1, 25), Occurrence::Monthly, None),
            income(2, 2100_00, date(2026, 3, 25), Occurrence::Once, Some(1)),
        ];
        let result = monthly_income(&incomes, month(3, 2026));
        assert_eq!(result.total_income, 2100_00);

        let result = monthly_income(&incomes, month(4, 2026));
        assert_eq!(result.total_income, 2000_00);
    }

    #[test]
    fn test_empty_month_has_no_income() {
        let incomes = vec![income(1, 2000_00, date(2026, 6, 1), Occurrence::Monthly, None)];
        let result = monthly_income(&incomes, month(5, 2026));
        assert_eq!(result, MonthlyIncome { has_income: false, total_income: 0 });
    }
}

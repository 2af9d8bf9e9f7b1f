use crate::money::format_money;
use crate::{Rejection, ValidationCode};

/// What is being checked against the month's income; only changes wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Budget,
    Expense,
}

impl Subject {
    fn noun(&self) -> &'static str {
        match self {
            Subject::Budget => "budget",
            Subject::Expense => "expense",
        }
    }
}

/// The hard rule: a month's budgets, or a month's expenses, may never add up
/// to more than the income recorded for that month.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomeCeiling {
    subject: Subject,
    month: String,
    has_income: bool,
    total_income: i64,
}

impl IncomeCeiling {
    pub fn new(subject: Subject, month: impl Into<String>, has_income: bool, total_income: i64) -> Self {
        Self { subject, month: month.into(), has_income, total_income }
    }

    pub fn total_income(&self) -> i64 {
        self.total_income
    }

    /// Income left once `committed` is taken out. Negative when already over.
    pub fn remaining(&self, committed: i64) -> i64 {
        self.total_income - committed
    }

    /// Accepts when `committed + requested <= total_income`.
    pub fn check(&self, committed: i64, requested: i64) -> Result<(), Rejection> {
        if !self.has_income {
            return Err(Rejection {
                code: ValidationCode::NoIncome,
                overage: None,
                message: format!(
                    "No income recorded for {}. Please add income before adding a {}.",
                    self.month,
                    self.subject.noun()
                ),
            });
        }

        let Some(prospective) = committed.checked_add(requested) else {
            return Err(Rejection {
                code: ValidationCode::ExceedsIncome,
                overage: None,
                message: format!("The {} amount is larger than any income for {}.", self.subject.noun(), self.month),
            });
        };
        if prospective > self.total_income {
            let overage = prospective - self.total_income;
            let message = match self.subject {
                Subject::Budget => format!(
                    "Budget target exceeds the remaining income for {} by {}. Remaining: {}.",
                    self.month,
                    format_money(overage),
                    format_money(self.remaining(committed).max(0))
                ),
                Subject::Expense => format!(
                    "This expense exceeds your income for {} by {}. Remaining: {}.",
                    self.month,
                    format_money(overage),
                    format_money(self.remaining(committed).max(0))
                ),
            };
            return Err(Rejection {
                code: ValidationCode::ExceedsIncome,
                overage: Some(overage),
                message,
            });
        }

        Ok(())
    }
}

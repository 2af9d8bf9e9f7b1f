//! Rules deciding whether a budget or expense mutation may be written.
//!
//! Two stages run in sequence. [`IncomeCeiling`] is authoritative: a failure
//! is a [`Rejection`] and nothing is persisted. [`CategoryThreshold`] is
//! advisory: it only ever produces a [`BudgetWarning`] attached to an
//! accepted mutation. Neither stage touches storage; callers gather the
//! numbers and hand them in.

pub mod ceiling;
pub mod money;
pub mod phase;
pub mod threshold;

pub use ceiling::{IncomeCeiling, Subject};
pub use money::{format_money, to_amount, to_cents, MAX_AMOUNT};
pub use phase::{MutationAttempt, MutationPhase};
pub use threshold::{BudgetWarning, CategoryThreshold, WarningLevel};

use serde::Serialize;

/// Hard-block codes. These strings are part of the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    NoIncome,
    ExceedsIncome,
}

impl ValidationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationCode::NoIncome => "NO_INCOME",
            ValidationCode::ExceedsIncome => "EXCEEDS_INCOME",
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct Rejection {
    pub code: ValidationCode,
    /// Cents over the ceiling, present for `EXCEEDS_INCOME` unless the
    /// requested sum does not fit in cents at all.
    pub overage: Option<i64>,
    pub message: String,
}

/// Outcome of an accepted mutation.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Verdict {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<BudgetWarning>,
}

/// Runs the ceiling stage and, only if it passes, the threshold stage.
///
/// `committed` is what already counts against the month's income (net of any
/// amount being replaced) and `requested` is the new amount.
/// `category_total` is the category's prospective spend including `requested`.
pub fn evaluate(
    ceiling: &IncomeCeiling,
    committed: i64,
    requested: i64,
    threshold: Option<(&CategoryThreshold, i64)>,
) -> Result<Verdict, Rejection> {
    ceiling.check(committed, requested)?;

    let warning = threshold.and_then(|(stage, category_total)| stage.evaluate(category_total));
    Ok(Verdict { warning })
}

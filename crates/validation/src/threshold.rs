use crate::money::format_money;
use serde::Serialize;

pub const APPROACHING_PERCENT: f64 = 80.0;
pub const EXCEEDED_PERCENT: f64 = 100.0;
pub const WARNING_CODE: &str = "CATEGORY_BUDGET_WARNING";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningLevel {
    Approaching,
    Exceeded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetWarning {
    pub code: &'static str,
    pub level: WarningLevel,
    /// `None` when the target is zero.
    pub percentage: Option<f64>,
    pub message: String,
}

/// `total / target * 100`, or `None` for a zero target.
pub fn budget_percentage(total: i64, target: i64) -> Option<f64> {
    if target <= 0 {
        return None;
    }
    Some((total as f64 * 100.0) / target as f64)
}

pub fn classify_percentage(percentage: f64) -> Option<WarningLevel> {
    if percentage >= EXCEEDED_PERCENT {
        Some(WarningLevel::Exceeded)
    } else if percentage >= APPROACHING_PERCENT {
        Some(WarningLevel::Approaching)
    } else {
        None
    }
}

/// The advisory rule: warn when a category's spend nears or passes its target.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryThreshold {
    category_name: String,
    target_amount: i64,
}

impl CategoryThreshold {
    pub fn new(category_name: impl Into<String>, target_amount: i64) -> Self {
        Self { category_name: category_name.into(), target_amount }
    }

    pub fn evaluate(&self, prospective_total: i64) -> Option<BudgetWarning> {
        self.classify(budget_percentage(prospective_total, self.target_amount), prospective_total)
    }

    /// Same as [`evaluate`](Self::evaluate) for a percentage worked out by the caller.
    pub fn classify(&self, percentage: Option<f64>, prospective_total: i64) -> Option<BudgetWarning> {
        let level = match percentage {
            Some(p) => classify_percentage(p)?,
            None if prospective_total > 0 => WarningLevel::Exceeded,
            None => return None,
        };

        let shown = percentage.map(|p| (p * 100.0).round() / 100.0);
        let message = match level {
            WarningLevel::Approaching => format!(
                "You have used {:.0}% of the {} budget ({} of {}).",
                shown.unwrap_or_default(),
                self.category_name,
                format_money(prospective_total),
                format_money(self.target_amount)
            ),
            WarningLevel::Exceeded => format!(
                "The {} budget is exceeded by {} ({} of {}).",
                self.category_name,
                format_money(prospective_total - self.target_amount),
                format_money(prospective_total),
                format_money(self.target_amount)
            ),
        };

        Some(BudgetWarning { code: WARNING_CODE, level, percentage: shown, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        assert_eq!(classify_percentage(0.0), None);
        assert_eq!(classify_percentage(79.99), None);
        assert_eq!(classify_percentage(80.00), Some(WarningLevel::Approaching));
        assert_eq!(classify_percentage(99.99), Some(WarningLevel::Approaching));
        assert_eq!(classify_percentage(100.00), Some(WarningLevel::Exceeded));
        assert_eq!(classify_percentage(250.0), Some(WarningLevel::Exceeded));
    }

    #[test]
    fn test_classification_is_monotonic() {
        let mut last = None;
        for tenths in 0..2000 {
            let level = classify_percentage(tenths as f64 / 10.0);
            let rank = |l: Option<WarningLevel>| match l {
                None => 0,
                Some(WarningLevel::Approaching) => 1,
                Some(WarningLevel::Exceeded) => 2,
            };
            assert!(rank(level) >= rank(last));
            last = level;
        }
    }

    #[test]
    fn test_cent_boundaries_against_target() {
        let stage = CategoryThreshold::new("Food", 100_00);
        assert!(stage.evaluate(79_99).is_none());
        assert_eq!(stage.evaluate(80_00).unwrap().level, WarningLevel::Approaching);
        assert_eq!(stage.evaluate(99_99).unwrap().level, WarningLevel::Approaching);
        assert_eq!(stage.evaluate(100_00).unwrap().level, WarningLevel::Exceeded);
    }

    #[test]
    fn test_approaching_scenario() {
        let stage = CategoryThreshold::new("Groceries", 500_00);
        let warning = stage.evaluate(440_00).unwrap();
        assert_eq!(warning.level, WarningLevel::Approaching);
        assert_eq!(warning.percentage, Some(88.0));
        assert_eq!(warning.code, "CATEGORY_BUDGET_WARNING");
        assert!(warning.message.contains("88%"), "{}", warning.message);
    }

    #[test]
    fn test_exceeded_message_cites_overage() {
        let stage = CategoryThreshold::new("Transport", 200_00);
        let warning = stage.evaluate(250_00).unwrap();
        assert_eq!(warning.level, WarningLevel::Exceeded);
        assert!(warning.message.contains("RM50.00"), "{}", warning.message);
    }

    #[test]
    fn test_zero_target() {
        let stage = CategoryThreshold::new("Misc", 0);
        assert!(stage.evaluate(0).is_none());
        let warning = stage.evaluate(1).unwrap();
        assert_eq!(warning.level, WarningLevel::Exceeded);
        assert_eq!(warning.percentage, None);
    }
}

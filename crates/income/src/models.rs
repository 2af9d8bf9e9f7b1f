use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validation::{to_amount, to_cents};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncomeType {
    Active,
    Passive,
}

impl IncomeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncomeType::Active => "Active",
            IncomeType::Passive => "Passive",
        }
    }
}

impl FromStr for IncomeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(IncomeType::Active),
            "Passive" => Ok(IncomeType::Passive),
            other => Err(format!("Unknown income type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Occurrence {
    Once,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Occurrence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Occurrence::Once => "once",
            Occurrence::Daily => "daily",
            Occurrence::Weekly => "weekly",
            Occurrence::Monthly => "monthly",
            Occurrence::Yearly => "yearly",
        }
    }

    pub fn is_recurring(&self) -> bool {
        !matches!(self, Occurrence::Once)
    }
}

impl FromStr for Occurrence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "once" => Ok(Occurrence::Once),
            "daily" => Ok(Occurrence::Daily),
            "weekly" => Ok(Occurrence::Weekly),
            "monthly" => Ok(Occurrence::Monthly),
            "yearly" => Ok(Occurrence::Yearly),
            other => Err(format!("Unknown occurrence: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Income {
    pub id: i64,
    pub user_id: i64,
    pub income_type: IncomeType,
    pub source: String,
    pub title: String,
    pub amount: i64, // Cents
    pub date: NaiveDate,
    pub occurrence: Occurrence,
    pub is_recurring: bool,
    pub parent_income_id: Option<i64>,
}

/// An `Income` as the client sees it.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IncomeView {
    #[serde(rename = "incomeID")]
    pub income_id: i64,
    #[serde(rename = "userID")]
    pub user_id: i64,
    #[serde(rename = "type")]
    pub income_type: IncomeType,
    pub source: String,
    pub title: String,
    pub amount: f64,
    pub date: String,
    pub occurrence: Occurrence,
    pub is_recurring: bool,
    #[serde(rename = "parentIncomeID")]
    pub parent_income_id: Option<i64>,
}

impl From<Income> for IncomeView {
    fn from(income: Income) -> Self {
        IncomeView {
            income_id: income.id,
            user_id: income.user_id,
            income_type: income.income_type,
            source: income.source,
            title: income.title,
            amount: to_amount(income.amount),
            date: income.date.format("%Y-%m-%d").to_string(),
            occurrence: income.occurrence,
            is_recurring: income.is_recurring,
            parent_income_id: income.parent_income_id,
        }
    }
}

/// Validated income ready for storage. Only obtainable through `new`.
#[derive(Debug, Clone)]
pub struct CreateIncomeRequest {
    income_type: IncomeType,
    source: String,
    title: String,
    amount: i64,
    date: NaiveDate,
    occurrence: Occurrence,
    parent_income_id: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RawIncomeRequest {
    #[serde(rename = "type")]
    pub income_type: IncomeType,
    #[validate(length(min = 1, max = 100))]
    pub source: String,
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(range(exclusive_min = 0.0, max = 1_000_000_000_000.0))]
    pub amount: f64,
    pub date: String,
    #[serde(default = "default_occurrence")]
    pub occurrence: Occurrence,
}

fn default_occurrence() -> Occurrence {
    Occurrence::Once
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordOccurrenceRequest {
    pub date: String,
    /// Defaults to the parent's amount.
    #[validate(range(exclusive_min = 0.0, max = 1_000_000_000_000.0))]
    pub amount: Option<f64>,
}

impl CreateIncomeRequest {
    pub fn new(
        income_type: IncomeType,
        source: String,
        title: String,
        amount: f64,
        date: &str,
        occurrence: Occurrence,
    ) -> Result<Self, String> {
        if source.trim().is_empty() {
            return Err("Income source cannot be empty".to_string());
        }
        if title.trim().is_empty() {
            return Err("Income title cannot be empty".to_string());
        }
        let amount = to_cents(amount)?;
        if amount <= 0 {
            return Err("Income amount must be greater than zero".to_string());
        }
        let date = common::period::parse_date(date)?;

        Ok(Self {
            income_type,
            source: source.trim().to_string(),
            title: title.trim().to_string(),
            amount,
            date,
            occurrence,
            parent_income_id: None,
        })
    }

    pub fn from_raw(raw: RawIncomeRequest) -> Result<Self, String> {
        Self::new(raw.income_type, raw.source, raw.title, raw.amount, &raw.date, raw.occurrence)
    }

    /// A one-off copy of `parent` on `date`, linked back to it.
    pub fn occurrence_of(parent: &Income, date: NaiveDate, amount: Option<i64>) -> Self {
        Self {
            income_type: parent.income_type,
            source: parent.source.clone(),
            title: parent.title.clone(),
            amount: amount.unwrap_or(parent.amount),
            date,
            occurrence: Occurrence::Once,
            parent_income_id: Some(parent.id),
        }
    }

    pub fn income_type(&self) -> IncomeType {
        self.income_type
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn occurrence(&self) -> Occurrence {
        self.occurrence
    }

    pub fn is_recurring(&self) -> bool {
        self.occurrence.is_recurring()
    }

    pub fn parent_income_id(&self) -> Option<i64> {
        self.parent_income_id
    }
}

/// Result of the monthly income check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyIncome {
    pub has_income: bool,
    pub total_income: i64, // Cents
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyIncomeView {
    pub has_income: bool,
    pub total_income: f64,
}

impl From<MonthlyIncome> for MonthlyIncomeView {
    fn from(m: MonthlyIncome) -> Self {
        MonthlyIncomeView {
            has_income: m.has_income,
            total_income: to_amount(m.total_income),
        }
    }
}

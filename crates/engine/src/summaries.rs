//! Read-only statistic view shapes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Amount, Currency};

/// One expense line inside a [`DaySummary`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayExpense {
    pub id: Uuid,
    /// Category name.
    pub category: String,
    pub amount: Amount,
    pub description: Option<String>,
}

/// All of a user's expenses on one calendar date, across budgets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    /// Re-derived from the expense rows, not read from the cached day total.
    pub total_spent: Amount,
    pub currency: Currency,
    pub expenses: Vec<DayExpense>,
}

/// Total and count of a user's expenses for one `(category name, currency)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub total_spent: Amount,
    pub count: u64,
    pub currency: Currency,
}

//! Command structs for engine operations.
//!
//! These types group parameters for expense writes, keeping call sites
//! readable and avoiding long argument lists.

use uuid::Uuid;

/// Record a new expense (or income, when the amount is negative).
#[derive(Clone, Debug)]
pub struct NewExpenseCmd {
    pub budget_day_id: Uuid,
    pub category_id: Uuid,
    /// Decimal string with at most two fractional digits.
    pub amount: String,
    pub description: Option<String>,
}

impl NewExpenseCmd {
    #[must_use]
    pub fn new(budget_day_id: Uuid, category_id: Uuid, amount: impl Into<String>) -> Self {
        Self {
            budget_day_id,
            category_id,
            amount: amount.into(),
            description: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial update of an expense. Unset fields are left untouched.
///
/// A description of `""` (after trimming) clears the stored description.
#[derive(Clone, Debug, Default)]
pub struct ExpensePatch {
    pub amount: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub budget_day_id: Option<Uuid>,
}

impl ExpensePatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = Some(amount.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Move the expense to another budget day.
    #[must_use]
    pub fn budget_day_id(mut self, budget_day_id: Uuid) -> Self {
        self.budget_day_id = Some(budget_day_id);
        self
    }
}

//! Expense primitives.
//!
//! An [`Expense`] is the atomic ledger entry. Amounts are signed minor units:
//! positive values are spending, negative values are income. Every aggregate
//! in the engine is a sum or a group over this entity.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Amount;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub budget_day_id: Uuid,
    pub category_id: Uuid,
    pub amount: Amount,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(
        budget_day_id: Uuid,
        category_id: Uuid,
        amount: Amount,
        description: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            budget_day_id,
            category_id,
            amount,
            description,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub budget_day_id: Uuid,
    pub category_id: Uuid,
    pub amount_minor: i64,
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::budget_days::Entity",
        from = "Column::BudgetDayId",
        to = "super::budget_days::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    BudgetDay,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Category,
}

impl Related<super::budget_days::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetDay.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(expense.id),
            budget_day_id: ActiveValue::Set(expense.budget_day_id),
            category_id: ActiveValue::Set(expense.category_id),
            amount_minor: ActiveValue::Set(expense.amount.minor()),
            description: ActiveValue::Set(expense.description.clone()),
            created_at: ActiveValue::Set(expense.created_at),
        }
    }
}

impl From<Model> for Expense {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            budget_day_id: model.budget_day_id,
            category_id: model.category_id,
            amount: Amount::from_minor(model.amount_minor),
            description: model.description,
            created_at: model.created_at,
        }
    }
}

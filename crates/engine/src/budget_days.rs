//! Budget days.
//!
//! A [`BudgetDay`] is the per-date bucket beneath a budget. Its
//! `total_spent_minor` column is a cached aggregate: it always equals the sum of
//! the day's expense amounts and is only ever written by a full recompute
//! (see `Engine::recompute_day`).

use chrono::NaiveDate;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Amount, Currency, Expense};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetDay {
    pub id: Uuid,
    pub budget_id: Uuid,
    pub date: NaiveDate,
    pub total_spent: Amount,
}

impl BudgetDay {
    /// A fresh, empty day. The total starts at exactly zero.
    pub fn new(budget_id: Uuid, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            budget_id,
            date,
            total_spent: Amount::ZERO,
        }
    }
}

/// Read composition used for day-level display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWithExpenses {
    pub day: BudgetDay,
    pub total_spent: Amount,
    pub currency: Currency,
    pub expenses: Vec<Expense>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budget_days")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub budget_id: Uuid,
    pub date: Date,
    pub total_spent_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::budgets::Entity",
        from = "Column::BudgetId",
        to = "super::budgets::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Budget,
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
}

impl Related<super::budgets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budget.def()
    }
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&BudgetDay> for ActiveModel {
    fn from(day: &BudgetDay) -> Self {
        Self {
            id: ActiveValue::Set(day.id),
            budget_id: ActiveValue::Set(day.budget_id),
            date: ActiveValue::Set(day.date),
            total_spent_minor: ActiveValue::Set(day.total_spent.minor()),
        }
    }
}

impl From<Model> for BudgetDay {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            budget_id: model.budget_id,
            date: model.date,
            total_spent: Amount::from_minor(model.total_spent_minor),
        }
    }
}

//! Budgets: per-user, single-currency containers of budget days.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub owner_user_id: String,
    pub currency_id: Uuid,
    pub name: String,
    /// Visibility flag managed outside the engine; carried as data only.
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

impl Budget {
    pub fn new(owner_user_id: String, currency_id: Uuid, name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_user_id,
            currency_id,
            name,
            is_public: false,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_user_id: String,
    pub currency_id: Uuid,
    pub name: String,
    pub is_public: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::currency::Entity",
        from = "Column::CurrencyId",
        to = "super::currency::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Currency,
    #[sea_orm(has_many = "super::budget_days::Entity")]
    BudgetDays,
}

impl Related<super::currency::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Currency.def()
    }
}

impl Related<super::budget_days::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetDays.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Budget> for ActiveModel {
    fn from(budget: &Budget) -> Self {
        Self {
            id: ActiveValue::Set(budget.id),
            owner_user_id: ActiveValue::Set(budget.owner_user_id.clone()),
            currency_id: ActiveValue::Set(budget.currency_id),
            name: ActiveValue::Set(budget.name.clone()),
            is_public: ActiveValue::Set(budget.is_public),
            created_at: ActiveValue::Set(budget.created_at),
        }
    }
}

impl From<Model> for Budget {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            owner_user_id: model.owner_user_id,
            currency_id: model.currency_id,
            name: model.name,
            is_public: model.is_public,
            created_at: model.created_at,
        }
    }
}

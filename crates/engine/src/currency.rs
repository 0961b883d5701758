//! Currency reference data.
//!
//! Currencies are immutable once created. A budget references exactly one
//! currency and that currency is the unit of every amount beneath it.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency {
    pub id: Uuid,
    /// Three-letter upper-case code, unique across the store (`USD`, `EUR`).
    pub code: String,
    pub name: String,
    pub symbol: String,
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.code)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "currencies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    pub symbol: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::budgets::Entity")]
    Budgets,
}

impl Related<super::budgets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budgets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Currency> for ActiveModel {
    fn from(currency: &Currency) -> Self {
        Self {
            id: ActiveValue::Set(currency.id),
            code: ActiveValue::Set(currency.code.clone()),
            name: ActiveValue::Set(currency.name.clone()),
            symbol: ActiveValue::Set(currency.symbol.clone()),
        }
    }
}

impl From<Model> for Currency {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            name: model.name,
            symbol: model.symbol,
        }
    }
}

//! Category registry per user.
//!
//! Categories are a cross-cutting tagging dimension: they are not part of the
//! budget hierarchy and one category may tag expenses of several budgets.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_COLOR: &str = "#000000";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub owner_user_id: String,
    pub name: String,
    pub color_hex: String,
}

impl Category {
    pub fn new(owner_user_id: String, name: String, color_hex: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_user_id,
            name,
            color_hex: color_hex.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_user_id: String,
    pub name: String,
    pub color_hex: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Category> for ActiveModel {
    fn from(category: &Category) -> Self {
        Self {
            id: ActiveValue::Set(category.id),
            owner_user_id: ActiveValue::Set(category.owner_user_id.clone()),
            name: ActiveValue::Set(category.name.clone()),
            color_hex: ActiveValue::Set(category.color_hex.clone()),
        }
    }
}

impl From<Model> for Category {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            owner_user_id: model.owner_user_id,
            name: model.name,
            color_hex: model.color_hex,
        }
    }
}

//! Reference data the ledger hangs off: currencies, budgets and categories.

use sea_orm::{QueryFilter, QueryOrder, SqlErr, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Budget, Category, Currency, EngineError, ResultEngine, budgets, categories, currency,
    util::{normalize_color_hex, normalize_currency_code, normalize_required_name},
};

use super::{Engine, with_tx};

impl Engine {
    /// Registers a currency. Codes are unique and stored upper-cased.
    pub async fn new_currency(
        &self,
        code: &str,
        name: &str,
        symbol: &str,
    ) -> ResultEngine<Currency> {
        let code = normalize_currency_code(code)?;
        let name = normalize_required_name(name, "currency")?;
        let symbol = normalize_required_name(symbol, "currency symbol")?;

        with_tx!(self, |db_tx| {
            let exists = currency::Entity::find()
                .filter(currency::Column::Code.eq(code.as_str()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(format!("currency {code}")));
            }

            let new = Currency {
                id: Uuid::new_v4(),
                code: code.clone(),
                name: name.clone(),
                symbol: symbol.clone(),
            };
            match currency::ActiveModel::from(&new).insert(&db_tx).await {
                Ok(model) => {
                    tracing::info!(currency_id = %model.id, code = %model.code, "currency created");
                    Ok(model.into())
                }
                Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    Err(EngineError::ExistingKey(format!("currency {code}")))
                }
                Err(err) => Err(err.into()),
            }
        })
    }

    pub async fn currency(&self, id: Uuid) -> ResultEngine<Currency> {
        currency::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .map(Currency::from)
            .ok_or_else(|| EngineError::NotFound(format!("currency {id}")))
    }

    /// Creates a budget for `user_id` denominated in `currency_id`.
    pub async fn new_budget(
        &self,
        user_id: &str,
        currency_id: Uuid,
        name: &str,
    ) -> ResultEngine<Budget> {
        let owner = normalize_required_name(user_id, "user")?;
        let name = normalize_required_name(name, "budget")?;

        with_tx!(self, |db_tx| {
            self.require_currency_ref(&db_tx, currency_id).await?;
            let budget = Budget::new(owner.clone(), currency_id, name.clone());
            let model = budgets::ActiveModel::from(&budget).insert(&db_tx).await?;
            tracing::info!(budget_id = %model.id, owner = %model.owner_user_id, "budget created");
            Ok(model.into())
        })
    }

    /// Budgets owned by `user_id`, oldest first.
    pub async fn budgets_for_user(&self, user_id: &str) -> ResultEngine<Vec<Budget>> {
        let models = budgets::Entity::find()
            .filter(budgets::Column::OwnerUserId.eq(user_id))
            .order_by_asc(budgets::Column::CreatedAt)
            .order_by_asc(budgets::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Budget::from).collect())
    }

    /// Creates a category for `user_id`; `color` defaults to black.
    pub async fn new_category(
        &self,
        user_id: &str,
        name: &str,
        color: Option<&str>,
    ) -> ResultEngine<Category> {
        let owner = normalize_required_name(user_id, "user")?;
        let name = normalize_required_name(name, "category")?;
        let color = color.map(normalize_color_hex).transpose()?;

        let category = Category::new(owner, name, color);
        let model = categories::ActiveModel::from(&category)
            .insert(&self.database)
            .await?;
        tracing::info!(category_id = %model.id, name = %model.name, "category created");
        Ok(model.into())
    }
}

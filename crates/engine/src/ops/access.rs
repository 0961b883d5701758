//! Existence and ownership checks against the metadata the engine references.
//!
//! `NotFound` is reserved for the primary target of an operation;
//! `ReferenceNotFound` is used when a caller-supplied foreign key is dangling.

use sea_orm::{ConnectionTrait, PaginatorTrait, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    Currency, EngineError, ResultEngine, budget_days, budgets, categories, currency, expenses,
};

use super::Engine;

/// Generates a `require_*` lookup that maps a missing row to the given error
/// kind.
macro_rules! impl_require {
    ($require_fn:ident, $entity:path, $model:path, $err:path, $label:literal) => {
        pub(super) async fn $require_fn<C: ConnectionTrait>(
            &self,
            db: &C,
            id: Uuid,
        ) -> ResultEngine<$model> {
            <$entity>::find_by_id(id)
                .one(db)
                .await?
                .ok_or_else(|| $err(format!("{} {id}", $label)))
        }
    };
}

impl Engine {
    impl_require!(
        require_day,
        budget_days::Entity,
        budget_days::Model,
        EngineError::NotFound,
        "budget day"
    );

    impl_require!(
        require_day_ref,
        budget_days::Entity,
        budget_days::Model,
        EngineError::ReferenceNotFound,
        "budget day"
    );

    impl_require!(
        require_expense,
        expenses::Entity,
        expenses::Model,
        EngineError::NotFound,
        "expense"
    );

    impl_require!(
        require_category_ref,
        categories::Entity,
        categories::Model,
        EngineError::ReferenceNotFound,
        "category"
    );

    impl_require!(
        require_budget_ref,
        budgets::Entity,
        budgets::Model,
        EngineError::ReferenceNotFound,
        "budget"
    );

    impl_require!(
        require_currency_ref,
        currency::Entity,
        currency::Model,
        EngineError::ReferenceNotFound,
        "currency"
    );

    /// Budget existence + ownership check keyed by `(budget_id, user_id)`.
    pub(super) async fn require_budget_owned<C: ConnectionTrait>(
        &self,
        db: &C,
        budget_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<budgets::Model> {
        budgets::Entity::find_by_id(budget_id)
            .filter(budgets::Column::OwnerUserId.eq(user_id))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::ReferenceNotFound(format!("budget {budget_id}")))
    }

    /// Currency of the budget owning `day`.
    pub(super) async fn day_currency<C: ConnectionTrait>(
        &self,
        db: &C,
        day: &budget_days::Model,
    ) -> ResultEngine<Currency> {
        let budget = self.require_budget_ref(db, day.budget_id).await?;
        let currency = self.require_currency_ref(db, budget.currency_id).await?;
        Ok(currency.into())
    }

    pub(super) async fn user_budget_count<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
    ) -> ResultEngine<u64> {
        budgets::Entity::find()
            .filter(budgets::Column::OwnerUserId.eq(user_id))
            .count(db)
            .await
            .map_err(Into::into)
    }
}

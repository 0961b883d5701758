//! Day rollup: the recompute primitive and day-level reads/writes.
//!
//! Recompute, don't patch: a day's cached total is only ever replaced by a
//! fresh `SUM` over its expense rows, evaluated inside the caller's
//! transaction. There is no code path that adds a delta to the cached value.

use chrono::NaiveDate;
use std::collections::HashMap;
use uuid::Uuid;

use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseTransaction, JoinType, QueryFilter, QueryOrder,
    QuerySelect, SqlErr, Statement, TransactionTrait, prelude::*,
};

use crate::{
    Amount, BudgetDay, DayWithExpenses, EngineError, Expense, ResultEngine, budget_days, expenses,
};

use super::{Engine, with_tx};

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

impl Engine {
    /// Replace the cached total of `day_id` with `SUM(amount)` over its
    /// expenses (`0.00` when there are none) and return the new value.
    ///
    /// Runs on the caller's transaction so the recompute commits or rolls back
    /// together with the write that triggered it.
    pub(super) async fn recompute_day_in(
        &self,
        db_tx: &DatabaseTransaction,
        day_id: Uuid,
    ) -> ResultEngine<Amount> {
        let backend = db_tx.get_database_backend();
        let stmt = Statement::from_sql_and_values(
            backend,
            "SELECT COALESCE(SUM(amount_minor), 0) AS sum FROM expenses WHERE budget_day_id = ?;",
            vec![day_id.into()],
        );
        let sum: i64 = match db_tx.query_one(stmt).await? {
            Some(row) => row.try_get("", "sum")?,
            None => 0,
        };
        let total = Amount::from_minor(sum).ensure_storable()?;

        let day = budget_days::ActiveModel {
            id: ActiveValue::Set(day_id),
            total_spent_minor: ActiveValue::Set(total.minor()),
            ..Default::default()
        };
        day.update(db_tx).await?;

        tracing::debug!(%day_id, %total, "recomputed budget day total");
        Ok(total)
    }

    async fn find_day_by_date<C: ConnectionTrait>(
        &self,
        db: &C,
        budget_id: Uuid,
        date: NaiveDate,
    ) -> ResultEngine<Option<budget_days::Model>> {
        budget_days::Entity::find()
            .filter(budget_days::Column::BudgetId.eq(budget_id))
            .filter(budget_days::Column::Date.eq(date))
            .one(db)
            .await
            .map_err(Into::into)
    }

    /// Insert `day`, or return the row a concurrent writer created first.
    ///
    /// The insert runs in a savepoint so a uniqueness violation on
    /// `(budget_id, date)` leaves the outer transaction usable for the re-read.
    pub(super) async fn insert_day_or_existing(
        &self,
        db_tx: &DatabaseTransaction,
        day: &BudgetDay,
    ) -> ResultEngine<BudgetDay> {
        let savepoint = db_tx.begin().await?;
        match budget_days::ActiveModel::from(day).insert(&savepoint).await {
            Ok(model) => {
                savepoint.commit().await?;
                Ok(model.into())
            }
            Err(err) if is_unique_violation(&err) => {
                savepoint.rollback().await?;
                tracing::warn!(
                    budget_id = %day.budget_id,
                    date = %day.date,
                    "budget day created concurrently, reusing existing row"
                );
                let existing = self
                    .find_day_by_date(db_tx, day.budget_id, day.date)
                    .await?
                    .ok_or(EngineError::Database(err))?;
                Ok(existing.into())
            }
            Err(err) => {
                savepoint.rollback().await?;
                Err(err.into())
            }
        }
    }

    /// Recomputes a day's cached total from its expense rows.
    pub async fn recompute_day(&self, day_id: Uuid) -> ResultEngine<Amount> {
        with_tx!(self, |db_tx| {
            self.require_day(&db_tx, day_id).await?;
            self.recompute_day_in(&db_tx, day_id).await
        })
    }

    /// Returns the day of `budget_id` at `date`, creating it with a zero total
    /// when missing. Calling it twice with the same arguments yields the same
    /// row.
    pub async fn find_or_create_day(
        &self,
        budget_id: Uuid,
        date: NaiveDate,
    ) -> ResultEngine<BudgetDay> {
        with_tx!(self, |db_tx| {
            self.require_budget_ref(&db_tx, budget_id).await?;
            match self.find_day_by_date(&db_tx, budget_id, date).await? {
                Some(model) => Ok(model.into()),
                None => {
                    let day = self
                        .insert_day_or_existing(&db_tx, &BudgetDay::new(budget_id, date))
                        .await?;
                    tracing::info!(day_id = %day.id, %budget_id, %date, "budget day created");
                    Ok(day)
                }
            }
        })
    }

    /// Creates a day explicitly; fails with `ExistingKey` if the budget already
    /// has a day at `date`.
    pub async fn create_day(&self, budget_id: Uuid, date: NaiveDate) -> ResultEngine<BudgetDay> {
        with_tx!(self, |db_tx| {
            self.require_budget_ref(&db_tx, budget_id).await?;
            let existing_key = || EngineError::ExistingKey(format!("budget day {date}"));
            if self
                .find_day_by_date(&db_tx, budget_id, date)
                .await?
                .is_some()
            {
                return Err(existing_key());
            }
            let day = BudgetDay::new(budget_id, date);
            match budget_days::ActiveModel::from(&day).insert(&db_tx).await {
                Ok(model) => {
                    tracing::info!(day_id = %model.id, %budget_id, %date, "budget day created");
                    Ok(model.into())
                }
                Err(err) if is_unique_violation(&err) => Err(existing_key()),
                Err(err) => Err(err.into()),
            }
        })
    }

    /// Returns a day, its cached total, its budget currency and its expenses
    /// (oldest first).
    pub async fn day_with_expenses(&self, day_id: Uuid) -> ResultEngine<DayWithExpenses> {
        with_tx!(self, |db_tx| {
            let model = self.require_day(&db_tx, day_id).await?;
            let currency = self.day_currency(&db_tx, &model).await?;
            let expenses = self.day_expenses(&db_tx, day_id).await?;
            let day = BudgetDay::from(model);
            Ok(DayWithExpenses {
                total_spent: day.total_spent,
                day,
                currency,
                expenses,
            })
        })
    }

    /// Lists every day of a budget owned by `user_id`, ordered by date.
    pub async fn list_days_for_budget(
        &self,
        budget_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Vec<DayWithExpenses>> {
        with_tx!(self, |db_tx| {
            let budget = self
                .require_budget_owned(&db_tx, budget_id, user_id)
                .await?;
            let currency: crate::Currency = self
                .require_currency_ref(&db_tx, budget.currency_id)
                .await?
                .into();

            let day_models = budget_days::Entity::find()
                .filter(budget_days::Column::BudgetId.eq(budget_id))
                .order_by_asc(budget_days::Column::Date)
                .all(&db_tx)
                .await?;

            let expense_models = expenses::Entity::find()
                .join(JoinType::InnerJoin, expenses::Relation::BudgetDay.def())
                .filter(budget_days::Column::BudgetId.eq(budget_id))
                .order_by_asc(expenses::Column::CreatedAt)
                .order_by_asc(expenses::Column::Id)
                .all(&db_tx)
                .await?;
            let mut by_day: HashMap<Uuid, Vec<Expense>> = HashMap::new();
            for model in expense_models {
                by_day
                    .entry(model.budget_day_id)
                    .or_default()
                    .push(model.into());
            }

            let days = day_models
                .into_iter()
                .map(|model| {
                    let day = BudgetDay::from(model);
                    DayWithExpenses {
                        total_spent: day.total_spent,
                        expenses: by_day.remove(&day.id).unwrap_or_default(),
                        currency: currency.clone(),
                        day,
                    }
                })
                .collect();
            Ok(days)
        })
    }

    /// Moves a day to another date of the same budget. Totals are unaffected.
    pub async fn move_day(&self, day_id: Uuid, date: NaiveDate) -> ResultEngine<BudgetDay> {
        with_tx!(self, |db_tx| {
            let model = self.require_day(&db_tx, day_id).await?;
            if model.date == date {
                return Ok(model.into());
            }
            let existing_key = || EngineError::ExistingKey(format!("budget day {date}"));
            if self
                .find_day_by_date(&db_tx, model.budget_id, date)
                .await?
                .is_some()
            {
                return Err(existing_key());
            }
            let active = budget_days::ActiveModel {
                id: ActiveValue::Set(day_id),
                date: ActiveValue::Set(date),
                ..Default::default()
            };
            match active.update(&db_tx).await {
                Ok(model) => Ok(model.into()),
                Err(err) if is_unique_violation(&err) => Err(existing_key()),
                Err(err) => Err(err.into()),
            }
        })
    }

    /// Deletes a day together with all of its expenses.
    pub async fn delete_day(&self, day_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_day(&db_tx, day_id).await?;
            let removed = expenses::Entity::delete_many()
                .filter(expenses::Column::BudgetDayId.eq(day_id))
                .exec(&db_tx)
                .await?
                .rows_affected;
            budget_days::Entity::delete_by_id(day_id)
                .exec(&db_tx)
                .await?;
            tracing::info!(%day_id, expenses = removed, "budget day deleted");
            Ok(())
        })
    }

    /// Recomputes every day of a budget in one transaction.
    ///
    /// Returns the days whose cached total was stale, with the corrected value.
    pub async fn reconcile_budget(&self, budget_id: Uuid) -> ResultEngine<Vec<(Uuid, Amount)>> {
        with_tx!(self, |db_tx| {
            self.require_budget_ref(&db_tx, budget_id).await?;
            let day_models = budget_days::Entity::find()
                .filter(budget_days::Column::BudgetId.eq(budget_id))
                .order_by_asc(budget_days::Column::Date)
                .all(&db_tx)
                .await?;

            let mut corrected = Vec::new();
            for model in day_models {
                let total = self.recompute_day_in(&db_tx, model.id).await?;
                if total.minor() != model.total_spent_minor {
                    corrected.push((model.id, total));
                }
            }
            if !corrected.is_empty() {
                tracing::warn!(%budget_id, days = corrected.len(), "corrected stale day totals");
            }
            Ok(corrected)
        })
    }
}

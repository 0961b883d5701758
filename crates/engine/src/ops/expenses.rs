use sea_orm::{
    ActiveModelTrait, ActiveValue, ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Amount, Expense, ExpensePatch, NewExpenseCmd, Page, PageRequest, ResultEngine, expenses,
    util::normalize_optional_text,
};

use super::{Engine, with_tx};

impl Engine {
    /// Expenses of a day, oldest first.
    pub(super) async fn day_expenses<C: ConnectionTrait>(
        &self,
        db: &C,
        day_id: Uuid,
    ) -> ResultEngine<Vec<Expense>> {
        let models = expenses::Entity::find()
            .filter(expenses::Column::BudgetDayId.eq(day_id))
            .order_by_asc(expenses::Column::CreatedAt)
            .order_by_asc(expenses::Column::Id)
            .all(db)
            .await?;
        Ok(models.into_iter().map(Expense::from).collect())
    }

    /// Records an expense and recomputes its day in the same transaction.
    pub async fn create_expense(&self, cmd: NewExpenseCmd) -> ResultEngine<Expense> {
        with_tx!(self, |db_tx| {
            let day = self.require_day_ref(&db_tx, cmd.budget_day_id).await?;
            self.require_category_ref(&db_tx, cmd.category_id).await?;
            let amount: Amount = cmd.amount.parse()?;

            let expense = Expense::new(
                day.id,
                cmd.category_id,
                amount,
                normalize_optional_text(cmd.description.as_deref()),
            );
            let model = expenses::ActiveModel::from(&expense)
                .insert(&db_tx)
                .await?;
            let total = self.recompute_day_in(&db_tx, day.id).await?;

            tracing::info!(
                expense_id = %model.id,
                day_id = %day.id,
                %amount,
                day_total = %total,
                "expense created"
            );
            Ok(model.into())
        })
    }

    /// Applies a partial update. When the expense moves to another day, both
    /// the old and the new day are recomputed.
    pub async fn update_expense(&self, id: Uuid, patch: ExpensePatch) -> ResultEngine<Expense> {
        with_tx!(self, |db_tx| {
            let current = self.require_expense(&db_tx, id).await?;
            let old_day = current.budget_day_id;
            let mut new_day = old_day;
            let mut active: expenses::ActiveModel = current.clone().into();

            if let Some(day_id) = patch.budget_day_id {
                let day = self.require_day_ref(&db_tx, day_id).await?;
                new_day = day.id;
                active.budget_day_id = ActiveValue::Set(day.id);
            }
            if let Some(category_id) = patch.category_id {
                self.require_category_ref(&db_tx, category_id).await?;
                active.category_id = ActiveValue::Set(category_id);
            }
            if let Some(raw) = patch.amount.as_deref() {
                let amount: Amount = raw.parse()?;
                active.amount_minor = ActiveValue::Set(amount.minor());
            }
            if let Some(description) = patch.description.as_deref() {
                active.description = ActiveValue::Set(normalize_optional_text(Some(description)));
            }

            let model = if active.is_changed() {
                active.update(&db_tx).await?
            } else {
                current
            };

            if new_day != old_day {
                self.recompute_day_in(&db_tx, old_day).await?;
            }
            let total = self.recompute_day_in(&db_tx, new_day).await?;

            tracing::info!(
                expense_id = %id,
                from_day = %old_day,
                to_day = %new_day,
                day_total = %total,
                "expense updated"
            );
            Ok(model.into())
        })
    }

    /// Deletes an expense and recomputes the day it belonged to.
    pub async fn delete_expense(&self, id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let current = self.require_expense(&db_tx, id).await?;
            expenses::Entity::delete_by_id(id).exec(&db_tx).await?;
            let total = self
                .recompute_day_in(&db_tx, current.budget_day_id)
                .await?;
            tracing::info!(
                expense_id = %id,
                day_id = %current.budget_day_id,
                day_total = %total,
                "expense deleted"
            );
            Ok(())
        })
    }

    pub async fn expense(&self, id: Uuid) -> ResultEngine<Expense> {
        with_tx!(self, |db_tx| {
            let model = self.require_expense(&db_tx, id).await?;
            Ok(model.into())
        })
    }

    /// Paged listing of a day's expenses, oldest first.
    pub async fn list_expenses_for_day(
        &self,
        day_id: Uuid,
        page: PageRequest,
    ) -> ResultEngine<Page<Expense>> {
        let request = page.clamped(self.max_page_size);
        with_tx!(self, |db_tx| {
            self.require_day_ref(&db_tx, day_id).await?;
            let query =
                expenses::Entity::find().filter(expenses::Column::BudgetDayId.eq(day_id));
            let total_items = query.clone().count(&db_tx).await?;
            let models = query
                .order_by_asc(expenses::Column::CreatedAt)
                .order_by_asc(expenses::Column::Id)
                .offset(request.offset())
                .limit(request.limit)
                .all(&db_tx)
                .await?;
            let items = models.into_iter().map(Expense::from).collect();
            Ok(Page::new(items, request, total_items))
        })
    }
}

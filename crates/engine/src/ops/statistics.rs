//! Per-user monthly statistics.
//!
//! Both views re-derive their sums from expense rows with `GROUP BY`; the
//! cached day totals are never read here. Paging windows the group keys
//! (dates or category/currency pairs) in SQL, so only one page of groups is
//! ever materialized.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, QueryFilter, Statement, Value, prelude::*};
use uuid::Uuid;

use crate::{
    Amount, CategorySummary, Currency, DayExpense, DaySummary, EngineError, Page, PageRequest,
    ResultEngine, currency, util::month_window,
};

use super::Engine;

/// Expenses of one owner within a date window. Binds: owner, from, to.
const OWNER_MONTH_SCOPE: &str = "FROM expenses e \
     INNER JOIN budget_days d ON d.id = e.budget_day_id \
     INNER JOIN budgets b ON b.id = d.budget_id \
     INNER JOIN categories c ON c.id = e.category_id \
     WHERE b.owner_user_id = ? AND d.date BETWEEN ? AND ?";

fn scope_values(user_id: &str, from: NaiveDate, to: NaiveDate) -> Vec<Value> {
    vec![user_id.into(), from.into(), to.into()]
}

fn window_values(mut values: Vec<Value>, request: PageRequest) -> Vec<Value> {
    values.push(i64::try_from(request.limit).unwrap_or(i64::MAX).into());
    values.push(i64::try_from(request.offset()).unwrap_or(i64::MAX).into());
    values
}

impl Engine {
    async fn count_groups<C: ConnectionTrait>(
        &self,
        db: &C,
        group_by: &str,
        values: Vec<Value>,
    ) -> ResultEngine<u64> {
        let stmt = Statement::from_sql_and_values(
            db.get_database_backend(),
            format!(
                "SELECT COUNT(*) AS group_count \
                 FROM (SELECT 1 {OWNER_MONTH_SCOPE} GROUP BY {group_by}) AS grouped;"
            ),
            values,
        );
        let group_count: i64 = match db.query_one(stmt).await? {
            Some(row) => row.try_get("", "group_count")?,
            None => 0,
        };
        Ok(u64::try_from(group_count).unwrap_or_default())
    }

    async fn currencies_by_id<C: ConnectionTrait>(
        &self,
        db: &C,
        ids: Vec<Uuid>,
    ) -> ResultEngine<HashMap<Uuid, Currency>> {
        let models = currency::Entity::find()
            .filter(currency::Column::Id.is_in(ids))
            .all(db)
            .await?;
        Ok(models
            .into_iter()
            .map(|model| (model.id, Currency::from(model)))
            .collect())
    }

    async fn ensure_user_has_budgets<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
    ) -> ResultEngine<()> {
        if self.user_budget_count(db, user_id).await? == 0 {
            return Err(EngineError::UserHasNoBudgets(user_id.to_string()));
        }
        Ok(())
    }

    /// One page of a user's expense days in `year`-`month`, ascending by date.
    ///
    /// Each summary lists that date's expenses across all of the user's
    /// budgets, oldest first, with a total summed from those rows.
    pub async fn expenses_by_month(
        &self,
        user_id: &str,
        year: i32,
        month: u32,
        page: PageRequest,
    ) -> ResultEngine<Page<DaySummary>> {
        let (from, to) = month_window(year, month)?;
        let request = page.clamped(self.max_page_size);
        let db = &self.database;
        self.ensure_user_has_budgets(db, user_id).await?;

        let total_items = self
            .count_groups(db, "d.date", scope_values(user_id, from, to))
            .await?;

        let dates_stmt = Statement::from_sql_and_values(
            db.get_database_backend(),
            format!(
                "SELECT d.date AS date {OWNER_MONTH_SCOPE} \
                 GROUP BY d.date ORDER BY d.date ASC LIMIT ? OFFSET ?;"
            ),
            window_values(scope_values(user_id, from, to), request),
        );
        let dates = db
            .query_all(dates_stmt)
            .await?
            .iter()
            .map(|row| row.try_get::<NaiveDate>("", "date"))
            .collect::<Result<Vec<_>, _>>()?;
        if dates.is_empty() {
            return Ok(Page::new(Vec::new(), request, total_items));
        }

        // Only the dates of this page; other days of the month may sit between them.
        let placeholders = vec!["?"; dates.len()].join(", ");
        let mut values = scope_values(user_id, from, to);
        values.extend(dates.iter().map(|date| Value::from(*date)));
        let rows_stmt = Statement::from_sql_and_values(
            db.get_database_backend(),
            format!(
                "SELECT e.id AS id, e.amount_minor AS amount_minor, e.description AS description, \
                 c.name AS category, d.date AS date, b.currency_id AS currency_id \
                 {OWNER_MONTH_SCOPE} AND d.date IN ({placeholders}) \
                 ORDER BY d.date ASC, e.created_at ASC, e.id ASC;"
            ),
            values,
        );

        let mut grouped: BTreeMap<NaiveDate, (Uuid, Vec<DayExpense>)> = BTreeMap::new();
        for row in db.query_all(rows_stmt).await? {
            let date: NaiveDate = row.try_get("", "date")?;
            let currency_id: Uuid = row.try_get("", "currency_id")?;
            let line = DayExpense {
                id: row.try_get("", "id")?,
                category: row.try_get("", "category")?,
                amount: Amount::from_minor(row.try_get("", "amount_minor")?),
                description: row.try_get("", "description")?,
            };
            grouped
                .entry(date)
                .or_insert_with(|| (currency_id, Vec::new()))
                .1
                .push(line);
        }

        let currency_ids = grouped.values().map(|(id, _)| *id).collect();
        let currencies = self.currencies_by_id(db, currency_ids).await?;

        let mut items = Vec::with_capacity(grouped.len());
        for (date, (currency_id, expenses)) in grouped {
            let currency = currencies
                .get(&currency_id)
                .cloned()
                .ok_or_else(|| EngineError::ReferenceNotFound(format!("currency {currency_id}")))?;
            let total_spent = Amount::try_sum(expenses.iter().map(|e| e.amount))?;
            items.push(DaySummary {
                date,
                total_spent,
                currency,
                expenses,
            });
        }

        tracing::debug!(
            user_id,
            year,
            month,
            page = request.page,
            days = items.len(),
            "expenses by month"
        );
        Ok(Page::new(items, request, total_items))
    }

    /// One page of a user's per-category totals for `year`-`month`.
    ///
    /// Groups are keyed by category name and currency; categories that share a
    /// name are merged. Ordered by name, then currency code.
    pub async fn category_stats(
        &self,
        user_id: &str,
        year: i32,
        month: u32,
        page: PageRequest,
    ) -> ResultEngine<Page<CategorySummary>> {
        let (from, to) = month_window(year, month)?;
        let request = page.clamped(self.max_page_size);
        let db = &self.database;
        self.ensure_user_has_budgets(db, user_id).await?;

        let total_items = self
            .count_groups(db, "c.name, b.currency_id", scope_values(user_id, from, to))
            .await?;

        let stmt = Statement::from_sql_and_values(
            db.get_database_backend(),
            format!(
                "SELECT c.name AS category, b.currency_id AS currency_id, \
                 SUM(e.amount_minor) AS total_minor, COUNT(e.id) AS expense_count \
                 {OWNER_MONTH_SCOPE} \
                 GROUP BY c.name, b.currency_id \
                 ORDER BY c.name ASC, \
                 (SELECT cur.code FROM currencies cur WHERE cur.id = b.currency_id) ASC \
                 LIMIT ? OFFSET ?;"
            ),
            window_values(scope_values(user_id, from, to), request),
        );
        let rows = db.query_all(stmt).await?;

        let mut groups = Vec::with_capacity(rows.len());
        for row in rows {
            let category: String = row.try_get("", "category")?;
            let currency_id: Uuid = row.try_get("", "currency_id")?;
            let total_minor: i64 = row.try_get("", "total_minor")?;
            let count: i64 = row.try_get("", "expense_count")?;
            groups.push((category, currency_id, total_minor, count));
        }

        let currency_ids = groups.iter().map(|(_, id, _, _)| *id).collect();
        let currencies = self.currencies_by_id(db, currency_ids).await?;

        let items = groups
            .into_iter()
            .map(|(category, currency_id, total_minor, count)| {
                let currency = currencies.get(&currency_id).cloned().ok_or_else(|| {
                    EngineError::ReferenceNotFound(format!("currency {currency_id}"))
                })?;
                Ok(CategorySummary {
                    category,
                    total_spent: Amount::from_minor(total_minor),
                    count: u64::try_from(count).unwrap_or_default(),
                    currency,
                })
            })
            .collect::<ResultEngine<Vec<_>>>()?;

        tracing::debug!(
            user_id,
            year,
            month,
            page = request.page,
            groups = items.len(),
            "category stats"
        );
        Ok(Page::new(items, request, total_items))
    }
}

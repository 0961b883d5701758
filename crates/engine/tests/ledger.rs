use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use tokio::task::JoinSet;

use engine::{
    Amount, Budget, Category, Engine, EngineError, ExpensePatch, NewExpenseCmd, PageRequest,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

struct Fixture {
    engine: Engine,
    db: DatabaseConnection,
    budget: Budget,
    groceries: Category,
    coffee: Category,
    salary: Category,
}

async fn fixture() -> Fixture {
    let (engine, db) = engine_with_db().await;
    let usd = engine.new_currency("USD", "US Dollar", "$").await.unwrap();
    let budget = engine.new_budget("alice", usd.id, "Main").await.unwrap();
    let groceries = engine
        .new_category("alice", "Groceries", Some("#00ff00"))
        .await
        .unwrap();
    let coffee = engine.new_category("alice", "Coffee", None).await.unwrap();
    let salary = engine.new_category("alice", "Salary", None).await.unwrap();
    Fixture {
        engine,
        db,
        budget,
        groceries,
        coffee,
        salary,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn amount(raw: &str) -> Amount {
    raw.parse().unwrap()
}

async fn stored_total(db: &DatabaseConnection, day_id: Uuid) -> i64 {
    let row = db
        .query_one(Statement::from_sql_and_values(
            db.get_database_backend(),
            "SELECT total_spent_minor FROM budget_days WHERE id = ?",
            vec![day_id.into()],
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "total_spent_minor").unwrap()
}

#[tokio::test]
async fn day_total_tracks_creates_and_deletes() {
    let f = fixture().await;
    let day = f
        .engine
        .find_or_create_day(f.budget.id, date(2024, 5, 1))
        .await
        .unwrap();
    assert_eq!(day.total_spent, Amount::ZERO);

    f.engine
        .create_expense(NewExpenseCmd::new(day.id, f.salary.id, "-2000.00").description("salary"))
        .await
        .unwrap();
    let groceries = f
        .engine
        .create_expense(NewExpenseCmd::new(day.id, f.groceries.id, "45.30"))
        .await
        .unwrap();
    f.engine
        .create_expense(NewExpenseCmd::new(day.id, f.coffee.id, "12.00"))
        .await
        .unwrap();

    let view = f.engine.day_with_expenses(day.id).await.unwrap();
    assert_eq!(view.total_spent.to_string(), "-1942.70");
    assert_eq!(view.currency.code, "USD");
    assert_eq!(view.expenses.len(), 3);
    assert_eq!(view.expenses[0].description.as_deref(), Some("salary"));

    f.engine.delete_expense(groceries.id).await.unwrap();
    let view = f.engine.day_with_expenses(day.id).await.unwrap();
    assert_eq!(view.total_spent.to_string(), "-1988.00");
    assert_eq!(stored_total(&f.db, day.id).await, -198_800);
}

#[tokio::test]
async fn emptied_day_is_exactly_zero() {
    let f = fixture().await;
    let day = f
        .engine
        .find_or_create_day(f.budget.id, date(2024, 5, 2))
        .await
        .unwrap();
    let e = f
        .engine
        .create_expense(NewExpenseCmd::new(day.id, f.coffee.id, "3.10"))
        .await
        .unwrap();
    f.engine.delete_expense(e.id).await.unwrap();

    let view = f.engine.day_with_expenses(day.id).await.unwrap();
    assert_eq!(view.total_spent, Amount::ZERO);
    assert_eq!(view.total_spent.to_string(), "0.00");
    assert!(view.expenses.is_empty());
}

#[tokio::test]
async fn moving_an_expense_recomputes_both_days() {
    let f = fixture().await;
    let first = f
        .engine
        .find_or_create_day(f.budget.id, date(2024, 5, 1))
        .await
        .unwrap();
    let second = f
        .engine
        .find_or_create_day(f.budget.id, date(2024, 5, 2))
        .await
        .unwrap();
    let e = f
        .engine
        .create_expense(NewExpenseCmd::new(first.id, f.groceries.id, "20.00"))
        .await
        .unwrap();
    f.engine
        .create_expense(NewExpenseCmd::new(second.id, f.coffee.id, "2.50"))
        .await
        .unwrap();

    let moved = f
        .engine
        .update_expense(
            e.id,
            ExpensePatch::new().budget_day_id(second.id).amount("21.00"),
        )
        .await
        .unwrap();
    assert_eq!(moved.budget_day_id, second.id);
    assert_eq!(moved.amount, amount("21.00"));

    let first = f.engine.day_with_expenses(first.id).await.unwrap();
    let second = f.engine.day_with_expenses(second.id).await.unwrap();
    assert_eq!(first.total_spent, Amount::ZERO);
    assert_eq!(second.total_spent, amount("23.50"));
}

#[tokio::test]
async fn description_patch_keeps_total_and_empty_clears() {
    let f = fixture().await;
    let day = f
        .engine
        .find_or_create_day(f.budget.id, date(2024, 5, 1))
        .await
        .unwrap();
    let e = f
        .engine
        .create_expense(NewExpenseCmd::new(day.id, f.coffee.id, "4.00").description("latte"))
        .await
        .unwrap();

    let updated = f
        .engine
        .update_expense(e.id, ExpensePatch::new().description("  "))
        .await
        .unwrap();
    assert_eq!(updated.description, None);

    let unchanged = f
        .engine
        .update_expense(e.id, ExpensePatch::new())
        .await
        .unwrap();
    assert_eq!(unchanged, updated);
    assert_eq!(
        f.engine.day_with_expenses(day.id).await.unwrap().total_spent,
        amount("4.00")
    );
}

#[tokio::test]
async fn invalid_writes_leave_totals_untouched() {
    let f = fixture().await;
    let day = f
        .engine
        .find_or_create_day(f.budget.id, date(2024, 5, 1))
        .await
        .unwrap();
    let e = f
        .engine
        .create_expense(NewExpenseCmd::new(day.id, f.coffee.id, "1.00"))
        .await
        .unwrap();

    let err = f
        .engine
        .create_expense(NewExpenseCmd::new(day.id, f.coffee.id, "1.234"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "invalid_amount");

    let err = f
        .engine
        .create_expense(NewExpenseCmd::new(day.id, f.coffee.id, "10000000000.00"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "invalid_amount");

    let err = f
        .engine
        .create_expense(NewExpenseCmd::new(Uuid::new_v4(), f.coffee.id, "1.00"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "reference_not_found");

    let err = f
        .engine
        .create_expense(NewExpenseCmd::new(day.id, Uuid::new_v4(), "1.00"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "reference_not_found");

    let err = f
        .engine
        .update_expense(
            e.id,
            ExpensePatch::new().amount("9.99").category_id(Uuid::new_v4()),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "reference_not_found");

    let err = f
        .engine
        .update_expense(e.id, ExpensePatch::new().description("x").amount("abc"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "invalid_amount");

    assert_eq!(f.engine.expense(e.id).await.unwrap().amount, amount("1.00"));
    let view = f.engine.day_with_expenses(day.id).await.unwrap();
    assert_eq!(view.total_spent, amount("1.00"));
    assert_eq!(view.expenses.len(), 1);
}

#[tokio::test]
async fn overflowing_day_total_rolls_back_the_expense() {
    let f = fixture().await;
    let day = f
        .engine
        .find_or_create_day(f.budget.id, date(2024, 5, 1))
        .await
        .unwrap();
    f.engine
        .create_expense(NewExpenseCmd::new(day.id, f.salary.id, "9999999999.99"))
        .await
        .unwrap();

    // The amount itself is valid; only the new day total is out of range.
    let err = f
        .engine
        .create_expense(NewExpenseCmd::new(day.id, f.coffee.id, "0.01"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "invalid_amount");

    let view = f.engine.day_with_expenses(day.id).await.unwrap();
    assert_eq!(view.expenses.len(), 1);
    assert_eq!(view.total_spent, amount("9999999999.99"));
    assert_eq!(stored_total(&f.db, day.id).await, 999_999_999_999);
}

#[tokio::test]
async fn missing_targets_are_not_found() {
    let f = fixture().await;
    let missing = Uuid::new_v4();

    assert_eq!(
        f.engine.expense(missing).await.unwrap_err().code(),
        "not_found"
    );
    assert_eq!(
        f.engine
            .update_expense(missing, ExpensePatch::new().amount("1.00"))
            .await
            .unwrap_err()
            .code(),
        "not_found"
    );
    assert_eq!(
        f.engine.delete_expense(missing).await.unwrap_err().code(),
        "not_found"
    );
    assert_eq!(
        f.engine.day_with_expenses(missing).await.unwrap_err().code(),
        "not_found"
    );
    assert_eq!(
        f.engine.recompute_day(missing).await.unwrap_err().code(),
        "not_found"
    );
    assert_eq!(
        f.engine
            .find_or_create_day(missing, date(2024, 5, 1))
            .await
            .unwrap_err()
            .code(),
        "reference_not_found"
    );
}

#[tokio::test]
async fn find_or_create_is_idempotent() {
    let f = fixture().await;
    let a = f
        .engine
        .find_or_create_day(f.budget.id, date(2024, 5, 1))
        .await
        .unwrap();
    let b = f
        .engine
        .find_or_create_day(f.budget.id, date(2024, 5, 1))
        .await
        .unwrap();
    assert_eq!(a, b);

    let (c, d) = tokio::join!(
        f.engine.find_or_create_day(f.budget.id, date(2024, 5, 9)),
        f.engine.find_or_create_day(f.budget.id, date(2024, 5, 9)),
    );
    assert_eq!(c.unwrap().id, d.unwrap().id);

    let days = f
        .engine
        .list_days_for_budget(f.budget.id, "alice")
        .await
        .unwrap();
    let dates: Vec<_> = days.iter().map(|d| d.day.date).collect();
    assert_eq!(dates, vec![date(2024, 5, 1), date(2024, 5, 9)]);
}

#[tokio::test]
async fn concurrent_creates_sum_exactly() {
    let Fixture {
        engine, budget, coffee, ..
    } = fixture().await;
    let day = engine
        .find_or_create_day(budget.id, date(2024, 5, 1))
        .await
        .unwrap();

    let engine = Arc::new(engine);
    let mut tasks = JoinSet::new();
    for i in 0..20 {
        let engine = Arc::clone(&engine);
        let cmd = NewExpenseCmd::new(day.id, coffee.id, format!("{i}.01"));
        tasks.spawn(async move { engine.create_expense(cmd).await });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap().unwrap();
    }

    // 0 + 1 + ... + 19 units plus 20 cents.
    let view = engine.day_with_expenses(day.id).await.unwrap();
    assert_eq!(view.total_spent, amount("190.20"));
    assert_eq!(view.expenses.len(), 20);
}

#[tokio::test]
async fn recompute_and_reconcile_fix_stale_totals() {
    let f = fixture().await;
    let day = f
        .engine
        .find_or_create_day(f.budget.id, date(2024, 5, 1))
        .await
        .unwrap();
    let other = f
        .engine
        .find_or_create_day(f.budget.id, date(2024, 5, 2))
        .await
        .unwrap();
    f.engine
        .create_expense(NewExpenseCmd::new(day.id, f.groceries.id, "45.30"))
        .await
        .unwrap();

    let first = f.engine.recompute_day(day.id).await.unwrap();
    let second = f.engine.recompute_day(day.id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first, amount("45.30"));

    f.db.execute(Statement::from_sql_and_values(
        f.db.get_database_backend(),
        "UPDATE budget_days SET total_spent_minor = 1 WHERE id = ?",
        vec![day.id.into()],
    ))
    .await
    .unwrap();

    let corrected = f.engine.reconcile_budget(f.budget.id).await.unwrap();
    assert_eq!(corrected, vec![(day.id, amount("45.30"))]);
    assert_eq!(stored_total(&f.db, day.id).await, 4530);
    assert_eq!(stored_total(&f.db, other.id).await, 0);
    assert!(f
        .engine
        .reconcile_budget(f.budget.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn day_lifecycle() {
    let f = fixture().await;
    let day = f
        .engine
        .create_day(f.budget.id, date(2024, 5, 1))
        .await
        .unwrap();
    assert_eq!(
        f.engine
            .create_day(f.budget.id, date(2024, 5, 1))
            .await
            .unwrap_err(),
        EngineError::ExistingKey(format!("budget day {}", date(2024, 5, 1)))
    );

    f.engine
        .create_expense(NewExpenseCmd::new(day.id, f.coffee.id, "2.00"))
        .await
        .unwrap();
    f.engine
        .create_day(f.budget.id, date(2024, 5, 3))
        .await
        .unwrap();

    let err = f
        .engine
        .move_day(day.id, date(2024, 5, 3))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "existing_key");

    let moved = f.engine.move_day(day.id, date(2024, 5, 4)).await.unwrap();
    assert_eq!(moved.date, date(2024, 5, 4));
    assert_eq!(moved.total_spent, amount("2.00"));

    f.engine.delete_day(day.id).await.unwrap();
    assert_eq!(
        f.engine.day_with_expenses(day.id).await.unwrap_err().code(),
        "not_found"
    );
    let remaining = f
        .engine
        .list_days_for_budget(f.budget.id, "alice")
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);

    let err = f
        .engine
        .list_days_for_budget(f.budget.id, "bob")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "reference_not_found");
}

#[tokio::test]
async fn expenses_of_a_day_are_paged_oldest_first() {
    let f = fixture().await;
    let day = f
        .engine
        .find_or_create_day(f.budget.id, date(2024, 5, 1))
        .await
        .unwrap();
    let mut ids = Vec::new();
    for raw in ["1.00", "2.00", "3.00", "4.00", "5.00"] {
        let e = f
            .engine
            .create_expense(NewExpenseCmd::new(day.id, f.coffee.id, raw))
            .await
            .unwrap();
        ids.push(e.id);
    }

    let page = f
        .engine
        .list_expenses_for_day(day.id, PageRequest::new(2, 2))
        .await
        .unwrap();
    assert_eq!(page.meta.total_items, 5);
    assert_eq!(page.meta.total_pages, 3);
    assert!(page.meta.has_next_page);
    assert!(page.meta.has_previous_page);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].amount, amount("3.00"));
    assert_eq!(page.items[1].amount, amount("4.00"));

    let clamped = f
        .engine
        .list_expenses_for_day(day.id, PageRequest::new(0, 10_000))
        .await
        .unwrap();
    assert_eq!(clamped.meta.page, 1);
    assert_eq!(clamped.meta.limit, engine::DEFAULT_MAX_PAGE_SIZE);
    let listed: Vec<_> = clamped.items.iter().map(|e| e.id).collect();
    assert_eq!(listed, ids);
}

#[tokio::test]
async fn registry_validates_input() {
    let (engine, _db) = engine_with_db().await;
    let eur = engine.new_currency("eur", "Euro", "€").await.unwrap();
    assert_eq!(eur.code, "EUR");
    assert_eq!(engine.currency(eur.id).await.unwrap(), eur);
    assert_eq!(
        engine
            .new_currency("EUR", "Euro", "€")
            .await
            .unwrap_err()
            .code(),
        "existing_key"
    );
    assert_eq!(
        engine
            .new_currency("EURO", "Euro", "€")
            .await
            .unwrap_err()
            .code(),
        "invalid_name"
    );
    assert_eq!(
        engine.currency(Uuid::new_v4()).await.unwrap_err().code(),
        "not_found"
    );

    assert_eq!(
        engine
            .new_budget("alice", Uuid::new_v4(), "Main")
            .await
            .unwrap_err()
            .code(),
        "reference_not_found"
    );
    assert_eq!(
        engine
            .new_budget("alice", eur.id, "  ")
            .await
            .unwrap_err()
            .code(),
        "invalid_name"
    );
    let b1 = engine.new_budget("alice", eur.id, "Main").await.unwrap();
    let b2 = engine.new_budget("alice", eur.id, "Trip").await.unwrap();
    engine.new_budget("bob", eur.id, "Bob's").await.unwrap();
    let mine: Vec<_> = engine
        .budgets_for_user("alice")
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.id)
        .collect();
    assert_eq!(mine.len(), 2);
    assert!(mine.contains(&b1.id) && mine.contains(&b2.id));

    let category = engine.new_category("alice", "Food", None).await.unwrap();
    assert_eq!(category.color_hex, "#000000");
    assert_eq!(
        engine
            .new_category("alice", "Food", Some("green"))
            .await
            .unwrap_err()
            .code(),
        "invalid_name"
    );
}

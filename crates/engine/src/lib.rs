//! Budget ledger engine.
//!
//! Expenses are recorded against budget days. Each day caches the sum of its
//! expenses, and the engine keeps that cache exact: every expense write
//! recomputes the affected day(s) from the stored rows inside the same
//! database transaction. Statistics never read the cache; they re-derive their
//! sums from expense rows.

pub use budget_days::{BudgetDay, DayWithExpenses};
pub use budgets::Budget;
pub use categories::Category;
pub use commands::{ExpensePatch, NewExpenseCmd};
pub use currency::Currency;
pub use error::EngineError;
pub use expenses::Expense;
pub use money::{Amount, MAX_ABS_MINOR};
pub use ops::{DEFAULT_MAX_PAGE_SIZE, Engine, EngineBuilder};
pub use page::{Page, PageMeta, PageRequest};
pub use summaries::{CategorySummary, DayExpense, DaySummary};

mod budget_days;
mod budgets;
mod categories;
mod commands;
mod currency;
mod error;
mod expenses;
mod money;
mod ops;
mod page;
mod summaries;
mod util;

type ResultEngine<T> = Result<T, EngineError>;

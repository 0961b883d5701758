use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use engine::{Engine, NewExpenseCmd, PageRequest};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::Result,
    settings::{Settings, SettingsArgs},
};

mod error;
mod settings;

#[derive(Parser, Debug)]
#[command(name = "budget_admin")]
#[command(about = "Admin utilities for the budget ledger (reference data, repairs, stats)")]
struct Cli {
    #[command(flatten)]
    settings: SettingsArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(subcommand)]
    Currency(CurrencyCommand),
    #[command(subcommand)]
    Budget(BudgetCommand),
    #[command(subcommand)]
    Category(CategoryCommand),
    #[command(subcommand)]
    Day(DayCommand),
    #[command(subcommand)]
    Expense(ExpenseCommand),
    #[command(subcommand)]
    Stats(StatsCommand),
}

#[derive(Subcommand, Debug)]
enum CurrencyCommand {
    Create {
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        symbol: String,
    },
}

#[derive(Subcommand, Debug)]
enum BudgetCommand {
    Create {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        currency: Uuid,
        #[arg(long)]
        name: String,
    },
    List {
        #[arg(long)]
        owner: String,
    },
    /// Recompute every day of a budget and report stale totals.
    Reconcile {
        #[arg(long)]
        budget: Uuid,
    },
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    Create {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        name: String,
        /// `#RRGGBB`; defaults to black.
        #[arg(long)]
        color: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum DayCommand {
    Show {
        #[arg(long)]
        id: Uuid,
    },
    Recompute {
        #[arg(long)]
        id: Uuid,
    },
}

#[derive(Subcommand, Debug)]
enum ExpenseCommand {
    /// Record an expense on `date`, creating the budget day if needed.
    Add {
        #[arg(long)]
        budget: Uuid,
        /// `YYYY-MM-DD`.
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        category: Uuid,
        /// Decimal amount; negative for income.
        #[arg(long, allow_hyphen_values = true)]
        amount: String,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        #[arg(long)]
        id: Uuid,
    },
}

#[derive(Args, Debug)]
struct StatsArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    year: i32,
    #[arg(long)]
    month: u32,
    #[arg(long, default_value_t = 1)]
    page: u64,
    #[arg(long, default_value_t = 10)]
    limit: u64,
}

impl StatsArgs {
    fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

#[derive(Subcommand, Debug)]
enum StatsCommand {
    Days(StatsArgs),
    Categories(StatsArgs),
}

async fn connect_db(database_url: &str) -> Result<DatabaseConnection> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(engine: &Engine, command: Command) -> Result<()> {
    match command {
        Command::Currency(CurrencyCommand::Create { code, name, symbol }) => {
            print_json(&engine.new_currency(&code, &name, &symbol).await?)
        }
        Command::Budget(BudgetCommand::Create {
            owner,
            currency,
            name,
        }) => print_json(&engine.new_budget(&owner, currency, &name).await?),
        Command::Budget(BudgetCommand::List { owner }) => {
            print_json(&engine.budgets_for_user(&owner).await?)
        }
        Command::Budget(BudgetCommand::Reconcile { budget }) => {
            let corrected = engine.reconcile_budget(budget).await?;
            if corrected.is_empty() {
                tracing::info!(%budget, "all day totals are consistent");
            }
            print_json(&corrected)
        }
        Command::Category(CategoryCommand::Create { owner, name, color }) => {
            print_json(&engine.new_category(&owner, &name, color.as_deref()).await?)
        }
        Command::Day(DayCommand::Show { id }) => print_json(&engine.day_with_expenses(id).await?),
        Command::Day(DayCommand::Recompute { id }) => {
            print_json(&engine.recompute_day(id).await?)
        }
        Command::Expense(ExpenseCommand::Add {
            budget,
            date,
            category,
            amount,
            description,
        }) => {
            let day = engine.find_or_create_day(budget, date).await?;
            let mut cmd = NewExpenseCmd::new(day.id, category, amount);
            if let Some(description) = description {
                cmd = cmd.description(description);
            }
            print_json(&engine.create_expense(cmd).await?)
        }
        Command::Expense(ExpenseCommand::Delete { id }) => {
            engine.delete_expense(id).await?;
            tracing::info!(expense_id = %id, "deleted");
            Ok(())
        }
        Command::Stats(StatsCommand::Days(args)) => print_json(
            &engine
                .expenses_by_month(&args.user, args.year, args.month, args.page_request())
                .await?,
        ),
        Command::Stats(StatsCommand::Categories(args)) => print_json(
            &engine
                .category_stats(&args.user, args.year, args.month, args.page_request())
                .await?,
        ),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli.settings)?;

    tracing_subscriber::fmt()
        .with_env_filter(settings.env_filter())
        .init();

    let db = connect_db(&settings.database_url).await?;
    let engine = Engine::builder()
        .database(db)
        .max_page_size(settings.max_page_size)
        .build()
        .await?;

    if let Err(err) = run(&engine, cli.command).await {
        tracing::error!("{err}");
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_negative_amounts_and_dates() {
        let cli = Cli::try_parse_from([
            "budget_admin",
            "expense",
            "add",
            "--budget",
            "6f1c1c52-8f0e-4b7c-9a43-2f1f4a9c9a11",
            "--date",
            "2024-05-01",
            "--category",
            "0b6f7f39-1b7e-4d7e-8a1e-7c1f5b0e2d33",
            "--amount",
            "-2000.00",
        ])
        .unwrap();
        let Command::Expense(ExpenseCommand::Add { date, amount, .. }) = cli.command else {
            panic!("expected expense add");
        };
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(amount, "-2000.00");
    }
}

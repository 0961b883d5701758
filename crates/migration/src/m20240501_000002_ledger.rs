//! Ledger tables.
//!
//! `budget_days.total_spent_minor` caches `SUM(expenses.amount_minor)` of the
//! day. At most one day exists per `(budget_id, date)`; the unique index is
//! what concurrent find-or-create relies on.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Budgets {
    Table,
    Id,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
}

#[derive(Iden)]
enum BudgetDays {
    Table,
    Id,
    BudgetId,
    Date,
    TotalSpentMinor,
}

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    BudgetDayId,
    CategoryId,
    AmountMinor,
    Description,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BudgetDays::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BudgetDays::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BudgetDays::BudgetId).blob().not_null())
                    .col(ColumnDef::new(BudgetDays::Date).date().not_null())
                    .col(
                        ColumnDef::new(BudgetDays::TotalSpentMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budget_days-budget_id")
                            .from(BudgetDays::Table, BudgetDays::BudgetId)
                            .to(Budgets::Table, Budgets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-budget_days-budget_id-date-unique")
                    .table(BudgetDays::Table)
                    .col(BudgetDays::BudgetId)
                    .col(BudgetDays::Date)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Expenses::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Expenses::BudgetDayId).blob().not_null())
                    .col(ColumnDef::new(Expenses::CategoryId).blob().not_null())
                    .col(ColumnDef::new(Expenses::AmountMinor).big_integer().not_null())
                    .col(ColumnDef::new(Expenses::Description).string())
                    .col(ColumnDef::new(Expenses::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-budget_day_id")
                            .from(Expenses::Table, Expenses::BudgetDayId)
                            .to(BudgetDays::Table, BudgetDays::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-category_id")
                            .from(Expenses::Table, Expenses::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-budget_day_id-created_at")
                    .table(Expenses::Table)
                    .col(Expenses::BudgetDayId)
                    .col(Expenses::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BudgetDays::Table).to_owned())
            .await?;
        Ok(())
    }
}

use entity::HrTable;
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement, TransactionTrait};

use crate::{StoreResult, StoreSettings, connect};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Provisioned {
    Created,
    AlreadyExists,
}

/// Create `table` from `ddl` unless the catalog already lists it. Opens and
/// closes its own connection, so calls for different tables are independent.
pub async fn ensure_table(
    settings: &StoreSettings,
    table: HrTable,
    ddl: &str,
) -> StoreResult<Provisioned> {
    let db = connect(settings).await?;
    let outcome = create_if_absent(&db, table, ddl).await;
    db.close().await?;
    outcome
}

async fn create_if_absent(
    db: &DatabaseConnection,
    table: HrTable,
    ddl: &str,
) -> StoreResult<Provisioned> {
    let txn = db.begin().await?;
    let existing = txn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
            [table.name().into()],
        ))
        .await?;
    let outcome = if existing.is_some() {
        Provisioned::AlreadyExists
    } else {
        txn.execute_unprepared(ddl).await?;
        Provisioned::Created
    };
    txn.commit().await?;
    Ok(outcome)
}

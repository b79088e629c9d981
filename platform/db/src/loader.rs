use std::path::Path;

use entity::HrTable;
use sea_orm::{
    ConnectionTrait, DatabaseBackend, DatabaseConnection, FromQueryResult, QueryResult,
    Statement, TransactionTrait,
};
use tracing::debug;

use crate::frame::read_source;
use crate::{
    Cell, ColumnKind, Frame, StoreError, StoreResult, StoreSettings, TableColumn, connect,
};

/// Rows per INSERT statement; keeps bound parameters well under SQLite's limit.
const INSERT_BATCH: usize = 64;

/// Row counts around one merge-and-deduplicate load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadReport {
    pub table: HrTable,
    pub before: usize,
    pub after: usize,
}

impl LoadReport {
    pub fn inserted(&self) -> usize {
        self.after.saturating_sub(self.before)
    }
}

#[derive(Debug, FromQueryResult)]
struct ColumnInfoRow {
    name: String,
    declared_type: String,
    pk: i32,
}

/// Columns of `table` in declaration order, with the kind their declared
/// type maps to.
pub async fn table_columns<C: ConnectionTrait>(
    db: &C,
    table: HrTable,
) -> StoreResult<Vec<TableColumn>> {
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "SELECT name, type AS declared_type, pk FROM pragma_table_info(?) ORDER BY cid",
        [table.name().into()],
    );
    let columns = ColumnInfoRow::find_by_statement(stmt)
        .all(db)
        .await?
        .into_iter()
        .map(|row| TableColumn {
            kind: ColumnKind::from_declared(&row.declared_type),
            name: row.name,
            primary_key: row.pk > 0,
        })
        .collect::<Vec<_>>();
    if columns.is_empty() {
        return Err(StoreError::MissingTable(table));
    }
    Ok(columns)
}

/// Full contents of `table`. With `order_by_id` rows come back sorted by the
/// identifier column, otherwise in storage order.
pub async fn read_table<C: ConnectionTrait>(
    db: &C,
    table: HrTable,
    columns: &[TableColumn],
    order_by_id: bool,
) -> StoreResult<Frame> {
    let names = columns.iter().map(|c| c.name.clone()).collect::<Vec<_>>();
    let mut sql = format!("SELECT {} FROM {}", names.join(", "), table.name());
    if order_by_id {
        sql.push_str(&format!(" ORDER BY {}", table.id_column()));
    } else {
        sql.push_str(" ORDER BY rowid");
    }
    let rows = db
        .query_all(Statement::from_string(DatabaseBackend::Sqlite, sql))
        .await?;

    let mut frame = Frame::new(names);
    for row in rows {
        let cells = columns
            .iter()
            .map(|col| read_cell(&row, col))
            .collect::<StoreResult<Vec<_>>>()?;
        frame.push_row(cells);
    }
    Ok(frame)
}

fn read_cell(row: &QueryResult, column: &TableColumn) -> StoreResult<Cell> {
    let name = column.name.as_str();
    let cell = match column.kind {
        ColumnKind::Integer => row
            .try_get::<Option<i64>>("", name)?
            .map(Cell::Integer),
        ColumnKind::Real => row.try_get::<Option<f64>>("", name)?.map(Cell::real),
        ColumnKind::Date | ColumnKind::Text => row
            .try_get::<Option<String>>("", name)?
            .map(Cell::Text),
    };
    Ok(cell.unwrap_or(Cell::Null))
}

/// Merge `source` into `table`: existing rows first, then source rows,
/// exact duplicates dropped, and the table rewritten with the result.
///
/// Foreign keys are declared by the schema but not enforced on this
/// connection, so tables can be loaded in any order. A merged set that
/// repeats a primary key with different content fails the rewrite and
/// leaves the table untouched.
pub async fn load_table(
    settings: &StoreSettings,
    table: HrTable,
    source: &Path,
) -> StoreResult<LoadReport> {
    let db = connect(settings).await?;
    let outcome = merge_into(&db, table, source).await;
    db.close().await?;
    outcome
}

async fn merge_into(
    db: &DatabaseConnection,
    table: HrTable,
    source: &Path,
) -> StoreResult<LoadReport> {
    db.execute_unprepared("PRAGMA foreign_keys = OFF").await?;

    let columns = table_columns(db, table).await?;
    let incoming = read_source(source, table, &columns)?;
    if incoming.is_empty() {
        debug!(%table, source = %source.display(), "source has no rows");
    }
    let existing = read_table(db, table, &columns, false).await?;
    let before = existing.len();
    debug!(%table, existing = before, incoming = incoming.len(), "merging source rows");

    let merged = existing.merge_distinct(incoming);
    let after = merged.len();
    let key_positions = columns
        .iter()
        .enumerate()
        .filter(|(_, col)| col.primary_key)
        .map(|(idx, _)| idx)
        .collect::<Vec<_>>();
    if let Some(key) = merged.first_duplicate_key(&key_positions) {
        return Err(StoreError::DuplicateKey {
            table,
            key: key.iter().map(Cell::to_string).collect::<Vec<_>>().join(", "),
        });
    }

    let txn = db.begin().await?;
    match rewrite(&txn, table, &merged).await {
        Ok(()) => txn.commit().await?,
        Err(err) => {
            txn.rollback().await?;
            return Err(err);
        }
    }

    Ok(LoadReport {
        table,
        before,
        after,
    })
}

async fn rewrite<C: ConnectionTrait>(db: &C, table: HrTable, frame: &Frame) -> StoreResult<()> {
    db.execute_unprepared(&format!("DELETE FROM {}", table.name()))
        .await?;
    insert_rows(db, table, frame).await
}

async fn insert_rows<C: ConnectionTrait>(db: &C, table: HrTable, frame: &Frame) -> StoreResult<()> {
    let column_list = frame.columns().join(", ");
    let row_placeholders = format!("({})", vec!["?"; frame.columns().len()].join(", "));
    for chunk in frame.rows().chunks(INSERT_BATCH) {
        let sql = format!(
            "INSERT INTO {} ({column_list}) VALUES {}",
            table.name(),
            vec![row_placeholders.as_str(); chunk.len()].join(", ")
        );
        let values = chunk
            .iter()
            .flat_map(|row| row.iter().map(Cell::to_value))
            .collect::<Vec<_>>();
        db.execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            sql,
            values,
        ))
        .await?;
    }
    Ok(())
}

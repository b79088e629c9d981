//! Store primitives for the HR job: connection settings, schema provisioning
//! and merge-and-deduplicate loads of delimited source files.

mod frame;
mod loader;
mod provision;

use std::path::{Path, PathBuf};

use entity::HrTable;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use thiserror::Error;

pub use frame::{Cell, ColumnKind, Frame, TableColumn};
pub use loader::{LoadReport, load_table, read_table, table_columns};
pub use provision::{Provisioned, ensure_table};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://hr_analytics.db?mode=rwc";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] DbErr),
    #[error("cannot open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed source {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("table {table} would hold key ({key}) twice with different content")]
    DuplicateKey { table: HrTable, key: String },
    #[error("table {0} does not exist")]
    MissingTable(HrTable),
    #[error("source columns do not match table {table}: expected [{expected}], found [{found}]")]
    SchemaMismatch {
        table: HrTable,
        expected: String,
        found: String,
    },
    #[error("{}:{line}: column {column} cannot hold {value:?}", path.display())]
    InvalidValue {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Where the store lives. Only SQLite URLs are expected.
#[derive(Clone, Debug)]
pub struct StoreSettings {
    url: String,
}

fn default_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self { url: default_url() }
    }
}

impl StoreSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Settings for a database file, created on first connect.
    pub fn for_path(path: impl AsRef<Path>) -> Self {
        Self::new(format!("sqlite://{}?mode=rwc", path.as_ref().display()))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Open a dedicated single-connection handle. Dropping the handle closes it;
/// nothing is pooled across calls.
pub async fn connect(settings: &StoreSettings) -> StoreResult<DatabaseConnection> {
    let mut options = ConnectOptions::new(settings.url().to_owned());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    Database::connect(options).await.map_err(StoreError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_settings_create_missing_databases() {
        let settings = StoreSettings::for_path("/tmp/hr.db");
        assert_eq!(settings.url(), "sqlite:///tmp/hr.db?mode=rwc");
    }

    #[test]
    fn errors_name_the_table() {
        let err = StoreError::SchemaMismatch {
            table: HrTable::Dependents,
            expected: "dependent_id, name".into(),
            found: "id".into(),
        };
        assert!(err.to_string().contains("dependents"));
    }
}

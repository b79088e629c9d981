//! HR analytics: the fixed query catalog, the snapshot in-memory queries run
//! over, and the provision → load → query → report pipeline.

pub mod analytics;
mod catalog;
mod pipeline;
mod report;
mod settings;
mod snapshot;
pub mod store_queries;

use std::path::PathBuf;

use platform_db::StoreError;
use sea_orm::DbErr;
use thiserror::Error;

pub use catalog::CatalogQuery;
pub use pipeline::{LoadSummary, Pipeline, ProvisionSummary, RunSummary};
pub use report::{ReportSection, Reporter};
pub use settings::CatalogSettings;
pub use snapshot::Snapshot;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("database error: {0}")]
    Db(#[from] DbErr),
    #[error("snapshot of the store is unavailable")]
    SnapshotUnavailable,
    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot serialize report rows: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

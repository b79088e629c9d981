use std::path::PathBuf;

use entity::HrTable;
use platform_db::{LoadReport, Provisioned, StoreSettings, connect, ensure_table, load_table};
use tracing::{error, info, instrument, warn};

use crate::{CatalogQuery, CatalogResult, CatalogSettings, ReportSection, Reporter, Snapshot};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProvisionSummary {
    pub created: Vec<HrTable>,
    pub existing: Vec<HrTable>,
    pub failed: Vec<HrTable>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub reports: Vec<LoadReport>,
    pub failed: Vec<HrTable>,
}

impl LoadSummary {
    pub fn inserted(&self) -> usize {
        self.reports.iter().map(LoadReport::inserted).sum()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    pub provision: ProvisionSummary,
    pub load: LoadSummary,
    pub sections: Vec<ReportSection>,
    pub failed_queries: Vec<CatalogQuery>,
    /// Sections that could not be printed or exported.
    pub unwritten: usize,
}

/// Provision, load, query and report, each step awaited in order. Failures
/// are contained to the table or query they belong to.
#[derive(Clone, Debug)]
pub struct Pipeline {
    store: StoreSettings,
    data_dir: PathBuf,
    reporter: Reporter,
    catalog: CatalogSettings,
}

impl Pipeline {
    pub fn new(
        store: StoreSettings,
        data_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        catalog: CatalogSettings,
    ) -> Self {
        Self {
            store,
            data_dir: data_dir.into(),
            reporter: Reporter::new(output_dir),
            catalog,
        }
    }

    #[instrument(skip(self))]
    pub async fn provision(&self) -> ProvisionSummary {
        let mut summary = ProvisionSummary::default();
        for table in HrTable::ALL {
            match ensure_table(&self.store, table, migration::table_ddl(table)).await {
                Ok(Provisioned::Created) => {
                    info!(%table, "table created");
                    summary.created.push(table);
                }
                Ok(Provisioned::AlreadyExists) => {
                    info!(%table, "table already exists");
                    summary.existing.push(table);
                }
                Err(err) => {
                    error!(%table, error = %err, "table provisioning failed");
                    summary.failed.push(table);
                }
            }
        }
        summary
    }

    #[instrument(skip(self), fields(data_dir = %self.data_dir.display()))]
    pub async fn load(&self) -> LoadSummary {
        let mut summary = LoadSummary::default();
        for table in HrTable::ALL {
            let source = self.data_dir.join(table.source_file());
            match load_table(&self.store, table, &source).await {
                Ok(report) => {
                    if report.inserted() > 0 {
                        info!(%table, inserted = report.inserted(), total = report.after, "rows inserted");
                    } else {
                        info!(%table, total = report.after, "load unchanged");
                    }
                    summary.reports.push(report);
                }
                Err(err) => {
                    error!(%table, source = %source.display(), error = %err, "table load failed");
                    summary.failed.push(table);
                }
            }
        }
        summary
    }

    /// Run every catalog query over one connection and one snapshot. A query
    /// that fails is logged and left out of the result.
    pub async fn run_catalog(&self) -> CatalogResult<(Vec<ReportSection>, Vec<CatalogQuery>)> {
        self.run_queries(&CatalogQuery::all()).await
    }

    /// Run `queries` in order. The snapshot is only read when one of them
    /// works in memory.
    #[instrument(skip_all, fields(queries = queries.len()))]
    pub async fn run_queries(
        &self,
        queries: &[CatalogQuery],
    ) -> CatalogResult<(Vec<ReportSection>, Vec<CatalogQuery>)> {
        let db = connect(&self.store).await?;
        let snapshot = if queries.iter().any(CatalogQuery::needs_snapshot) {
            match Snapshot::load(&db).await {
                Ok(snapshot) => Some(snapshot),
                Err(err) => {
                    warn!(error = %err, "snapshot unavailable; in-memory queries will be skipped");
                    None
                }
            }
        } else {
            None
        };

        let mut sections = Vec::new();
        let mut failed = Vec::new();
        for query in queries {
            match query.execute(&db, snapshot.as_ref(), &self.catalog).await {
                Ok(section) => sections.push(section),
                Err(err) => {
                    error!(query = %query.title(), error = %err, "query failed");
                    failed.push(*query);
                }
            }
        }
        db.close().await?;
        Ok((sections, failed))
    }

    /// Print every section and write the exported ones. A section that
    /// cannot be written does not stop the others.
    pub fn report(&self, sections: &[ReportSection]) -> usize {
        let mut failures = 0;
        for section in sections {
            if let Err(err) = self.reporter.emit(section) {
                error!(query = %section.title, error = %err, "report failed");
                failures += 1;
            }
        }
        failures
    }

    pub async fn run(&self) -> CatalogResult<RunSummary> {
        let provision = self.provision().await;
        let load = self.load().await;
        let (sections, failed_queries) = self.run_catalog().await?;
        let unwritten = self.report(&sections);
        Ok(RunSummary {
            provision,
            load,
            sections,
            failed_queries,
            unwritten,
        })
    }
}

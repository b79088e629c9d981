mod config;

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use entity::HrTable;
use migration::{Migrator, MigratorTrait};
use platform_db::{StoreSettings, connect};
use platform_obs::{ObsConfig, init_tracing};
use products_hr::{CatalogQuery, Pipeline};
use tracing::{info, warn};

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "hr-analytics", version, about = "HR analytics batch job")]
struct Cli {
    /// SQLite store URL.
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,
    /// Directory holding the semicolon-delimited source files.
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    /// Directory the JSON reports are written to.
    #[arg(long, global = true, value_name = "DIR")]
    output_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Provision, load, query and report (default).
    Run,
    /// Create missing tables.
    Provision,
    /// Provision, then merge the source files into the store.
    Load,
    /// Query an already-loaded store and report.
    Report,
    /// Print every row of one table, e.g. `list employees`.
    List {
        #[arg(value_name = "TABLE")]
        table: HrTable,
    },
    /// Apply or roll back the schema migration.
    #[command(subcommand)]
    Migrate(MigrateCommand),
}

#[derive(Subcommand, Debug)]
enum MigrateCommand {
    /// Apply pending migrations.
    Up,
    /// Rollback the most recent migration.
    Down,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv().ok();
    let _guard = init_tracing(ObsConfig::default())?;
    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    if let Some(url) = cli.database_url {
        config.store = StoreSettings::new(url);
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(&config).await,
        Command::Provision => {
            let summary = pipeline(&config).provision().await;
            info!(
                created = summary.created.len(),
                existing = summary.existing.len(),
                failed = summary.failed.len(),
                "provisioning finished"
            );
            Ok(())
        }
        Command::Load => {
            let pipeline = pipeline(&config);
            pipeline.provision().await;
            let summary = pipeline.load().await;
            info!(
                inserted = summary.inserted(),
                failed = summary.failed.len(),
                "load finished"
            );
            Ok(())
        }
        Command::Report => {
            let pipeline = pipeline(&config);
            let (sections, failed) = pipeline.run_catalog().await?;
            let unwritten = pipeline.report(&sections);
            if !failed.is_empty() || unwritten > 0 {
                warn!(failed = failed.len(), unwritten, "report incomplete");
            }
            Ok(())
        }
        Command::List { table } => {
            let pipeline = pipeline(&config);
            let (sections, failed) = pipeline
                .run_queries(&[CatalogQuery::ListTable(table)])
                .await?;
            if !failed.is_empty() {
                return Err(anyhow!("cannot list table {table}"));
            }
            pipeline.report(&sections);
            Ok(())
        }
        Command::Migrate(MigrateCommand::Up) => migrate_up(&config.store).await,
        Command::Migrate(MigrateCommand::Down) => migrate_down(&config.store).await,
    }
}

fn pipeline(config: &AppConfig) -> Pipeline {
    Pipeline::new(
        config.store.clone(),
        config.data_dir.clone(),
        config.output_dir.clone(),
        config.catalog.clone(),
    )
}

async fn run(config: &AppConfig) -> Result<()> {
    info!(
        store = config.store.url(),
        data_dir = %config.data_dir.display(),
        "starting run"
    );
    let summary = pipeline(config).run().await?;
    if summary.provision.failed.len() == HrTable::ALL.len() {
        return Err(anyhow!("no table could be provisioned"));
    }
    info!(
        inserted = summary.load.inserted(),
        failed_tables = summary.load.failed.len(),
        queries = summary.sections.len(),
        failed_queries = summary.failed_queries.len(),
        unwritten = summary.unwritten,
        "run finished"
    );
    if summary.unwritten > 0 {
        warn!(unwritten = summary.unwritten, "some report sections were not written");
    }
    Ok(())
}

async fn migrate_up(store: &StoreSettings) -> Result<()> {
    let db = connect(store).await?;
    Migrator::up(&db, None).await?;
    info!("database migrations applied");
    Ok(())
}

async fn migrate_down(store: &StoreSettings) -> Result<()> {
    let db = connect(store).await?;
    Migrator::down(&db, Some(1)).await?;
    info!("most recent migration rolled back");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_takes_a_known_table_name() {
        let cli = Cli::try_parse_from(["hr-analytics", "list", "Salary_History"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::List {
                table: HrTable::SalaryHistory
            })
        ));

        let err = Cli::try_parse_from(["hr-analytics", "list", "payroll"]).unwrap_err();
        assert!(err.to_string().contains("unknown table payroll"), "{err}");
    }

    #[test]
    fn run_is_the_default_command() {
        let cli = Cli::try_parse_from(["hr-analytics", "--data-dir", "/srv/hr"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.data_dir, Some(PathBuf::from("/srv/hr")));
    }
}

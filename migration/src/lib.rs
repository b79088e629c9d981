pub use sea_orm_migration::prelude::*;

mod m20240601_000001_hr_schema;

pub use m20240601_000001_hr_schema::table_ddl;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20240601_000001_hr_schema::Migration)]
    }
}

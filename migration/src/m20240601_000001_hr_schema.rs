use entity::HrTable;
use sea_orm_migration::prelude::*;

const EMPLOYEES: &str = r#"
CREATE TABLE IF NOT EXISTS employees (
    employee_id INT NOT NULL PRIMARY KEY,
    name VARCHAR(100),
    role_id INT,
    department_id INT,
    salary REAL,
    gender VARCHAR(20),
    FOREIGN KEY (role_id) REFERENCES roles(role_id),
    FOREIGN KEY (department_id) REFERENCES departments(department_id)
);
"#;

const ROLES: &str = r#"
CREATE TABLE IF NOT EXISTS roles (
    role_id INT NOT NULL PRIMARY KEY,
    description VARCHAR(100),
    base_salary REAL,
    level VARCHAR(20),
    benefits VARCHAR(100)
);
"#;

const DEPARTMENTS: &str = r#"
CREATE TABLE IF NOT EXISTS departments (
    department_id INT NOT NULL PRIMARY KEY,
    department_name VARCHAR(100),
    manager_id INT,
    floor INT,
    functions TEXT,
    FOREIGN KEY (manager_id) REFERENCES employees(employee_id)
);
"#;

const SALARY_HISTORY: &str = r#"
CREATE TABLE IF NOT EXISTS salary_history (
    salary_history_id INT NOT NULL PRIMARY KEY,
    employee_id INT,
    effective_date DATE,
    salary REAL,
    FOREIGN KEY (employee_id) REFERENCES employees(employee_id)
);
"#;

const DEPENDENTS: &str = r#"
CREATE TABLE IF NOT EXISTS dependents (
    dependent_id INT NOT NULL PRIMARY KEY,
    employee_id INT,
    name VARCHAR(100),
    gender VARCHAR(20),
    age INT,
    FOREIGN KEY (employee_id) REFERENCES employees(employee_id)
);
"#;

const PROJECTS: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    project_id INT NOT NULL PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    start_date DATE,
    completion_date DATE,
    employee_id INT,
    cost REAL,
    status TEXT,
    FOREIGN KEY (employee_id) REFERENCES employees(employee_id)
);
"#;

const PROJECT_RESOURCES: &str = r#"
CREATE TABLE IF NOT EXISTS project_resources (
    project_resource_id INT NOT NULL PRIMARY KEY,
    project_id INT,
    resource_description TEXT,
    resource_type TEXT,
    quantity INTEGER,
    usage_date DATE,
    FOREIGN KEY (project_id) REFERENCES projects(project_id)
);
"#;

/// DDL that creates `table`. Every statement is `IF NOT EXISTS`, so running
/// it against a provisioned store is a no-op.
pub fn table_ddl(table: HrTable) -> &'static str {
    match table {
        HrTable::Employees => EMPLOYEES,
        HrTable::Roles => ROLES,
        HrTable::Departments => DEPARTMENTS,
        HrTable::SalaryHistory => SALARY_HISTORY,
        HrTable::Dependents => DEPENDENTS,
        HrTable::Projects => PROJECTS,
        HrTable::ProjectResources => PROJECT_RESOURCES,
    }
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();
        for table in HrTable::ALL {
            conn.execute_unprepared(table_ddl(table)).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // employees and departments reference each other, so with enforcement
        // on no drop order gets past the implicit DELETE of a loaded table.
        // One batch keeps the pragma and the drops on the same connection.
        let mut script = String::from("PRAGMA foreign_keys = OFF;\n");
        for table in HrTable::ALL.into_iter().rev() {
            script.push_str(&format!("DROP TABLE IF EXISTS {};\n", table.name()));
        }
        script.push_str("PRAGMA foreign_keys = ON;");
        manager.get_connection().execute_unprepared(&script).await?;
        Ok(())
    }
}

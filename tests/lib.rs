//! Fixtures shared by the end-to-end tests: a temporary workspace holding a
//! store file, a data directory and an output directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use entity::HrTable;

pub struct Workspace {
    _root: tempfile::TempDir,
    pub database: PathBuf,
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Workspace {
    pub fn new() -> Result<Self> {
        let root = tempfile::tempdir().context("create temp dir")?;
        let data_dir = root.path().join("data");
        let output_dir = root.path().join("out");
        std::fs::create_dir_all(&data_dir).context("create data dir")?;
        Ok(Self {
            database: root.path().join("hr.db"),
            data_dir,
            output_dir,
            _root: root,
        })
    }

    /// Write the source file for `table`: a header line then one line per row.
    pub fn write_source(&self, table: HrTable, header: &str, rows: &[&str]) -> Result<PathBuf> {
        let path = self.data_dir.join(table.source_file());
        let mut body = String::from(header);
        for row in rows {
            body.push('\n');
            body.push_str(row);
        }
        body.push('\n');
        std::fs::write(&path, body).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    pub fn output(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}

pub const ROLES: &str = "role_id;description;base_salary;level;benefits";
pub const DEPARTMENTS: &str = "department_id;department_name;manager_id;floor;functions";
pub const EMPLOYEES: &str = "employee_id;name;role_id;department_id;salary;gender";
pub const SALARY_HISTORY: &str = "salary_history_id;employee_id;effective_date;salary";
pub const DEPENDENTS: &str = "dependent_id;employee_id;name;gender;age";
pub const PROJECTS: &str =
    "project_id;name;description;start_date;completion_date;employee_id;cost;status";
pub const PROJECT_RESOURCES: &str =
    "project_resource_id;project_id;resource_description;resource_type;quantity;usage_date";

/// Three analysts in two departments, no dependents, two projects and a few
/// material resources.
pub fn small_company(workspace: &Workspace) -> Result<()> {
    workspace.write_source(HrTable::Roles, ROLES, &["1;Analyst;5000,00;Mid;Health plan"])?;
    workspace.write_source(
        HrTable::Departments,
        DEPARTMENTS,
        &["1;Finance;1;2;Budgeting", "2;Sales;3;1;NULL"],
    )?;
    workspace.write_source(
        HrTable::Employees,
        EMPLOYEES,
        &[
            "1;Ana;1;1;3000;Female",
            "2;Bruno;1;1;3000;Male",
            "3;Caio;1;2;5000;Male",
        ],
    )?;
    workspace.write_source(
        HrTable::SalaryHistory,
        SALARY_HISTORY,
        &[
            "1;1;2023-01-15;2800",
            "2;1;2023-03-15;3000",
            "3;3;15/02/2023;5000",
        ],
    )?;
    workspace.write_source(HrTable::Dependents, DEPENDENTS, &[])?;
    workspace.write_source(
        HrTable::Projects,
        PROJECTS,
        &[
            "1;Ledger;Close the books;2023-01-01;2023-03-01;1;1200.5;completed",
            "2;Outreach;Regional campaign;2023-02-01;NULL;3;800;in execution",
        ],
    )?;
    workspace.write_source(
        HrTable::ProjectResources,
        PROJECT_RESOURCES,
        &[
            "1;1;Paper;material;40;2023-01-10",
            "2;2;Laptop;equipment;2;2023-02-02",
            "3;2;Flyers;material;500;2023-02-10",
        ],
    )?;
    Ok(())
}

pub fn read_json(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

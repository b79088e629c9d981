use std::fmt;
use std::str::FromStr;

/// Every table the job knows about. Table and key column names that end up
/// inside SQL text come from here and nowhere else.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HrTable {
    Roles,
    Departments,
    Employees,
    SalaryHistory,
    Dependents,
    Projects,
    ProjectResources,
}

impl HrTable {
    /// Provisioning and load order: referenced tables first. The
    /// employees/departments pair references each other and relies on the
    /// store tolerating forward references.
    pub const ALL: [HrTable; 7] = [
        HrTable::Roles,
        HrTable::Departments,
        HrTable::Employees,
        HrTable::SalaryHistory,
        HrTable::Dependents,
        HrTable::Projects,
        HrTable::ProjectResources,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HrTable::Roles => "roles",
            HrTable::Departments => "departments",
            HrTable::Employees => "employees",
            HrTable::SalaryHistory => "salary_history",
            HrTable::Dependents => "dependents",
            HrTable::Projects => "projects",
            HrTable::ProjectResources => "project_resources",
        }
    }

    /// Identifier column, named after the singular form of the table.
    pub fn id_column(self) -> &'static str {
        match self {
            HrTable::Roles => "role_id",
            HrTable::Departments => "department_id",
            HrTable::Employees => "employee_id",
            HrTable::SalaryHistory => "salary_history_id",
            HrTable::Dependents => "dependent_id",
            HrTable::Projects => "project_id",
            HrTable::ProjectResources => "project_resource_id",
        }
    }

    /// Source file paired with the table inside the data directory.
    pub fn source_file(self) -> &'static str {
        match self {
            HrTable::Roles => "roles.csv",
            HrTable::Departments => "departments.csv",
            HrTable::Employees => "employees.csv",
            HrTable::SalaryHistory => "salary_history.csv",
            HrTable::Dependents => "dependents.csv",
            HrTable::Projects => "projects.csv",
            HrTable::ProjectResources => "project_resources.csv",
        }
    }
}

impl fmt::Display for HrTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTable(pub String);

impl fmt::Display for UnknownTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown table {}", self.0)
    }
}

impl std::error::Error for UnknownTable {}

impl FromStr for HrTable {
    type Err = UnknownTable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        HrTable::ALL
            .into_iter()
            .find(|table| table.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownTable(wanted.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_columns_use_singular_table_names() {
        for table in HrTable::ALL {
            let id = table.id_column();
            let stem = id.trim_end_matches("_id");
            assert!(
                table.name().starts_with(stem),
                "{id} does not derive from {table}"
            );
        }
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("Employees".parse::<HrTable>(), Ok(HrTable::Employees));
        assert_eq!(
            "project_resources".parse::<HrTable>(),
            Ok(HrTable::ProjectResources)
        );
        assert!("employees; DROP TABLE roles".parse::<HrTable>().is_err());
    }
}

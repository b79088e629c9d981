use entity::HrTable;
use sea_orm::ConnectionTrait;

use crate::analytics;
use crate::store_queries;
use crate::{CatalogError, CatalogResult, CatalogSettings, ReportSection, Snapshot};

/// The fixed query catalog, in report order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CatalogQuery {
    ListTable(HrTable),
    EmployeesWithDetails,
    EmployeesWithRaise,
    AverageDependentAgeByDepartment,
    InternsWithDependents,
    HighestAverageSalary,
    AnalystsWithTwoDaughters,
    TopPaidAnalystInBand,
    DepartmentWithMostDependents,
    AverageSalaryByDepartment,
    CompletedProjectSalaryByDepartment,
    TopMaterialResources,
    CompletedProjectCostByDepartment,
    ProjectsInExecution,
    ProjectWithMostDependents,
}

impl CatalogQuery {
    /// Every query, one `ListTable` per table first.
    pub fn all() -> Vec<Self> {
        let mut queries = HrTable::ALL
            .into_iter()
            .map(Self::ListTable)
            .collect::<Vec<_>>();
        queries.extend([
            Self::EmployeesWithDetails,
            Self::EmployeesWithRaise,
            Self::AverageDependentAgeByDepartment,
            Self::InternsWithDependents,
            Self::HighestAverageSalary,
            Self::AnalystsWithTwoDaughters,
            Self::TopPaidAnalystInBand,
            Self::DepartmentWithMostDependents,
            Self::AverageSalaryByDepartment,
            Self::CompletedProjectSalaryByDepartment,
            Self::TopMaterialResources,
            Self::CompletedProjectCostByDepartment,
            Self::ProjectsInExecution,
            Self::ProjectWithMostDependents,
        ]);
        queries
    }

    pub fn title(&self) -> String {
        let title = match self {
            Self::ListTable(table) => return format!("All rows of {table}"),
            Self::EmployeesWithDetails => "Employees with role, department and dependents",
            Self::EmployeesWithRaise => "Employees with a raise in the review window",
            Self::AverageDependentAgeByDepartment => "Average dependent age by department",
            Self::InternsWithDependents => "Interns with dependents",
            Self::HighestAverageSalary => "Employee with the highest average salary",
            Self::AnalystsWithTwoDaughters => "Male analysts with exactly two daughters",
            Self::TopPaidAnalystInBand => "Best-paid analyst within the salary band",
            Self::DepartmentWithMostDependents => "Department with the most dependents",
            Self::AverageSalaryByDepartment => "Average salary by department",
            Self::CompletedProjectSalaryByDepartment => {
                "Average salary on completed projects by department"
            }
            Self::TopMaterialResources => "Most used material resources",
            Self::CompletedProjectCostByDepartment => "Completed project cost by department",
            Self::ProjectsInExecution => "Projects in execution",
            Self::ProjectWithMostDependents => "Project whose owner has the most dependents",
        };
        title.to_string()
    }

    /// JSON file the result is also written to.
    pub fn export_file(&self) -> Option<&'static str> {
        match self {
            Self::CompletedProjectSalaryByDepartment => {
                Some("completed_project_salary_by_department.json")
            }
            Self::TopMaterialResources => Some("top_material_resources.json"),
            Self::CompletedProjectCostByDepartment => {
                Some("completed_project_cost_by_department.json")
            }
            _ => None,
        }
    }

    pub fn needs_snapshot(&self) -> bool {
        !matches!(
            self,
            Self::ListTable(_)
                | Self::EmployeesWithDetails
                | Self::EmployeesWithRaise
                | Self::AverageDependentAgeByDepartment
                | Self::InternsWithDependents
        )
    }

    pub async fn execute<C: ConnectionTrait>(
        &self,
        db: &C,
        snapshot: Option<&Snapshot>,
        settings: &CatalogSettings,
    ) -> CatalogResult<ReportSection> {
        let title = self.title();
        let section = match self {
            Self::ListTable(table) => {
                let frame = store_queries::list_table(db, *table).await?;
                ReportSection::from_frame(title, &frame)?
            }
            Self::EmployeesWithDetails => {
                let rows = store_queries::employees_with_details(db).await?;
                ReportSection::from_rows(title, &rows)?
            }
            Self::EmployeesWithRaise => {
                let rows = store_queries::employees_with_raise(db, settings).await?;
                ReportSection::from_rows(title, &rows)?
            }
            Self::AverageDependentAgeByDepartment => {
                let rows = store_queries::average_dependent_age_by_department(db).await?;
                ReportSection::from_rows(title, &rows)?
            }
            Self::InternsWithDependents => {
                let rows = store_queries::interns_with_dependents(db, settings).await?;
                ReportSection::from_rows(title, &rows)?
            }
            Self::HighestAverageSalary => ReportSection::from_optional(
                title,
                analytics::highest_average_salary(snapshot_of(snapshot)?).as_ref(),
            )?,
            Self::AnalystsWithTwoDaughters => ReportSection::from_rows(
                title,
                &analytics::analysts_with_two_daughters(snapshot_of(snapshot)?, settings),
            )?,
            Self::TopPaidAnalystInBand => ReportSection::from_optional(
                title,
                analytics::top_paid_analyst_in_band(snapshot_of(snapshot)?, settings).as_ref(),
            )?,
            Self::DepartmentWithMostDependents => ReportSection::from_optional(
                title,
                analytics::department_with_most_dependents(snapshot_of(snapshot)?).as_ref(),
            )?,
            Self::AverageSalaryByDepartment => ReportSection::from_rows(
                title,
                &analytics::average_salary_by_department(snapshot_of(snapshot)?),
            )?,
            Self::CompletedProjectSalaryByDepartment => ReportSection::from_rows(
                title,
                &analytics::completed_project_salary_by_department(
                    snapshot_of(snapshot)?,
                    settings,
                ),
            )?,
            Self::TopMaterialResources => ReportSection::from_rows(
                title,
                &analytics::top_material_resources(snapshot_of(snapshot)?, settings),
            )?,
            Self::CompletedProjectCostByDepartment => ReportSection::from_rows(
                title,
                &analytics::completed_project_cost_by_department(
                    snapshot_of(snapshot)?,
                    settings,
                ),
            )?,
            Self::ProjectsInExecution => ReportSection::from_rows(
                title,
                &analytics::projects_in_execution(snapshot_of(snapshot)?, settings),
            )?,
            Self::ProjectWithMostDependents => ReportSection::from_optional(
                title,
                analytics::project_with_most_dependents(snapshot_of(snapshot)?).as_ref(),
            )?,
        };
        Ok(section.exported_as(self.export_file()))
    }
}

fn snapshot_of(snapshot: Option<&Snapshot>) -> CatalogResult<&Snapshot> {
    snapshot.ok_or(CatalogError::SnapshotUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lists_every_table_then_fourteen_queries() {
        let all = CatalogQuery::all();
        assert_eq!(all.len(), HrTable::ALL.len() + 14);
        assert_eq!(all[0], CatalogQuery::ListTable(HrTable::Roles));
        assert_eq!(
            all.iter().filter(|q| q.export_file().is_some()).count(),
            3
        );
        assert_eq!(all.iter().filter(|q| q.needs_snapshot()).count(), 10);
    }

    #[tokio::test]
    async fn in_memory_queries_need_a_snapshot() {
        let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        let err = CatalogQuery::AverageSalaryByDepartment
            .execute(&db, None, &CatalogSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::SnapshotUnavailable));
    }

    #[tokio::test]
    async fn exported_queries_carry_their_file_name() {
        let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        let section = CatalogQuery::TopMaterialResources
            .execute(&db, Some(&Snapshot::default()), &CatalogSettings::default())
            .await
            .unwrap();
        assert_eq!(section.export, Some("top_material_resources.json"));
        assert!(section.rows.is_empty());
    }
}

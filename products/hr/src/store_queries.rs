//! Catalog queries answered by SQL against the store. Identifiers come from
//! [`HrTable`]; every literal is a bound parameter.

use entity::HrTable;
use platform_db::{Frame, read_table, table_columns};
use sea_orm::{ConnectionTrait, DatabaseBackend, FromQueryResult, Statement};
use serde::Serialize;

use crate::{CatalogResult, CatalogSettings};

/// Query 1: every row of `table`, ordered by its identifier column.
pub async fn list_table<C: ConnectionTrait>(db: &C, table: HrTable) -> CatalogResult<Frame> {
    let columns = table_columns(db, table).await?;
    Ok(read_table(db, table, &columns, true).await?)
}

#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct EmployeeDetail {
    pub employee: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
    pub dependent: Option<String>,
}

/// Query 2: employees with their role and department, one row per
/// dependent (or a single row without one).
pub async fn employees_with_details<C: ConnectionTrait>(
    db: &C,
) -> CatalogResult<Vec<EmployeeDetail>> {
    let sql = "SELECT e.name AS employee, r.description AS role,
                d.department_name AS department, dep.name AS dependent
         FROM employees e
         JOIN roles r ON e.role_id = r.role_id
         JOIN departments d ON e.department_id = d.department_id
         LEFT JOIN dependents dep ON e.employee_id = dep.employee_id
         ORDER BY e.employee_id, dep.dependent_id";
    let stmt = Statement::from_string(DatabaseBackend::Sqlite, sql);
    Ok(EmployeeDetail::find_by_statement(stmt).all(db).await?)
}

#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct EmployeeName {
    pub name: Option<String>,
}

/// Query 3: employees whose salary history inside the raise window holds
/// more than one distinct salary.
pub async fn employees_with_raise<C: ConnectionTrait>(
    db: &C,
    settings: &CatalogSettings,
) -> CatalogResult<Vec<EmployeeName>> {
    let sql = "SELECT e.name AS name
         FROM employees e
         JOIN salary_history sh ON e.employee_id = sh.employee_id
         WHERE sh.effective_date BETWEEN ? AND ?
         GROUP BY e.name
         HAVING MIN(sh.salary) <> MAX(sh.salary)
         ORDER BY e.name";
    let values = vec![
        settings.raise_window_from.clone().into(),
        settings.raise_window_to.clone().into(),
    ];
    let stmt = Statement::from_sql_and_values(DatabaseBackend::Sqlite, sql, values);
    Ok(EmployeeName::find_by_statement(stmt).all(db).await?)
}

#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct DepartmentAverageAge {
    pub department: Option<String>,
    pub average_age: Option<i64>,
}

/// Query 4: mean dependent age per department, rounded half away from zero.
pub async fn average_dependent_age_by_department<C: ConnectionTrait>(
    db: &C,
) -> CatalogResult<Vec<DepartmentAverageAge>> {
    let sql = "SELECT d.department_name AS department,
                CAST(ROUND(AVG(dep.age)) AS INTEGER) AS average_age
         FROM departments d
         JOIN employees e ON d.department_id = e.department_id
         JOIN dependents dep ON e.employee_id = dep.employee_id
         GROUP BY d.department_name
         ORDER BY d.department_name";
    let stmt = Statement::from_string(DatabaseBackend::Sqlite, sql);
    Ok(DepartmentAverageAge::find_by_statement(stmt).all(db).await?)
}

/// Query 5: interns with at least one dependent.
pub async fn interns_with_dependents<C: ConnectionTrait>(
    db: &C,
    settings: &CatalogSettings,
) -> CatalogResult<Vec<EmployeeName>> {
    let sql = "SELECT DISTINCT e.name AS name
         FROM employees e
         JOIN roles r ON e.role_id = r.role_id
         JOIN dependents dep ON e.employee_id = dep.employee_id
         WHERE LOWER(TRIM(r.description)) = LOWER(TRIM(?))
         ORDER BY e.name";
    let stmt = Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        sql,
        [settings.intern_role.clone().into()],
    );
    Ok(EmployeeName::find_by_statement(stmt).all(db).await?)
}

#[cfg(test)]
mod tests {
    use platform_db::{Cell, StoreSettings, connect, ensure_table};
    use sea_orm::DatabaseConnection;

    use super::*;

    async fn seeded(inserts: &[&str]) -> (tempfile::TempDir, DatabaseConnection) {
        let dir = tempfile::tempdir().unwrap();
        let settings = StoreSettings::for_path(dir.path().join("hr.db"));
        for table in HrTable::ALL {
            ensure_table(&settings, table, migration::table_ddl(table))
                .await
                .unwrap();
        }
        let db = connect(&settings).await.unwrap();
        db.execute_unprepared("PRAGMA foreign_keys = OFF").await.unwrap();
        for sql in inserts {
            db.execute_unprepared(sql).await.unwrap();
        }
        (dir, db)
    }

    const BASE: [&str; 3] = [
        "INSERT INTO roles VALUES (1, 'Intern', 1500, 'Junior', NULL), (2, 'Analyst', 5000, 'Mid', NULL)",
        "INSERT INTO departments VALUES (1, 'Finance', 2, 3, NULL), (2, 'Sales', 3, 1, NULL)",
        "INSERT INTO employees VALUES (2, 'Bruno', 2, 1, 6000, 'Male'), (1, 'Ana', 1, 1, 1500, 'Female'), (3, 'Caio', 1, 2, 1600, 'Male')",
    ];

    #[tokio::test]
    async fn lists_tables_by_identifier() {
        let (_dir, db) = seeded(&BASE).await;
        let frame = list_table(&db, HrTable::Employees).await.unwrap();
        let ids = frame.rows().iter().map(|r| r[0].clone()).collect::<Vec<_>>();
        assert_eq!(ids, vec![Cell::Integer(1), Cell::Integer(2), Cell::Integer(3)]);
        assert_eq!(frame.columns()[1], "name");
    }

    #[tokio::test]
    async fn details_keep_employees_without_dependents() {
        let mut inserts = BASE.to_vec();
        inserts.push("INSERT INTO dependents VALUES (1, 1, 'Lia', 'Female', 4), (2, 1, 'Leo', 'Male', 6)");
        let (_dir, db) = seeded(&inserts).await;

        let rows = employees_with_details(&db).await.unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].dependent.as_deref(), Some("Lia"));
        assert_eq!(rows[1].dependent.as_deref(), Some("Leo"));
        let bruno = &rows[2];
        assert_eq!(bruno.employee.as_deref(), Some("Bruno"));
        assert_eq!(bruno.role.as_deref(), Some("Analyst"));
        assert_eq!(bruno.department.as_deref(), Some("Finance"));
        assert_eq!(bruno.dependent, None);
    }

    #[tokio::test]
    async fn raises_need_different_salaries_inside_the_window() {
        let mut inserts = BASE.to_vec();
        inserts.push(
            "INSERT INTO salary_history VALUES
                (1, 1, '2023-02-10', 1500), (2, 1, '2023-03-10', 1500),
                (3, 2, '2023-02-10', 5500), (4, 2, '2023-04-10', 6000),
                (5, 3, '2022-11-10', 1400), (6, 3, '2023-03-01', 1600)",
        );
        let (_dir, db) = seeded(&inserts).await;

        let names = employees_with_raise(&db, &CatalogSettings::default())
            .await
            .unwrap();
        assert_eq!(
            names,
            vec![EmployeeName {
                name: Some("Bruno".into())
            }]
        );
    }

    #[tokio::test]
    async fn dependent_ages_average_per_department() {
        let mut inserts = BASE.to_vec();
        inserts.push(
            "INSERT INTO dependents VALUES (1, 1, 'Lia', 'Female', 4), (2, 2, 'Leo', 'Male', 7), (3, 3, 'Rui', 'Male', 10)",
        );
        let (_dir, db) = seeded(&inserts).await;

        let rows = average_dependent_age_by_department(&db).await.unwrap();
        assert_eq!(
            rows,
            vec![
                DepartmentAverageAge {
                    department: Some("Finance".into()),
                    average_age: Some(6),
                },
                DepartmentAverageAge {
                    department: Some("Sales".into()),
                    average_age: Some(10),
                },
            ]
        );
    }

    #[tokio::test]
    async fn interns_are_matched_by_role_description() {
        let mut inserts = BASE.to_vec();
        inserts.push(
            "INSERT INTO dependents VALUES (1, 1, 'Lia', 'Female', 4), (2, 1, 'Leo', 'Male', 6), (3, 2, 'Rui', 'Male', 10)",
        );
        let (_dir, db) = seeded(&inserts).await;

        let settings = CatalogSettings {
            intern_role: "intern".into(),
            ..CatalogSettings::default()
        };
        let names = interns_with_dependents(&db, &settings).await.unwrap();
        assert_eq!(
            names,
            vec![EmployeeName {
                name: Some("Ana".into())
            }]
        );
    }
}

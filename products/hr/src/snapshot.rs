use std::collections::HashMap;

use entity::{department, dependent, employee, project, project_resource, role, salary_history};
use sea_orm::sea_query::Expr;
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Order, QueryOrder};

/// Every table read once after loading. In-memory catalog queries work on
/// this copy so they agree with the store-backed ones.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub employees: Vec<employee::Model>,
    pub roles: Vec<role::Model>,
    pub departments: Vec<department::Model>,
    pub salary_history: Vec<salary_history::Model>,
    pub dependents: Vec<dependent::Model>,
    pub projects: Vec<project::Model>,
    pub project_resources: Vec<project_resource::Model>,
}

impl Snapshot {
    pub async fn load<C: ConnectionTrait>(db: &C) -> Result<Self, DbErr> {
        Ok(Self {
            employees: in_storage_order::<employee::Entity, _>(db).await?,
            roles: in_storage_order::<role::Entity, _>(db).await?,
            departments: in_storage_order::<department::Entity, _>(db).await?,
            salary_history: in_storage_order::<salary_history::Entity, _>(db).await?,
            dependents: in_storage_order::<dependent::Entity, _>(db).await?,
            projects: in_storage_order::<project::Entity, _>(db).await?,
            project_resources: in_storage_order::<project_resource::Entity, _>(db).await?,
        })
    }

    pub fn employees_by_id(&self) -> HashMap<i32, &employee::Model> {
        self.employees
            .iter()
            .map(|employee| (employee.employee_id, employee))
            .collect()
    }

    pub fn departments_by_id(&self) -> HashMap<i32, &department::Model> {
        self.departments
            .iter()
            .map(|department| (department.department_id, department))
            .collect()
    }
}

/// Rows in the order the last load wrote them: existing rows first, then
/// new ones.
async fn in_storage_order<E, C>(db: &C) -> Result<Vec<E::Model>, DbErr>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    E::find()
        .order_by(Expr::cust("rowid"), Order::Asc)
        .all(db)
        .await
}

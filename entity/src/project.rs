use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub project_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<Date>,
    pub completion_date: Option<Date>,
    /// Responsible employee.
    #[sea_orm(indexed)]
    pub employee_id: Option<i32>,
    pub cost: Option<f64>,
    /// Free-text state label such as "in progress" or "completed".
    pub status: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::EmployeeId"
    )]
    Employee,
    #[sea_orm(has_many = "super::project_resource::Entity")]
    ProjectResource,
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl Related<super::project_resource::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProjectResource.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

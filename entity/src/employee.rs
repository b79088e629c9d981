use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub employee_id: i32,
    pub name: Option<String>,
    pub role_id: Option<i32>,
    pub department_id: Option<i32>,
    pub salary: Option<f64>,
    pub gender: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::role::Entity",
        from = "Column::RoleId",
        to = "super::role::Column::RoleId"
    )]
    Role,
    #[sea_orm(
        belongs_to = "super::department::Entity",
        from = "Column::DepartmentId",
        to = "super::department::Column::DepartmentId"
    )]
    Department,
    #[sea_orm(has_many = "super::dependent::Entity")]
    Dependent,
    #[sea_orm(has_many = "super::salary_history::Entity")]
    SalaryHistory,
    #[sea_orm(has_many = "super::project::Entity")]
    Project,
}

impl Related<super::role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

impl Related<super::department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl Related<super::dependent::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dependent.def()
    }
}

impl Related<super::salary_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalaryHistory.def()
    }
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

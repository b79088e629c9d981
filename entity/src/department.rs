use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "departments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub department_id: i32,
    pub department_name: Option<String>,
    /// Managing employee; the employees table points back here, so the
    /// reference is declared but never enforced while loading.
    pub manager_id: Option<i32>,
    pub floor: Option<i32>,
    pub functions: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Employee,
    Manager,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Self::Employee => Entity::has_many(super::employee::Entity).into(),
            Self::Manager => Entity::belongs_to(super::employee::Entity)
                .from(Column::ManagerId)
                .to(super::employee::Column::EmployeeId)
                .into(),
        }
    }
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "project_resources")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub project_resource_id: i32,
    #[sea_orm(indexed)]
    pub project_id: Option<i32>,
    pub resource_description: Option<String>,
    pub resource_type: Option<String>,
    pub quantity: Option<i64>,
    pub usage_date: Option<Date>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::ProjectId"
    )]
    Project,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

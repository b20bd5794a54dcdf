use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "weeks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub week_number: i32,
    pub year: i32,
    pub date_range_start: String,
    pub date_range_end: String,
    pub report_count: i32,
    pub locked_count: i32,
    pub unlocked_count: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::review_report::Entity")]
    ReviewReport,
    #[sea_orm(has_many = "super::integration_report::Entity")]
    IntegrationReport,
}

impl Related<super::review_report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReviewReport.def()
    }
}

impl Related<super::integration_report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IntegrationReport.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "visitors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub restaurant_id: String,
    pub device_id: String,
    pub visit_count: i32,
    pub orders_in_current_session: i32,
    pub last_session_at: DateTimeUtc,
    pub last_visit_at: Option<DateTimeUtc>,
    pub last_counted_at: Option<DateTimeUtc>,
    pub total_points: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

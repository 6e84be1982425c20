use sea_orm::entity::prelude::*;

/// Lookup table; `status` holds the one-letter code (`C`, `P`, `E`).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "event_statuses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub status: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

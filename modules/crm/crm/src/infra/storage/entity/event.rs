use crm_db::secure::ScopableEntity;
use crm_security::properties;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub client_id: i64,
    pub support_contact_id: i64,
    pub event_status_id: i64,
    pub attendees: i32,
    pub event_date: DateTimeUtc,
    pub notes: String,
    pub date_created: DateTimeUtc,
    pub date_updated: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl ScopableEntity for Entity {
    fn id_column() -> Self::Column {
        Column::Id
    }

    fn resolve_property(property: &str) -> Option<Self::Column> {
        match property {
            properties::ID => Some(Column::Id),
            properties::CLIENT_ID => Some(Column::ClientId),
            properties::SUPPORT_CONTACT_ID => Some(Column::SupportContactId),
            _ => None,
        }
    }
}

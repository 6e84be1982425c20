use crm_db::secure::ScopableEntity;
use crm_security::properties;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub phone: String,
    pub mobile: String,
    pub sales_contact_id: i64,
    pub date_created: DateTimeUtc,
    pub date_updated: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

// Clients are narrowed by owner (sales) or by id (support, via events).
impl ScopableEntity for Entity {
    fn id_column() -> Self::Column {
        Column::Id
    }

    fn resolve_property(property: &str) -> Option<Self::Column> {
        match property {
            properties::ID => Some(Column::Id),
            properties::SALES_CONTACT_ID => Some(Column::SalesContactId),
            _ => None,
        }
    }
}

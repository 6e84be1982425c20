use crm_db::secure::ScopableEntity;
use crm_security::properties;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "contracts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub sales_contact_id: i64,
    pub client_id: i64,
    pub status: bool,
    #[sea_orm(column_type = "Decimal(Some((9, 2)))")]
    pub amount: Decimal,
    pub payment_due: DateTimeUtc,
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
            properties::SALES_CONTACT_ID => Some(Column::SalesContactId),
            properties::CLIENT_ID => Some(Column::ClientId),
            _ => None,
        }
    }
}

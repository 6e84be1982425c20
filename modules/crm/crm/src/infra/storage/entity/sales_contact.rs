use crm_db::secure::ScopableEntity;
use crm_security::properties;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sales_contacts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub user_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl ScopableEntity for Entity {
    fn id_column() -> Self::Column {
        Column::Id
    }

    fn resolve_property(property: &str) -> Option<Self::Column> {
        (property == properties::ID).then_some(Column::Id)
    }
}

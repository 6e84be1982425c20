use async_trait::async_trait;
use crm_db::secure::{AccessScope, Window, scoped_delete_by_id, scoped_find_by_id, scoped_list};
use crm_sdk::ContactKind;
use crm_security::RowId;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};

use super::OrmCrmRepository;
use crate::domain::repos::{ContactRecord, ContactsRepository};
use crate::infra::storage::entity::{sales_contact, staff_contact, support_contact};

/// Run `$body` with `$m` bound to the entity module of `$kind`.
///
/// The three contact tables share one shape (`id`, `user_id`).
macro_rules! with_contact_table {
    ($kind:expr, $m:ident => $body:expr) => {
        match $kind {
            ContactKind::Sales => {
                use sales_contact as $m;
                $body
            }
            ContactKind::Support => {
                use support_contact as $m;
                $body
            }
            ContactKind::Staff => {
                use staff_contact as $m;
                $body
            }
        }
    };
}

#[async_trait]
impl ContactsRepository for OrmCrmRepository {
    async fn find_contact_for_user<C: ConnectionTrait>(
        &self,
        conn: &C,
        kind: ContactKind,
        user_id: RowId,
    ) -> Result<Option<RowId>, DbErr> {
        with_contact_table!(kind, t => Ok(t::Entity::find()
            .filter(t::Column::UserId.eq(user_id))
            .one(conn)
            .await?
            .map(|m| m.id)))
    }

    async fn list_contacts<C: ConnectionTrait>(
        &self,
        conn: &C,
        kind: ContactKind,
        window: Window,
    ) -> Result<Vec<ContactRecord>, DbErr> {
        with_contact_table!(kind, t => Ok(
            scoped_list::<t::Entity, _>(conn, &AccessScope::allow_all(), window)
                .await?
                .into_iter()
                .map(|m| ContactRecord { id: m.id, user_id: m.user_id })
                .collect()
        ))
    }

    async fn get_contact<C: ConnectionTrait>(
        &self,
        conn: &C,
        kind: ContactKind,
        id: RowId,
    ) -> Result<Option<ContactRecord>, DbErr> {
        with_contact_table!(kind, t => Ok(
            scoped_find_by_id::<t::Entity, _>(conn, &AccessScope::allow_all(), id)
                .await?
                .map(|m| ContactRecord { id: m.id, user_id: m.user_id })
        ))
    }

    async fn insert_contact<C: ConnectionTrait>(
        &self,
        conn: &C,
        kind: ContactKind,
        user_id: RowId,
    ) -> Result<ContactRecord, DbErr> {
        with_contact_table!(kind, t => {
            let m = t::ActiveModel {
                user_id: Set(user_id),
                ..Default::default()
            }
            .insert(conn)
            .await?;
            Ok(ContactRecord { id: m.id, user_id: m.user_id })
        })
    }

    async fn delete_contact<C: ConnectionTrait>(
        &self,
        conn: &C,
        kind: ContactKind,
        id: RowId,
    ) -> Result<bool, DbErr> {
        with_contact_table!(kind, t =>
            scoped_delete_by_id::<t::Entity, _>(conn, &AccessScope::allow_all(), id).await)
    }
}

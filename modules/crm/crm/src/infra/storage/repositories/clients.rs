use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crm_db::secure::{AccessScope, Window, scoped_delete_by_id, scoped_find_by_id, scoped_list};
use crm_sdk::{Client, NewClient};
use crm_security::RowId;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QuerySelect, Set,
};

use super::OrmCrmRepository;
use crate::domain::repos::ClientsRepository;
use crate::infra::storage::entity::client;

fn to_client(m: client::Model) -> Client {
    Client {
        id: m.id,
        first_name: m.first_name,
        last_name: m.last_name,
        email: m.email,
        phone: m.phone,
        mobile: m.mobile,
        sales_contact_id: m.sales_contact_id,
        date_created: m.date_created,
        date_updated: m.date_updated,
    }
}

#[async_trait]
impl ClientsRepository for OrmCrmRepository {
    async fn list_clients<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &AccessScope,
        window: Window,
    ) -> Result<Vec<Client>, DbErr> {
        let rows = scoped_list::<client::Entity, _>(conn, scope, window).await?;
        Ok(rows.into_iter().map(to_client).collect())
    }

    async fn get_client<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &AccessScope,
        id: RowId,
    ) -> Result<Option<Client>, DbErr> {
        Ok(scoped_find_by_id::<client::Entity, _>(conn, scope, id)
            .await?
            .map(to_client))
    }

    async fn insert_client<C: ConnectionTrait>(
        &self,
        conn: &C,
        new_client: &NewClient,
        now: DateTime<Utc>,
    ) -> Result<Client, DbErr> {
        let m = client::ActiveModel {
            first_name: Set(new_client.first_name.clone()),
            last_name: Set(new_client.last_name.clone()),
            email: Set(new_client.email.clone()),
            phone: Set(new_client.phone.clone()),
            mobile: Set(new_client.mobile.clone()),
            sales_contact_id: Set(new_client.sales_contact_id),
            date_created: Set(now),
            date_updated: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        Ok(to_client(m))
    }

    async fn update_client<C: ConnectionTrait>(
        &self,
        conn: &C,
        c: &Client,
    ) -> Result<Client, DbErr> {
        let m = client::ActiveModel {
            id: Unchanged(c.id),
            first_name: Set(c.first_name.clone()),
            last_name: Set(c.last_name.clone()),
            email: Set(c.email.clone()),
            phone: Set(c.phone.clone()),
            mobile: Set(c.mobile.clone()),
            sales_contact_id: Set(c.sales_contact_id),
            date_created: Unchanged(c.date_created),
            date_updated: Set(c.date_updated),
        }
        .update(conn)
        .await?;
        Ok(to_client(m))
    }

    async fn delete_client<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &AccessScope,
        id: RowId,
    ) -> Result<bool, DbErr> {
        scoped_delete_by_id::<client::Entity, _>(conn, scope, id).await
    }

    async fn email_in_use<C: ConnectionTrait>(
        &self,
        conn: &C,
        email: &str,
        except: Option<RowId>,
    ) -> Result<bool, DbErr> {
        let mut query = client::Entity::find().filter(client::Column::Email.eq(email));
        if let Some(id) = except {
            query = query.filter(client::Column::Id.ne(id));
        }
        Ok(query.count(conn).await? > 0)
    }

    async fn client_ids_owned_by<C: ConnectionTrait>(
        &self,
        conn: &C,
        sales_contact_id: RowId,
    ) -> Result<Vec<RowId>, DbErr> {
        client::Entity::find()
            .select_only()
            .column(client::Column::Id)
            .filter(client::Column::SalesContactId.eq(sales_contact_id))
            .into_tuple()
            .all(conn)
            .await
    }
}

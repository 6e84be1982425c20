use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crm_db::secure::{AccessScope, Window, scoped_delete_by_id, scoped_find_by_id, scoped_list};
use crm_sdk::{Contract, NewContract};
use crm_security::RowId;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter, QuerySelect, Set,
};

use super::OrmCrmRepository;
use crate::domain::repos::ContractsRepository;
use crate::infra::storage::entity::contract;

/// `SQLite` keeps amounts as REAL, so the scale is restored here.
fn to_contract(m: contract::Model) -> Contract {
    let mut amount = m.amount;
    amount.rescale(2);
    Contract {
        id: m.id,
        sales_contact_id: m.sales_contact_id,
        client_id: m.client_id,
        status: m.status,
        amount,
        payment_due: m.payment_due,
        date_created: m.date_created,
        date_updated: m.date_updated,
    }
}

#[async_trait]
impl ContractsRepository for OrmCrmRepository {
    async fn list_contracts<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &AccessScope,
        window: Window,
    ) -> Result<Vec<Contract>, DbErr> {
        let rows = scoped_list::<contract::Entity, _>(conn, scope, window).await?;
        Ok(rows.into_iter().map(to_contract).collect())
    }

    async fn get_contract<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &AccessScope,
        id: RowId,
    ) -> Result<Option<Contract>, DbErr> {
        Ok(scoped_find_by_id::<contract::Entity, _>(conn, scope, id)
            .await?
            .map(to_contract))
    }

    async fn insert_contract<C: ConnectionTrait>(
        &self,
        conn: &C,
        new_contract: &NewContract,
        now: DateTime<Utc>,
    ) -> Result<Contract, DbErr> {
        let m = contract::ActiveModel {
            sales_contact_id: Set(new_contract.sales_contact_id),
            client_id: Set(new_contract.client_id),
            status: Set(new_contract.status),
            amount: Set(new_contract.amount),
            payment_due: Set(new_contract.payment_due.unwrap_or(now)),
            date_created: Set(now),
            date_updated: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        Ok(to_contract(m))
    }

    async fn update_contract<C: ConnectionTrait>(
        &self,
        conn: &C,
        c: &Contract,
    ) -> Result<Contract, DbErr> {
        let m = contract::ActiveModel {
            id: Unchanged(c.id),
            sales_contact_id: Set(c.sales_contact_id),
            client_id: Set(c.client_id),
            status: Set(c.status),
            amount: Set(c.amount),
            payment_due: Set(c.payment_due),
            date_created: Unchanged(c.date_created),
            date_updated: Set(c.date_updated),
        }
        .update(conn)
        .await?;
        Ok(to_contract(m))
    }

    async fn delete_contract<C: ConnectionTrait>(
        &self,
        conn: &C,
        scope: &AccessScope,
        id: RowId,
    ) -> Result<bool, DbErr> {
        scoped_delete_by_id::<contract::Entity, _>(conn, scope, id).await
    }

    async fn client_ids_under_contract_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        sales_contact_id: RowId,
    ) -> Result<Vec<RowId>, DbErr> {
        contract::Entity::find()
            .select_only()
            .column(contract::Column::ClientId)
            .filter(contract::Column::SalesContactId.eq(sales_contact_id))
            .distinct()
            .into_tuple()
            .all(conn)
            .await
    }
}

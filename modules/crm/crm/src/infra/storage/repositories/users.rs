use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crm_security::RowId;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use super::OrmCrmRepository;
use crate::domain::repos::{UserRecord, UsersRepository};
use crate::infra::storage::entity::{group, group_permission, permission, session, user, user_group};

fn to_record(m: user::Model) -> UserRecord {
    UserRecord {
        id: m.id,
        username: m.username,
        password_hash: m.password_hash,
        is_superuser: m.is_superuser,
        is_active: m.is_active,
    }
}

async fn group_ids<C: ConnectionTrait>(conn: &C, user_id: RowId) -> Result<Vec<i64>, DbErr> {
    user_group::Entity::find()
        .select_only()
        .column(user_group::Column::GroupId)
        .filter(user_group::Column::UserId.eq(user_id))
        .into_tuple()
        .all(conn)
        .await
}

#[async_trait]
impl UsersRepository for OrmCrmRepository {
    async fn find_user<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: RowId,
    ) -> Result<Option<UserRecord>, DbErr> {
        Ok(user::Entity::find_by_id(id).one(conn).await?.map(to_record))
    }

    async fn find_user_by_username<C: ConnectionTrait>(
        &self,
        conn: &C,
        username: &str,
    ) -> Result<Option<UserRecord>, DbErr> {
        Ok(user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(conn)
            .await?
            .map(to_record))
    }

    async fn insert_user<C: ConnectionTrait>(
        &self,
        conn: &C,
        username: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<UserRecord, DbErr> {
        let model = user::ActiveModel {
            username: Set(username.to_owned()),
            password_hash: Set(password_hash.to_owned()),
            is_superuser: Set(false),
            is_active: Set(true),
            date_joined: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        Ok(to_record(model))
    }

    async fn set_password_hash<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: RowId,
        password_hash: &str,
    ) -> Result<(), DbErr> {
        let res = user::Entity::update_many()
            .col_expr(
                user::Column::PasswordHash,
                sea_orm::sea_query::Expr::value(password_hash.to_owned()),
            )
            .filter(user::Column::Id.eq(user_id))
            .exec(conn)
            .await?;
        if res.rows_affected == 0 {
            return Err(DbErr::RecordNotFound(format!("user {user_id}")));
        }
        Ok(())
    }

    async fn group_names<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: RowId,
    ) -> Result<Vec<String>, DbErr> {
        let ids = group_ids(conn, user_id).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        group::Entity::find()
            .select_only()
            .column(group::Column::Name)
            .filter(group::Column::Id.is_in(ids))
            .order_by_asc(group::Column::Name)
            .into_tuple()
            .all(conn)
            .await
    }

    async fn permission_codenames<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: RowId,
    ) -> Result<Vec<String>, DbErr> {
        let groups = group_ids(conn, user_id).await?;
        if groups.is_empty() {
            return Ok(Vec::new());
        }
        let permission_ids: Vec<i64> = group_permission::Entity::find()
            .select_only()
            .column(group_permission::Column::PermissionId)
            .filter(group_permission::Column::GroupId.is_in(groups))
            .distinct()
            .into_tuple()
            .all(conn)
            .await?;
        if permission_ids.is_empty() {
            return Ok(Vec::new());
        }
        permission::Entity::find()
            .select_only()
            .column(permission::Column::Codename)
            .filter(permission::Column::Id.is_in(permission_ids))
            .into_tuple()
            .all(conn)
            .await
    }

    async fn add_to_group<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: RowId,
        group_name: &str,
    ) -> Result<(), DbErr> {
        let group = group::Entity::find()
            .filter(group::Column::Name.eq(group_name))
            .one(conn)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("group {group_name}")))?;

        user_group::Entity::insert(user_group::ActiveModel {
            user_id: Set(user_id),
            group_id: Set(group.id),
        })
        .on_conflict(
            OnConflict::columns([user_group::Column::UserId, user_group::Column::GroupId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
        Ok(())
    }

    async fn insert_session<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: RowId,
        token_hash: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DbErr> {
        session::ActiveModel {
            user_id: Set(user_id),
            token_hash: Set(token_hash.to_owned()),
            created_at: Set(created_at),
            expires_at: Set(expires_at),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        Ok(())
    }

    async fn find_session_user<C: ConnectionTrait>(
        &self,
        conn: &C,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserRecord>, DbErr> {
        let Some(session) = session::Entity::find()
            .filter(session::Column::TokenHash.eq(token_hash))
            .one(conn)
            .await?
        else {
            return Ok(None);
        };
        if session.expires_at <= now {
            return Ok(None);
        }
        self.find_user(conn, session.user_id).await
    }

    async fn delete_session<C: ConnectionTrait>(
        &self,
        conn: &C,
        token_hash: &str,
    ) -> Result<bool, DbErr> {
        let res = session::Entity::delete_many()
            .filter(session::Column::TokenHash.eq(token_hash))
            .exec(conn)
            .await?;
        Ok(res.rows_affected > 0)
    }
}

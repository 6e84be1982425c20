//! Scope-aware query helpers.
//!
//! Every read, update and delete issued by a repository goes through an
//! [`AccessScope`]. Entities opt in by implementing [`ScopableEntity`].

mod cond;

use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};

pub use cond::build_scope_condition;
pub use crm_security::AccessScope;
use crm_security::RowId;

/// An entity whose rows can be narrowed by an [`AccessScope`].
pub trait ScopableEntity: EntityTrait {
    /// Primary key column; used for ordering and point lookups.
    fn id_column() -> Self::Column;

    /// Map an authorization property name to a column of this entity.
    ///
    /// Returning `None` makes any constraint using the property fail closed.
    fn resolve_property(property: &str) -> Option<Self::Column>;
}

/// Limit/offset window for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: u64,
    pub offset: u64,
}

/// `SELECT` narrowed by `scope` and ordered by primary key ascending.
pub fn scoped_select<E>(scope: &AccessScope) -> Select<E>
where
    E: ScopableEntity,
    E::Column: ColumnTrait + Copy,
{
    E::find()
        .filter(build_scope_condition::<E>(scope))
        .order_by_asc(E::id_column())
}

/// Ordered, windowed list of the rows visible through `scope`.
///
/// # Errors
/// Returns the driver error if the query fails.
pub async fn scoped_list<E, C>(
    conn: &C,
    scope: &AccessScope,
    window: Window,
) -> Result<Vec<E::Model>, DbErr>
where
    E: ScopableEntity,
    E::Column: ColumnTrait + Copy,
    C: ConnectionTrait,
{
    scoped_select::<E>(scope)
        .limit(window.limit)
        .offset(window.offset)
        .all(conn)
        .await
}

/// Fetch one row by id, if it is visible through `scope`.
///
/// # Errors
/// Returns the driver error if the query fails.
pub async fn scoped_find_by_id<E, C>(
    conn: &C,
    scope: &AccessScope,
    id: RowId,
) -> Result<Option<E::Model>, DbErr>
where
    E: ScopableEntity,
    E::Column: ColumnTrait + Copy,
    C: ConnectionTrait,
{
    scoped_select::<E>(&scope.narrow_to_row(id)).one(conn).await
}

/// Delete one row by id if it is visible through `scope`.
///
/// Returns `true` when a row was removed.
///
/// # Errors
/// Returns the driver error if the statement fails.
pub async fn scoped_delete_by_id<E, C>(
    conn: &C,
    scope: &AccessScope,
    id: RowId,
) -> Result<bool, DbErr>
where
    E: ScopableEntity,
    E::Column: ColumnTrait + Copy,
    C: ConnectionTrait,
{
    let res = E::delete_many()
        .filter(build_scope_condition::<E>(&scope.narrow_to_row(id)))
        .exec(conn)
        .await?;
    Ok(res.rows_affected > 0)
}

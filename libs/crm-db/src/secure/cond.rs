use sea_orm::{ColumnTrait, Condition, EntityTrait, sea_query::Expr};

use crate::secure::ScopableEntity;
use crm_security::{AccessScope, FilterOp, ScopeConstraint};

/// `WHERE false`
fn deny_all() -> Condition {
    Condition::all().add(Expr::value(false))
}

/// Builds a `SeaORM` `Condition` from an `AccessScope` using property resolution.
///
/// # OR/AND Semantics
///
/// - Multiple constraints are OR-ed (alternative access paths)
/// - Filters within a constraint are AND-ed (all must match)
/// - Unknown properties fail that constraint (fail-closed)
/// - If all constraints fail resolution, deny-all
///
/// | Scope | Behavior |
/// |-------|----------|
/// | deny-all (default) | `WHERE false` |
/// | unconstrained (allow-all) | no filtering |
/// | single constraint | AND of resolved filters |
/// | multiple constraints | OR of ANDed filter groups |
pub fn build_scope_condition<E>(scope: &AccessScope) -> Condition
where
    E: ScopableEntity + EntityTrait,
    E::Column: ColumnTrait + Copy,
{
    if scope.is_unconstrained() {
        return Condition::all();
    }
    if scope.is_deny_all() {
        return deny_all();
    }

    let compiled: Vec<Condition> = scope
        .constraints()
        .iter()
        .filter_map(build_constraint_condition::<E>)
        .collect();

    if compiled.is_empty() {
        return deny_all();
    }
    compiled
        .into_iter()
        .fold(Condition::any(), |or_cond, c| or_cond.add(c))
}

/// AND of the constraint's filters, or `None` when a filter cannot be
/// resolved for this entity.
fn build_constraint_condition<E>(constraint: &ScopeConstraint) -> Option<Condition>
where
    E: ScopableEntity + EntityTrait,
    E::Column: ColumnTrait + Copy,
{
    if constraint.is_empty() {
        return Some(Condition::all());
    }
    let mut and_cond = Condition::all();
    for filter in constraint.filters() {
        let col = E::resolve_property(filter.property())?;
        and_cond = match (filter.op(), filter.values()) {
            (FilterOp::Eq, [value]) => and_cond.add(col.eq(*value)),
            // Multi-valued equality and empty IN lists match nothing.
            (FilterOp::Eq, _) | (FilterOp::In, []) => return None,
            (FilterOp::In, values) => and_cond.add(col.is_in(values.iter().copied())),
        };
    }
    Some(and_cond)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crm_security::{ScopeFilter, properties};
    use sea_orm::sea_query::{Query, SqliteQueryBuilder};

    mod widget {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "widgets")]
        pub struct Model {
            #[sea_orm(primary_key)]
            pub id: i64,
            pub sales_contact_id: i64,
            pub client_id: i64,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }

    impl ScopableEntity for widget::Entity {
        fn id_column() -> widget::Column {
            widget::Column::Id
        }

        fn resolve_property(property: &str) -> Option<widget::Column> {
            match property {
                properties::ID => Some(widget::Column::Id),
                properties::SALES_CONTACT_ID => Some(widget::Column::SalesContactId),
                properties::CLIENT_ID => Some(widget::Column::ClientId),
                _ => None,
            }
        }
    }

    fn denies_everything(sql: &str) -> bool {
        sql.ends_with("WHERE FALSE") || sql.ends_with("WHERE 0")
    }

    fn render(scope: &AccessScope) -> String {
        Query::select()
            .column(widget::Column::Id)
            .from(widget::Entity)
            .cond_where(build_scope_condition::<widget::Entity>(scope))
            .to_string(SqliteQueryBuilder)
    }

    #[test]
    fn deny_all_renders_false() {
        let sql = render(&AccessScope::deny_all());
        assert!(denies_everything(&sql), "{sql}");
    }

    #[test]
    fn allow_all_has_no_where() {
        let sql = render(&AccessScope::allow_all());
        assert!(!sql.contains("WHERE"), "{sql}");
    }

    #[test]
    fn two_paths_render_or() {
        let scope = AccessScope::any_of(vec![
            vec![ScopeFilter::equals(properties::SALES_CONTACT_ID, 1)],
            vec![ScopeFilter::in_list(properties::CLIENT_ID, vec![2, 3])],
        ]);
        let sql = render(&scope);
        assert!(sql.contains(r#""sales_contact_id" = 1"#), "{sql}");
        assert!(sql.contains(r#""client_id" IN (2, 3)"#), "{sql}");
        assert!(sql.contains(" OR "), "{sql}");
    }

    #[test]
    fn unknown_property_fails_closed() {
        let scope = AccessScope::any_of(vec![vec![ScopeFilter::equals(
            properties::SUPPORT_CONTACT_ID,
            1,
        )]]);
        let sql = render(&scope);
        assert!(denies_everything(&sql), "{sql}");
    }

    #[test]
    fn unknown_property_only_drops_its_own_path() {
        let scope = AccessScope::any_of(vec![
            vec![ScopeFilter::equals(properties::SUPPORT_CONTACT_ID, 1)],
            vec![ScopeFilter::equals(properties::CLIENT_ID, 4)],
        ]);
        let sql = render(&scope);
        assert!(sql.contains(r#""client_id" = 4"#), "{sql}");
        assert!(!sql.contains("support_contact_id"), "{sql}");
    }

    #[test]
    fn eq_with_many_values_fails_closed() {
        let scope = AccessScope::single(ScopeConstraint::new(vec![ScopeFilter::new(
            properties::ID,
            FilterOp::Eq,
            vec![1, 2],
        )]));
        let sql = render(&scope);
        assert!(denies_everything(&sql), "{sql}");
    }

    #[test]
    fn empty_in_list_matches_nothing() {
        let scope = AccessScope::any_of(vec![
            vec![ScopeFilter::in_list(properties::CLIENT_ID, Vec::new())],
            vec![ScopeFilter::in_list(properties::CLIENT_ID, vec![2, 3])],
        ]);
        let sql = render(&scope);
        assert!(sql.contains(r#""client_id" IN (2, 3)"#), "{sql}");

        let empty = AccessScope::any_of(vec![vec![ScopeFilter::in_list(properties::ID, Vec::new())]]);
        assert!(denies_everything(&render(&empty)));
    }
}

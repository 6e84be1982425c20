/// Primary-key type shared by every CRM table.
pub type RowId = i64;

/// Well-known authorization property names.
///
/// Shared between the visibility policies that build scopes and
/// `ScopableEntity::resolve_property()` which maps them to columns.
pub mod properties {
    /// Row identity. Maps to the primary key.
    pub const ID: &str = "id";

    /// Owning sales contact of a client or contract.
    pub const SALES_CONTACT_ID: &str = "sales_contact_id";

    /// Assigned support contact of an event.
    pub const SUPPORT_CONTACT_ID: &str = "support_contact_id";

    /// Client a contract or event belongs to.
    pub const CLIENT_ID: &str = "client_id";
}

/// Predicate operation type for scope filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FilterOp {
    /// `property = value`; the filter must carry exactly one value.
    Eq,
    /// `property IN (values)`; an empty list matches nothing.
    In,
}

/// A single condition on a named row property.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ScopeFilter {
    property: String,
    op: FilterOp,
    values: Vec<RowId>,
}

impl ScopeFilter {
    #[must_use]
    pub fn new(property: impl Into<String>, op: FilterOp, values: Vec<RowId>) -> Self {
        Self {
            property: property.into(),
            op,
            values,
        }
    }

    /// `property = value`
    #[must_use]
    pub fn equals(property: impl Into<String>, value: RowId) -> Self {
        Self::new(property, FilterOp::Eq, vec![value])
    }

    /// `property IN (values)`
    #[must_use]
    pub fn in_list(property: impl Into<String>, values: Vec<RowId>) -> Self {
        Self::new(property, FilterOp::In, values)
    }

    #[inline]
    #[must_use]
    pub fn property(&self) -> &str {
        &self.property
    }

    #[inline]
    #[must_use]
    pub fn op(&self) -> FilterOp {
        self.op
    }

    #[inline]
    #[must_use]
    pub fn values(&self) -> &[RowId] {
        &self.values
    }

    fn matches(&self, property: &str, value: RowId) -> bool {
        self.property == property && self.values.contains(&value)
    }
}

/// A conjunction (AND) of scope filters, i.e. one access path.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ScopeConstraint {
    filters: Vec<ScopeFilter>,
}

impl ScopeConstraint {
    #[must_use]
    pub fn new(filters: Vec<ScopeFilter>) -> Self {
        Self { filters }
    }

    #[inline]
    #[must_use]
    pub fn filters(&self) -> &[ScopeFilter] {
        &self.filters
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// A disjunction (OR) of scope constraints describing the visible rows.
///
/// Each constraint is an independent access path. Filters within a
/// constraint are AND-ed. An unconstrained scope skips row filtering.
///
/// # Examples
///
/// ```
/// use crm_security::access_scope::{AccessScope, ScopeFilter, properties};
///
/// let scope = AccessScope::deny_all();
/// assert!(scope.is_deny_all());
///
/// let scope = AccessScope::any_of(vec![
///     vec![ScopeFilter::equals(properties::SALES_CONTACT_ID, 1)],
///     vec![ScopeFilter::in_list(properties::CLIENT_ID, vec![4, 5])],
/// ]);
/// assert!(scope.contains_value(properties::CLIENT_ID, 5));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AccessScope {
    constraints: Vec<ScopeConstraint>,
    unconstrained: bool,
}

impl Default for AccessScope {
    /// Default is deny-all.
    fn default() -> Self {
        Self::deny_all()
    }
}

impl AccessScope {
    // ── Constructors ────────────────────────────────────────────────

    #[must_use]
    pub fn from_constraints(constraints: Vec<ScopeConstraint>) -> Self {
        Self {
            constraints,
            unconstrained: false,
        }
    }

    #[must_use]
    pub fn single(constraint: ScopeConstraint) -> Self {
        Self::from_constraints(vec![constraint])
    }

    /// Build a scope from alternative access paths, each an AND of filters.
    #[must_use]
    pub fn any_of(paths: Vec<Vec<ScopeFilter>>) -> Self {
        Self::from_constraints(paths.into_iter().map(ScopeConstraint::new).collect())
    }

    /// Unconstrained scope: every row is visible.
    #[must_use]
    pub fn allow_all() -> Self {
        Self {
            constraints: Vec::new(),
            unconstrained: true,
        }
    }

    /// No row is visible.
    #[must_use]
    pub fn deny_all() -> Self {
        Self {
            constraints: Vec::new(),
            unconstrained: false,
        }
    }

    /// Scope matching a single row by primary key.
    #[must_use]
    pub fn for_row(id: RowId) -> Self {
        Self::single(ScopeConstraint::new(vec![ScopeFilter::equals(
            properties::ID,
            id,
        )]))
    }

    // ── Accessors ───────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub fn constraints(&self) -> &[ScopeConstraint] {
        &self.constraints
    }

    #[inline]
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.unconstrained
    }

    #[must_use]
    pub fn is_deny_all(&self) -> bool {
        !self.unconstrained && self.constraints.is_empty()
    }

    /// Check if any constraint has a filter matching the given property and value.
    #[must_use]
    pub fn contains_value(&self, property: &str, value: RowId) -> bool {
        self.constraints
            .iter()
            .any(|c| c.filters().iter().any(|f| f.matches(property, value)))
    }

    #[must_use]
    pub fn has_property(&self, property: &str) -> bool {
        self.constraints
            .iter()
            .any(|c| c.filters().iter().any(|f| f.property() == property))
    }

    /// Intersect this scope with a single-row lookup.
    ///
    /// Every access path gains an `id = row` filter, so the result matches
    /// the row only when this scope already does.
    #[must_use]
    pub fn narrow_to_row(&self, id: RowId) -> Self {
        if self.unconstrained {
            return Self::for_row(id);
        }
        let constraints = self
            .constraints
            .iter()
            .map(|c| {
                let mut filters = c.filters.clone();
                filters.push(ScopeFilter::equals(properties::ID, id));
                ScopeConstraint::new(filters)
            })
            .collect();
        Self::from_constraints(constraints)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn default_is_deny_all() {
        let scope = AccessScope::default();
        assert!(scope.is_deny_all());
        assert!(!scope.is_unconstrained());
    }

    #[test]
    fn allow_all_is_not_deny_all() {
        let scope = AccessScope::allow_all();
        assert!(scope.is_unconstrained());
        assert!(!scope.is_deny_all());
    }

    #[test]
    fn any_of_keeps_paths_separate() {
        let scope = AccessScope::any_of(vec![
            vec![ScopeFilter::equals(properties::SALES_CONTACT_ID, 7)],
            vec![ScopeFilter::in_list(properties::CLIENT_ID, vec![1, 2])],
        ]);
        assert_eq!(scope.constraints().len(), 2);
        assert!(scope.contains_value(properties::SALES_CONTACT_ID, 7));
        assert!(scope.contains_value(properties::CLIENT_ID, 2));
        assert!(!scope.contains_value(properties::CLIENT_ID, 7));
        assert!(!scope.has_property(properties::SUPPORT_CONTACT_ID));
    }

    #[test]
    fn empty_in_list_is_still_a_constraint() {
        let scope = AccessScope::single(ScopeConstraint::new(vec![ScopeFilter::in_list(
            properties::ID,
            vec![],
        )]));
        assert!(!scope.is_deny_all());
        assert!(!scope.contains_value(properties::ID, 1));
    }

    #[test]
    fn narrow_to_row_adds_id_filter_to_every_path() {
        let scope = AccessScope::any_of(vec![
            vec![ScopeFilter::equals(properties::SALES_CONTACT_ID, 3)],
            vec![ScopeFilter::in_list(properties::CLIENT_ID, vec![9])],
        ])
        .narrow_to_row(42);

        assert_eq!(scope.constraints().len(), 2);
        for c in scope.constraints() {
            assert!(
                c.filters()
                    .iter()
                    .any(|f| f.property() == properties::ID && f.values() == [42])
            );
        }
    }

    #[test]
    fn narrow_allow_all_becomes_single_row() {
        let scope = AccessScope::allow_all().narrow_to_row(5);
        assert_eq!(scope, AccessScope::for_row(5));
    }

    #[test]
    fn narrow_deny_all_stays_deny_all() {
        assert!(AccessScope::deny_all().narrow_to_row(5).is_deny_all());
    }

    #[test]
    fn scope_serializes_to_json() {
        let scope = AccessScope::for_row(1);
        let json = serde_json::to_value(&scope).unwrap();
        assert_eq!(json["unconstrained"], false);
        assert_eq!(json["constraints"][0]["filters"][0]["op"], "Eq");
    }
}

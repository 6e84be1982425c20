//! Permission codenames, group grants and the write-permission gate.

use std::collections::BTreeSet;

use crm_sdk::{ContactKind, Contract, ContractPatch};

use crate::domain::profile::Actor;

/// Timestamp rendering used when comparing payment due dates.
pub const PAYMENT_DUE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A permission-bearing resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    Client,
    Contract,
    Event,
    SalesContact,
    SupportContact,
    StaffContact,
    User,
}

impl Resource {
    pub const ALL: [Self; 7] = [
        Self::Client,
        Self::Contract,
        Self::Event,
        Self::SalesContact,
        Self::SupportContact,
        Self::StaffContact,
        Self::User,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Contract => "contract",
            Self::Event => "event",
            Self::SalesContact => ContactKind::Sales.resource_name(),
            Self::SupportContact => ContactKind::Support.resource_name(),
            Self::StaffContact => ContactKind::Staff.resource_name(),
            Self::User => "user",
        }
    }

    #[must_use]
    pub fn for_contact(kind: ContactKind) -> Self {
        match kind {
            ContactKind::Sales => Self::SalesContact,
            ContactKind::Support => Self::SupportContact,
            ContactKind::Staff => Self::StaffContact,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.name() == name)
    }
}

/// What a route does to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    PartialUpdate,
    Destroy,
}

impl Action {
    #[must_use]
    pub fn verb(self) -> Verb {
        match self {
            Self::List | Self::Retrieve => Verb::View,
            Self::Create => Verb::Add,
            Self::Update | Self::PartialUpdate => Verb::Change,
            Self::Destroy => Verb::Delete,
        }
    }

    #[must_use]
    pub fn is_update(self) -> bool {
        matches!(self, Self::Update | Self::PartialUpdate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Verb {
    Add,
    Change,
    Delete,
    View,
}

impl Verb {
    pub const ALL: [Self; 4] = [Self::Add, Self::Change, Self::Delete, Self::View];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Change => "change",
            Self::Delete => "delete",
            Self::View => "view",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Permission {
    /// `<verb>_<resource>`, e.g. `view_client`.
    Model(Verb, Resource),
    /// Flip a contract's `status` without `change_contract`.
    ChangeContractStatus,
}

impl Permission {
    const CHANGE_CONTRACT_STATUS: &'static str = "change_contract_status";

    /// Permission required for `action` on `resource`.
    #[must_use]
    pub fn required_for(resource: Resource, action: Action) -> Self {
        Self::Model(action.verb(), resource)
    }

    #[must_use]
    pub fn codename(self) -> String {
        match self {
            Self::Model(verb, resource) => format!("{}_{}", verb.name(), resource.name()),
            Self::ChangeContractStatus => Self::CHANGE_CONTRACT_STATUS.to_owned(),
        }
    }

    /// Human readable name stored next to the codename.
    #[must_use]
    pub fn display_name(self) -> String {
        match self {
            Self::Model(verb, resource) => format!("Can {} {}", verb.name(), resource.name()),
            Self::ChangeContractStatus => "Can change contract status".to_owned(),
        }
    }

    #[must_use]
    pub fn parse(codename: &str) -> Option<Self> {
        if codename == Self::CHANGE_CONTRACT_STATUS {
            return Some(Self::ChangeContractStatus);
        }
        let (verb, resource) = codename.split_once('_')?;
        let verb = Verb::ALL.into_iter().find(|v| v.name() == verb)?;
        Resource::from_name(resource).map(|r| Self::Model(verb, r))
    }

    /// Every known permission.
    #[must_use]
    pub fn all() -> Vec<Self> {
        Resource::ALL
            .into_iter()
            .flat_map(|r| Verb::ALL.into_iter().map(move |v| Self::Model(v, r)))
            .chain(std::iter::once(Self::ChangeContractStatus))
            .collect()
    }
}

/// Effective permissions of a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    #[must_use]
    pub fn all() -> Self {
        Permission::all().into_iter().collect()
    }

    /// Build from stored codenames. Unknown codenames are ignored.
    pub fn from_codenames<I, S>(codenames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        codenames
            .into_iter()
            .filter_map(|c| Permission::parse(c.as_ref()))
            .collect()
    }

    #[must_use]
    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Permissions granted to the group a contact of `kind` joins.
#[must_use]
pub fn group_grants(kind: ContactKind) -> Vec<Permission> {
    use Permission::Model;
    match kind {
        ContactKind::Staff => Permission::all(),
        ContactKind::Sales => vec![
            Model(Verb::Add, Resource::Client),
            Model(Verb::Change, Resource::Client),
            Model(Verb::View, Resource::Client),
            Model(Verb::Add, Resource::Contract),
            Model(Verb::View, Resource::Contract),
            Permission::ChangeContractStatus,
            Model(Verb::Add, Resource::Event),
            Model(Verb::View, Resource::Event),
        ],
        ContactKind::Support => vec![
            Model(Verb::View, Resource::Client),
            Model(Verb::Change, Resource::Event),
            Model(Verb::View, Resource::Event),
        ],
    }
}

/// Outcome of the route-level check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Deny,
    /// Only the stored row can tell; the service decides.
    Deferred,
}

/// Route-level permission check for `action` on `resource`.
#[must_use]
pub fn check(actor: &Actor, resource: Resource, action: Action) -> GateDecision {
    if actor.has_permission(Permission::required_for(resource, action)) {
        GateDecision::Allow
    } else if resource == Resource::Contract
        && action.is_update()
        && actor.has_permission(Permission::ChangeContractStatus)
    {
        GateDecision::Deferred
    } else {
        GateDecision::Deny
    }
}

/// Whether `patch` leaves the amount and payment due date of `stored` as they are.
///
/// A field missing from the patch never matches.
#[must_use]
pub fn is_status_only_change(patch: &ContractPatch, stored: &Contract) -> bool {
    let amount_kept = patch.amount.is_some_and(|amount| amount == stored.amount);
    let due_kept = patch.payment_due.is_some_and(|due| {
        due.format(PAYMENT_DUE_FORMAT).to_string()
            == stored.payment_due.format(PAYMENT_DUE_FORMAT).to_string()
    });
    amount_kept && due_kept
}

/// Object-level decision for a contract update.
///
/// Only amount and payment due date are compared. A status-only update may
/// still move the contract to another sales contact or client.
#[must_use]
pub fn may_update_contract(actor: &Actor, patch: &ContractPatch, stored: &Contract) -> bool {
    actor.has_permission(Permission::Model(Verb::Change, Resource::Contract))
        || (is_status_only_change(patch, stored)
            && actor.has_permission(Permission::ChangeContractStatus))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::domain::profile::Role;
    use chrono::{TimeZone, Utc};
    use crm_security::SecurityContext;
    use rust_decimal::Decimal;

    fn actor_with(kind: ContactKind) -> Actor {
        let ctx = SecurityContext::builder().subject_id(5).username("u").build();
        let role = match kind {
            ContactKind::Sales => Role::Sales(1),
            ContactKind::Support => Role::Support(1),
            ContactKind::Staff => Role::Staff,
        };
        Actor::new(ctx, role, group_grants(kind).into_iter().collect())
    }

    fn stored_contract() -> Contract {
        let at = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        Contract {
            id: 1,
            sales_contact_id: 1,
            client_id: 1,
            status: false,
            amount: Decimal::new(200_000, 2),
            payment_due: at,
            date_created: at,
            date_updated: at,
        }
    }

    #[test]
    fn codenames_parse_back() {
        for permission in Permission::all() {
            assert_eq!(Permission::parse(&permission.codename()), Some(permission));
        }
        assert_eq!(Permission::parse("view_unicorn"), None);
        assert_eq!(Permission::parse("fly"), None);
    }

    #[test]
    fn contact_codenames_match_model_names() {
        assert_eq!(
            Permission::required_for(Resource::SalesContact, Action::Destroy).codename(),
            "delete_salescontact"
        );
        assert_eq!(Permission::ChangeContractStatus.codename(), "change_contract_status");
    }

    #[test]
    fn action_table() {
        let expected = [
            (Action::List, "view_event"),
            (Action::Retrieve, "view_event"),
            (Action::Create, "add_event"),
            (Action::Update, "change_event"),
            (Action::PartialUpdate, "change_event"),
            (Action::Destroy, "delete_event"),
        ];
        for (action, codename) in expected {
            assert_eq!(Permission::required_for(Resource::Event, action).codename(), codename);
        }
    }

    #[test]
    fn support_may_change_events_but_not_clients() {
        let support = actor_with(ContactKind::Support);
        assert_eq!(check(&support, Resource::Event, Action::PartialUpdate), GateDecision::Allow);
        assert_eq!(check(&support, Resource::Client, Action::Retrieve), GateDecision::Allow);
        assert_eq!(check(&support, Resource::Client, Action::Update), GateDecision::Deny);
        assert_eq!(check(&support, Resource::Contract, Action::List), GateDecision::Deny);
    }

    #[test]
    fn sales_contract_update_is_deferred_and_delete_denied() {
        let sales = actor_with(ContactKind::Sales);
        assert_eq!(check(&sales, Resource::Contract, Action::Create), GateDecision::Allow);
        assert_eq!(check(&sales, Resource::Contract, Action::Update), GateDecision::Deferred);
        assert_eq!(check(&sales, Resource::Contract, Action::Destroy), GateDecision::Deny);
        assert_eq!(check(&sales, Resource::Client, Action::Destroy), GateDecision::Deny);
    }

    #[test]
    fn staff_holds_everything() {
        let staff = actor_with(ContactKind::Staff);
        for resource in Resource::ALL {
            assert_eq!(check(&staff, resource, Action::Destroy), GateDecision::Allow);
        }
    }

    #[test]
    fn status_only_update_is_allowed_for_sales() {
        let sales = actor_with(ContactKind::Sales);
        let stored = stored_contract();
        let patch = ContractPatch {
            status: Some(true),
            amount: Some(Decimal::new(2000, 0)),
            payment_due: Some(stored.payment_due),
            ..ContractPatch::default()
        };
        assert!(may_update_contract(&sales, &patch, &stored));
    }

    #[test]
    fn changed_amount_is_refused_for_sales() {
        let sales = actor_with(ContactKind::Sales);
        let stored = stored_contract();
        let patch = ContractPatch {
            amount: Some(Decimal::new(2001, 0)),
            payment_due: Some(stored.payment_due),
            ..ContractPatch::default()
        };
        assert!(!may_update_contract(&sales, &patch, &stored));
    }

    #[test]
    fn missing_fields_never_match() {
        let stored = stored_contract();
        let only_status = ContractPatch {
            status: Some(true),
            ..ContractPatch::default()
        };
        assert!(!is_status_only_change(&only_status, &stored));
    }

    #[test]
    fn payment_due_compares_at_second_precision() {
        let stored = stored_contract();
        let patch = ContractPatch {
            amount: Some(stored.amount),
            payment_due: Some(stored.payment_due + chrono::Duration::milliseconds(400)),
            ..ContractPatch::default()
        };
        assert!(is_status_only_change(&patch, &stored));
    }

    #[test]
    fn unknown_codenames_are_dropped() {
        let set = PermissionSet::from_codenames(["view_client", "do_magic"]);
        assert!(set.contains(Permission::Model(Verb::View, Resource::Client)));
        assert!(!set.is_empty());
        assert_eq!(set, [Permission::Model(Verb::View, Resource::Client)].into_iter().collect());
    }
}

use std::sync::Arc;

use chrono::Utc;
use crm_db::Db;
use crm_db::secure::AccessScope;
use crm_sdk::{ContactKind, Contract, ContractPatch, ListParams, NewContract};
use crm_security::RowId;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use super::{Deps, ServiceConfig, authorize};
use crate::domain::error::DomainError;
use crate::domain::permissions::{Action, GateDecision, Resource, may_update_contract};
use crate::domain::profile::Actor;
use crate::domain::repos::CrmRepository;
use crate::domain::visibility::VisibilityPolicy;

pub struct ContractsService<R: CrmRepository> {
    db: Db,
    repo: Arc<R>,
    policy: Arc<VisibilityPolicy<R>>,
    config: Arc<ServiceConfig>,
}

/// `decimal(9, 2)`, not negative.
fn validate_amount(amount: Decimal) -> Result<(), DomainError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(DomainError::validation("amount", "must not be negative"));
    }
    if amount.normalize().scale() > 2 {
        return Err(DomainError::validation(
            "amount",
            "ensure there are no more than 2 decimal places",
        ));
    }
    if amount.trunc() >= Decimal::from(10_000_000) {
        return Err(DomainError::validation(
            "amount",
            "ensure there are no more than 9 digits in total",
        ));
    }
    Ok(())
}

impl<R: CrmRepository> ContractsService<R> {
    #[must_use]
    pub fn new(deps: Deps<R>) -> Self {
        Self {
            db: deps.db,
            repo: deps.repo,
            policy: deps.policy,
            config: deps.config,
        }
    }

    async fn ensure_refs(
        &self,
        sales_contact_id: Option<RowId>,
        client_id: Option<RowId>,
    ) -> Result<(), DomainError> {
        let conn = self.db.conn();
        if let Some(id) = sales_contact_id {
            self.repo
                .get_contact(conn, ContactKind::Sales, id)
                .await?
                .ok_or_else(|| DomainError::not_found("SalesContact", id))?;
        }
        if let Some(id) = client_id {
            self.repo
                .get_client(conn, &AccessScope::allow_all(), id)
                .await?
                .ok_or_else(|| DomainError::not_found("Client", id))?;
        }
        Ok(())
    }

    /// # Errors
    /// `Forbidden` for anyone but staff and sales.
    #[instrument(skip(self, actor), fields(user_id = actor.user_id()))]
    pub async fn list(
        &self,
        actor: &Actor,
        params: ListParams,
    ) -> Result<Vec<Contract>, DomainError> {
        debug!("Listing contracts");
        authorize(actor, Resource::Contract, Action::List)?;
        let conn = self.db.conn();
        let scope = self.policy.contract_scope(conn, actor).await?;
        let contracts = self
            .repo
            .list_contracts(conn, &scope, self.config.window(params))
            .await?;
        debug!(count = contracts.len(), "Successfully listed contracts");
        Ok(contracts)
    }

    /// # Errors
    /// `NotFound` when the contract is missing or outside the caller's scope.
    #[instrument(skip(self, actor), fields(user_id = actor.user_id(), contract_id = id))]
    pub async fn get(&self, actor: &Actor, id: RowId) -> Result<Contract, DomainError> {
        debug!("Getting contract by id");
        authorize(actor, Resource::Contract, Action::Retrieve)?;
        let conn = self.db.conn();
        let scope = self.policy.contract_scope(conn, actor).await?;
        let contract = self
            .repo
            .get_contract(conn, &scope, id)
            .await?
            .ok_or_else(|| DomainError::not_found("Contract", id))?;
        debug!("Successfully retrieved contract");
        Ok(contract)
    }

    /// # Errors
    /// `Validation` for a bad amount and `NotFound` for unknown references.
    #[instrument(skip(self, actor, new_contract), fields(user_id = actor.user_id()))]
    pub async fn create(
        &self,
        actor: &Actor,
        new_contract: &NewContract,
    ) -> Result<Contract, DomainError> {
        authorize(actor, Resource::Contract, Action::Create)?;
        validate_amount(new_contract.amount)?;
        self.ensure_refs(
            Some(new_contract.sales_contact_id),
            Some(new_contract.client_id),
        )
        .await?;

        let contract = self
            .repo
            .insert_contract(self.db.conn(), new_contract, Utc::now())
            .await?;
        info!(contract_id = contract.id, "Created contract");
        Ok(contract)
    }

    /// Apply `patch` to a visible contract.
    ///
    /// Callers holding only `change_contract_status` get through when the
    /// patch keeps the stored amount and payment due date.
    ///
    /// # Errors
    /// `Forbidden` when neither rule allows the change, otherwise as for
    /// [`Self::create`].
    #[instrument(skip(self, actor, patch), fields(user_id = actor.user_id(), contract_id = id))]
    pub async fn update(
        &self,
        actor: &Actor,
        id: RowId,
        patch: ContractPatch,
    ) -> Result<Contract, DomainError> {
        let decision = authorize(actor, Resource::Contract, Action::Update)?;
        let conn = self.db.conn();
        let scope = self.policy.contract_scope(conn, actor).await?;
        let mut contract = self
            .repo
            .get_contract(conn, &scope, id)
            .await?
            .ok_or_else(|| DomainError::not_found("Contract", id))?;

        if decision == GateDecision::Deferred && !may_update_contract(actor, &patch, &contract) {
            warn!("Contract update beyond status refused");
            return Err(DomainError::Forbidden);
        }

        self.ensure_refs(patch.sales_contact_id, patch.client_id)
            .await?;
        if let Some(amount) = patch.amount {
            validate_amount(amount)?;
            contract.amount = amount;
        }
        if let Some(v) = patch.sales_contact_id {
            contract.sales_contact_id = v;
        }
        if let Some(v) = patch.client_id {
            contract.client_id = v;
        }
        if let Some(v) = patch.status {
            contract.status = v;
        }
        if let Some(v) = patch.payment_due {
            contract.payment_due = v;
        }

        contract.date_updated = Utc::now();
        let contract = self.repo.update_contract(conn, &contract).await?;
        info!(status = contract.status, "Updated contract");
        Ok(contract)
    }

    /// # Errors
    /// `NotFound` for a contract outside the scope.
    #[instrument(skip(self, actor), fields(user_id = actor.user_id(), contract_id = id))]
    pub async fn delete(&self, actor: &Actor, id: RowId) -> Result<(), DomainError> {
        authorize(actor, Resource::Contract, Action::Destroy)?;
        let conn = self.db.conn();
        let scope = self.policy.contract_scope(conn, actor).await?;
        if !self.repo.delete_contract(conn, &scope, id).await? {
            return Err(DomainError::not_found("Contract", id));
        }
        info!("Deleted contract");
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn amounts_within_decimal_9_2_pass() {
        for ok in ["0", "2000.00", "9999999.99", "12.5"] {
            assert!(validate_amount(dec(ok)).is_ok(), "{ok}");
        }
    }

    #[test]
    fn bad_amounts_are_rejected() {
        for bad in ["-1", "10000000", "1.001"] {
            assert!(
                matches!(validate_amount(dec(bad)), Err(DomainError::Validation { .. })),
                "{bad}"
            );
        }
    }
}

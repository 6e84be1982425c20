use async_trait::async_trait;
use crm_security::{RowId, SecurityContext};

use crate::errors::CrmError;
use crate::models::{Client, Contract, ContractPatch, Event, ListParams, NewClient};

/// In-process API of the CRM module.
///
/// Every call is evaluated for the caller in `ctx`: the caller's role is
/// resolved and the same visibility and permission rules as the REST
/// surface apply.
///
/// ```ignore
/// let crm: Arc<dyn CrmClientV1> = module.client();
/// let clients = crm.list_clients(&ctx, ListParams::default()).await?;
/// ```
#[async_trait]
pub trait CrmClientV1: Send + Sync {
    async fn list_clients(
        &self,
        ctx: &SecurityContext,
        params: ListParams,
    ) -> Result<Vec<Client>, CrmError>;

    async fn get_client(&self, ctx: &SecurityContext, id: RowId) -> Result<Client, CrmError>;

    async fn create_client(
        &self,
        ctx: &SecurityContext,
        new_client: NewClient,
    ) -> Result<Client, CrmError>;

    async fn list_contracts(
        &self,
        ctx: &SecurityContext,
        params: ListParams,
    ) -> Result<Vec<Contract>, CrmError>;

    async fn get_contract(&self, ctx: &SecurityContext, id: RowId) -> Result<Contract, CrmError>;

    /// Partially update a contract.
    ///
    /// Callers without `change_contract` may still flip `status` when the
    /// amount and payment due date they send match the stored ones.
    async fn update_contract(
        &self,
        ctx: &SecurityContext,
        id: RowId,
        patch: ContractPatch,
    ) -> Result<Contract, CrmError>;

    async fn list_events(
        &self,
        ctx: &SecurityContext,
        params: ListParams,
    ) -> Result<Vec<Event>, CrmError>;

    async fn get_event(&self, ctx: &SecurityContext, id: RowId) -> Result<Event, CrmError>;
}

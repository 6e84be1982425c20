//! In-process implementation of [`CrmClientV1`].

use std::sync::Arc;

use async_trait::async_trait;
use crm_sdk::{
    Client, Contract, ContractPatch, CrmClientV1, CrmError, Event, ListParams, NewClient,
};
use crm_security::{RowId, SecurityContext};

use super::error::DomainError;
use super::profile::Actor;
use super::repos::CrmRepository;
use super::service::AppServices;

/// Resolves the caller per call, then delegates to the services.
pub struct CrmLocalClient<R: CrmRepository> {
    svc: Arc<AppServices<R>>,
}

impl<R: CrmRepository> CrmLocalClient<R> {
    #[must_use]
    pub fn new(svc: Arc<AppServices<R>>) -> Self {
        Self { svc }
    }

    async fn actor(&self, ctx: &SecurityContext) -> Result<Actor, DomainError> {
        self.svc.profiles.resolve(ctx.clone()).await
    }
}

fn log_and_convert(op: &str, e: DomainError) -> CrmError {
    if matches!(e, DomainError::Database(_)) {
        tracing::error!(operation = op, error = ?e, "crm call failed");
    } else {
        tracing::debug!(operation = op, error = %e, "crm call rejected");
    }
    e.into()
}

#[async_trait]
impl<R: CrmRepository> CrmClientV1 for CrmLocalClient<R> {
    async fn list_clients(
        &self,
        ctx: &SecurityContext,
        params: ListParams,
    ) -> Result<Vec<Client>, CrmError> {
        let actor = self.actor(ctx).await.map_err(|e| log_and_convert("list_clients", e))?;
        self.svc
            .clients
            .list(&actor, params)
            .await
            .map_err(|e| log_and_convert("list_clients", e))
    }

    async fn get_client(&self, ctx: &SecurityContext, id: RowId) -> Result<Client, CrmError> {
        let actor = self.actor(ctx).await.map_err(|e| log_and_convert("get_client", e))?;
        self.svc
            .clients
            .get(&actor, id)
            .await
            .map_err(|e| log_and_convert("get_client", e))
    }

    async fn create_client(
        &self,
        ctx: &SecurityContext,
        new_client: NewClient,
    ) -> Result<Client, CrmError> {
        let actor = self.actor(ctx).await.map_err(|e| log_and_convert("create_client", e))?;
        self.svc
            .clients
            .create(&actor, &new_client)
            .await
            .map_err(|e| log_and_convert("create_client", e))
    }

    async fn list_contracts(
        &self,
        ctx: &SecurityContext,
        params: ListParams,
    ) -> Result<Vec<Contract>, CrmError> {
        let actor = self.actor(ctx).await.map_err(|e| log_and_convert("list_contracts", e))?;
        self.svc
            .contracts
            .list(&actor, params)
            .await
            .map_err(|e| log_and_convert("list_contracts", e))
    }

    async fn get_contract(&self, ctx: &SecurityContext, id: RowId) -> Result<Contract, CrmError> {
        let actor = self.actor(ctx).await.map_err(|e| log_and_convert("get_contract", e))?;
        self.svc
            .contracts
            .get(&actor, id)
            .await
            .map_err(|e| log_and_convert("get_contract", e))
    }

    async fn update_contract(
        &self,
        ctx: &SecurityContext,
        id: RowId,
        patch: ContractPatch,
    ) -> Result<Contract, CrmError> {
        let actor = self.actor(ctx).await.map_err(|e| log_and_convert("update_contract", e))?;
        self.svc
            .contracts
            .update(&actor, id, patch)
            .await
            .map_err(|e| log_and_convert("update_contract", e))
    }

    async fn list_events(
        &self,
        ctx: &SecurityContext,
        params: ListParams,
    ) -> Result<Vec<Event>, CrmError> {
        let actor = self.actor(ctx).await.map_err(|e| log_and_convert("list_events", e))?;
        self.svc
            .events
            .list(&actor, params)
            .await
            .map_err(|e| log_and_convert("list_events", e))
    }

    async fn get_event(&self, ctx: &SecurityContext, id: RowId) -> Result<Event, CrmError> {
        let actor = self.actor(ctx).await.map_err(|e| log_and_convert("get_event", e))?;
        self.svc
            .events
            .get(&actor, id)
            .await
            .map_err(|e| log_and_convert("get_event", e))
    }
}

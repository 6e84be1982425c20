use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::{Extension, Json};
use crm_sdk::{Contract, ListParams};
use crm_security::RowId;

use super::Svc;
use crate::api::rest::dto::{ContractReq, body, row_id};
use crate::domain::error::DomainError;
use crate::domain::profile::Actor;
use crate::domain::repos::CrmRepository;

pub async fn list<R: CrmRepository>(
    svc: Svc<R>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Contract>>, DomainError> {
    Ok(Json(svc.contracts.list(&actor, params).await?))
}

pub async fn get<R: CrmRepository>(
    svc: Svc<R>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<RowId>, PathRejection>,
) -> Result<Json<Contract>, DomainError> {
    let id = row_id(path)?;
    Ok(Json(svc.contracts.get(&actor, id).await?))
}

pub async fn create<R: CrmRepository>(
    svc: Svc<R>,
    Extension(actor): Extension<Actor>,
    payload: Result<Json<ContractReq>, JsonRejection>,
) -> Result<(StatusCode, Json<Contract>), DomainError> {
    let new_contract = body(payload)?.into_new()?;
    let contract = svc.contracts.create(&actor, &new_contract).await?;
    Ok((StatusCode::CREATED, Json(contract)))
}

pub async fn put<R: CrmRepository>(
    svc: Svc<R>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<RowId>, PathRejection>,
    payload: Result<Json<ContractReq>, JsonRejection>,
) -> Result<Json<Contract>, DomainError> {
    let id = row_id(path)?;
    let patch = body(payload)?.into_full_patch()?;
    Ok(Json(svc.contracts.update(&actor, id, patch).await?))
}

pub async fn patch<R: CrmRepository>(
    svc: Svc<R>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<RowId>, PathRejection>,
    payload: Result<Json<ContractReq>, JsonRejection>,
) -> Result<Json<Contract>, DomainError> {
    let id = row_id(path)?;
    let patch = body(payload)?.into_patch();
    Ok(Json(svc.contracts.update(&actor, id, patch).await?))
}

pub async fn delete<R: CrmRepository>(
    svc: Svc<R>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<RowId>, PathRejection>,
) -> Result<StatusCode, DomainError> {
    let id = row_id(path)?;
    svc.contracts.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::{Extension, Json};
use crm_sdk::{Client, ListParams};
use crm_security::RowId;

use super::Svc;
use crate::api::rest::dto::{ClientReq, body, row_id};
use crate::domain::error::DomainError;
use crate::domain::profile::Actor;
use crate::domain::repos::CrmRepository;

pub async fn list<R: CrmRepository>(
    svc: Svc<R>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Client>>, DomainError> {
    Ok(Json(svc.clients.list(&actor, params).await?))
}

pub async fn get<R: CrmRepository>(
    svc: Svc<R>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<RowId>, PathRejection>,
) -> Result<Json<Client>, DomainError> {
    let id = row_id(path)?;
    Ok(Json(svc.clients.get(&actor, id).await?))
}

pub async fn create<R: CrmRepository>(
    svc: Svc<R>,
    Extension(actor): Extension<Actor>,
    payload: Result<Json<ClientReq>, JsonRejection>,
) -> Result<(StatusCode, Json<Client>), DomainError> {
    let new_client = body(payload)?.into_new()?;
    let client = svc.clients.create(&actor, &new_client).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn put<R: CrmRepository>(
    svc: Svc<R>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<RowId>, PathRejection>,
    payload: Result<Json<ClientReq>, JsonRejection>,
) -> Result<Json<Client>, DomainError> {
    let id = row_id(path)?;
    let patch = body(payload)?.into_full_patch()?;
    Ok(Json(svc.clients.update(&actor, id, patch).await?))
}

pub async fn patch<R: CrmRepository>(
    svc: Svc<R>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<RowId>, PathRejection>,
    payload: Result<Json<ClientReq>, JsonRejection>,
) -> Result<Json<Client>, DomainError> {
    let id = row_id(path)?;
    let patch = body(payload)?.into_patch();
    Ok(Json(svc.clients.update(&actor, id, patch).await?))
}

pub async fn delete<R: CrmRepository>(
    svc: Svc<R>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<RowId>, PathRejection>,
) -> Result<StatusCode, DomainError> {
    let id = row_id(path)?;
    svc.clients.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

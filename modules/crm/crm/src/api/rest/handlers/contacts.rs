//! Handlers shared by the sales, support and staff contact routes. The
//! route layer injects which [`ContactKind`] a path serves.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::{Extension, Json};
use crm_sdk::{ContactKind, ListParams};
use crm_security::RowId;

use super::Svc;
use crate::api::rest::dto::{ContactReq, ContactResp, body, row_id};
use crate::domain::error::DomainError;
use crate::domain::profile::Actor;
use crate::domain::repos::CrmRepository;

pub async fn list<R: CrmRepository>(
    svc: Svc<R>,
    Extension(actor): Extension<Actor>,
    Extension(kind): Extension<ContactKind>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ContactResp>>, DomainError> {
    let contacts = svc.contacts.list(&actor, kind, params).await?;
    Ok(Json(contacts.into_iter().map(ContactResp::from).collect()))
}

pub async fn get<R: CrmRepository>(
    svc: Svc<R>,
    Extension(actor): Extension<Actor>,
    Extension(kind): Extension<ContactKind>,
    path: Result<Path<RowId>, PathRejection>,
) -> Result<Json<ContactResp>, DomainError> {
    let id = row_id(path)?;
    Ok(Json(svc.contacts.get(&actor, kind, id).await?.into()))
}

pub async fn create<R: CrmRepository>(
    svc: Svc<R>,
    Extension(actor): Extension<Actor>,
    Extension(kind): Extension<ContactKind>,
    payload: Result<Json<ContactReq>, JsonRejection>,
) -> Result<(StatusCode, Json<ContactResp>), DomainError> {
    let new_contact = body(payload)?.into_new()?;
    let contact = svc.contacts.create(&actor, kind, &new_contact).await?;
    Ok((StatusCode::CREATED, Json(contact.into())))
}

/// PUT and PATCH alike: only the password can change.
pub async fn update<R: CrmRepository>(
    svc: Svc<R>,
    Extension(actor): Extension<Actor>,
    Extension(kind): Extension<ContactKind>,
    path: Result<Path<RowId>, PathRejection>,
    payload: Result<Json<ContactReq>, JsonRejection>,
) -> Result<Json<ContactResp>, DomainError> {
    let id = row_id(path)?;
    let patch = body(payload)?.into_patch()?;
    Ok(Json(svc.contacts.update(&actor, kind, id, &patch).await?.into()))
}

pub async fn delete<R: CrmRepository>(
    svc: Svc<R>,
    Extension(actor): Extension<Actor>,
    Extension(kind): Extension<ContactKind>,
    path: Result<Path<RowId>, PathRejection>,
) -> Result<StatusCode, DomainError> {
    let id = row_id(path)?;
    svc.contacts.delete(&actor, kind, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

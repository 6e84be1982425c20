use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::{Extension, Json};
use crm_sdk::{Event, EventStatus, ListParams};
use crm_security::RowId;

use super::Svc;
use crate::api::rest::dto::{EventReq, body, row_id};
use crate::domain::error::DomainError;
use crate::domain::profile::Actor;
use crate::domain::repos::CrmRepository;

pub async fn list<R: CrmRepository>(
    svc: Svc<R>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Event>>, DomainError> {
    Ok(Json(svc.events.list(&actor, params).await?))
}

pub async fn get<R: CrmRepository>(
    svc: Svc<R>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<RowId>, PathRejection>,
) -> Result<Json<Event>, DomainError> {
    let id = row_id(path)?;
    Ok(Json(svc.events.get(&actor, id).await?))
}

pub async fn create<R: CrmRepository>(
    svc: Svc<R>,
    Extension(actor): Extension<Actor>,
    payload: Result<Json<EventReq>, JsonRejection>,
) -> Result<(StatusCode, Json<Event>), DomainError> {
    let new_event = body(payload)?.into_new()?;
    let event = svc.events.create(&actor, new_event).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn put<R: CrmRepository>(
    svc: Svc<R>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<RowId>, PathRejection>,
    payload: Result<Json<EventReq>, JsonRejection>,
) -> Result<Json<Event>, DomainError> {
    let id = row_id(path)?;
    let patch = body(payload)?.into_full_patch()?;
    Ok(Json(svc.events.update(&actor, id, patch).await?))
}

pub async fn patch<R: CrmRepository>(
    svc: Svc<R>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<RowId>, PathRejection>,
    payload: Result<Json<EventReq>, JsonRejection>,
) -> Result<Json<Event>, DomainError> {
    let id = row_id(path)?;
    let patch = body(payload)?.into_patch();
    Ok(Json(svc.events.update(&actor, id, patch).await?))
}

pub async fn delete<R: CrmRepository>(
    svc: Svc<R>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<RowId>, PathRejection>,
) -> Result<StatusCode, DomainError> {
    let id = row_id(path)?;
    svc.events.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /eventstatuses/`
pub async fn statuses<R: CrmRepository>(
    svc: Svc<R>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<EventStatus>>, DomainError> {
    Ok(Json(svc.events.statuses(&actor).await?))
}

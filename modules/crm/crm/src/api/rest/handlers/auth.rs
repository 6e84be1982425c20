use axum::extract::rejection::JsonRejection;
use axum::{Extension, Json};

use super::Svc;
use crate::api::rest::dto::{LoginReq, LoginResp, MessageResp, body};
use crate::domain::error::DomainError;
use crate::domain::profile::Actor;
use crate::domain::repos::CrmRepository;

/// `POST /login/`
pub async fn login<R: CrmRepository>(
    svc: Svc<R>,
    payload: Result<Json<LoginReq>, JsonRejection>,
) -> Result<Json<LoginResp>, DomainError> {
    let req = body(payload)?;
    let session = svc
        .auth
        .login(req.username.as_deref(), req.password.as_deref())
        .await?;
    Ok(Json(session.into()))
}

/// `GET /logout/`: closes the session the request was authenticated with.
pub async fn logout<R: CrmRepository>(
    svc: Svc<R>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<MessageResp>, DomainError> {
    if let Some(token) = actor.ctx().bearer_token() {
        svc.auth.logout(token).await?;
    }
    Ok(Json(MessageResp {
        message: "You are now logged out",
    }))
}

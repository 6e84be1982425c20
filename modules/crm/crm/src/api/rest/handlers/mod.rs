//! Axum handlers. Authentication and the route gate already ran in the
//! middleware; each handler receives the resolved [`Actor`] and delegates
//! to the matching service.
//!
//! [`Actor`]: crate::domain::profile::Actor

pub mod auth;
pub mod clients;
pub mod contacts;
pub mod contracts;
pub mod events;

use std::sync::Arc;

use axum::extract::State;

use crate::domain::service::AppServices;

/// Services shared by all handlers.
pub type Svc<R> = State<Arc<AppServices<R>>>;

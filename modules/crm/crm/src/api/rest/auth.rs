//! Bearer-token authentication and the route-level permission gate.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::error::Problem;
use crate::domain::error::DomainError;
use crate::domain::permissions::{self, Action, GateDecision, Resource};
use crate::domain::profile::Actor;
use crate::domain::repos::CrmRepository;
use crate::domain::service::AppServices;

/// Route-level requirement: a resource + action pair checked before the handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRequirement {
    pub resource: Resource,
    pub action: Action,
}

/// Whether a route requires authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRequirement {
    /// Public route.
    None,
    /// Authentication required; a gate requirement may apply on top.
    Required(Option<RouteRequirement>),
}

/// Turns a bearer token into an [`Actor`].
#[async_trait]
pub trait ActorResolver: Send + Sync {
    async fn resolve_actor(&self, token: &str) -> Result<Actor, DomainError>;
}

#[async_trait]
impl<R: CrmRepository> ActorResolver for AppServices<R> {
    async fn resolve_actor(&self, token: &str) -> Result<Actor, DomainError> {
        self.auth.resolve_actor(token).await
    }
}

/// Per-method matchers for gated and public routes. Anything unlisted
/// requires authentication.
#[derive(Clone, Default)]
pub struct RoutePolicy {
    gated: Arc<HashMap<Method, matchit::Router<RouteRequirement>>>,
    public: Arc<HashMap<Method, matchit::Router<()>>>,
}

impl RoutePolicy {
    /// Resolve the authentication requirement for `(method, path)`.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> AuthRequirement {
        let requirement = self
            .gated
            .get(method)
            .and_then(|m| m.at(path).ok())
            .map(|m| *m.value);
        if requirement.is_some() {
            return AuthRequirement::Required(requirement);
        }
        let is_public = self
            .public
            .get(method)
            .is_some_and(|m| m.at(path).is_ok());
        if is_public {
            AuthRequirement::None
        } else {
            AuthRequirement::Required(None)
        }
    }
}

/// Collects route requirements into a [`RoutePolicy`].
#[derive(Default)]
pub struct RoutePolicyBuilder {
    gated: HashMap<Method, matchit::Router<RouteRequirement>>,
    public: HashMap<Method, matchit::Router<()>>,
}

impl RoutePolicyBuilder {
    /// Register `path` (`{param}` syntax) for `method`.
    ///
    /// # Errors
    /// Fails on a conflicting or malformed pattern.
    pub fn add(
        &mut self,
        method: Method,
        path: &str,
        requirement: AuthRequirement,
    ) -> anyhow::Result<()> {
        match requirement {
            AuthRequirement::None => self
                .public
                .entry(method)
                .or_insert_with(matchit::Router::new)
                .insert(path, ())
                .map_err(|e| anyhow::anyhow!("Failed to insert public route pattern '{path}': {e}")),
            AuthRequirement::Required(Some(req)) => self
                .gated
                .entry(method)
                .or_insert_with(matchit::Router::new)
                .insert(path, req)
                .map_err(|e| anyhow::anyhow!("Failed to insert route pattern '{path}': {e}")),
            // Authentication is the default.
            AuthRequirement::Required(None) => Ok(()),
        }
    }

    #[must_use]
    pub fn build(self) -> RoutePolicy {
        RoutePolicy {
            gated: Arc::new(self.gated),
            public: Arc::new(self.public),
        }
    }
}

/// Shared state for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    pub resolver: Arc<dyn ActorResolver>,
    pub route_policy: RoutePolicy,
}

/// Authentication and gate middleware.
///
/// For each request:
/// 1. Resolves the route's requirement via [`RoutePolicy`]
/// 2. Public routes pass through untouched
/// 3. Otherwise extracts the bearer token and resolves the [`Actor`]
/// 4. Applies the route's gate requirement, if any, and inserts the actor
pub async fn authn_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let requirement = state.route_policy.resolve(req.method(), req.uri().path());
    let AuthRequirement::Required(gate) = requirement else {
        return next.run(req).await;
    };

    let Some(token) = extract_bearer_token(req.headers()) else {
        return Problem::new(
            StatusCode::UNAUTHORIZED,
            "Missing or invalid Authorization header",
        )
        .into_response();
    };

    let actor = match state.resolver.resolve_actor(token).await {
        Ok(actor) => actor,
        Err(err) => {
            tracing::debug!(error = %err, "authentication rejected");
            return err.into_response();
        }
    };

    if let Some(RouteRequirement { resource, action }) = gate
        && permissions::check(&actor, resource, action) == GateDecision::Deny
    {
        tracing::debug!(?resource, ?action, user_id = actor.user_id(), "gate denied");
        return DomainError::Forbidden.into_response();
    }

    req.extensions_mut().insert(actor);
    next.run(req).await
}

/// Extract Bearer token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer ").map(str::trim))
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn policy() -> RoutePolicy {
        let mut b = RoutePolicyBuilder::default();
        b.add(Method::POST, "/login/", AuthRequirement::None).unwrap();
        b.add(
            Method::GET,
            "/clients/{id}/",
            AuthRequirement::Required(Some(RouteRequirement {
                resource: Resource::Client,
                action: Action::Retrieve,
            })),
        )
        .unwrap();
        b.add(Method::GET, "/logout/", AuthRequirement::Required(None))
            .unwrap();
        b.build()
    }

    #[test]
    fn path_params_match_concrete_ids() {
        assert_eq!(
            policy().resolve(&Method::GET, "/clients/42/"),
            AuthRequirement::Required(Some(RouteRequirement {
                resource: Resource::Client,
                action: Action::Retrieve,
            }))
        );
    }

    #[test]
    fn public_routes_are_per_method() {
        let p = policy();
        assert_eq!(p.resolve(&Method::POST, "/login/"), AuthRequirement::None);
        assert_eq!(
            p.resolve(&Method::GET, "/login/"),
            AuthRequirement::Required(None)
        );
    }

    #[test]
    fn unknown_routes_require_authentication() {
        assert_eq!(
            policy().resolve(&Method::GET, "/anything/"),
            AuthRequirement::Required(None)
        );
    }

    #[test]
    fn conflicting_patterns_are_reported() {
        let mut b = RoutePolicyBuilder::default();
        b.add(Method::GET, "/x/{id}/", AuthRequirement::None).unwrap();
        let err = b
            .add(Method::GET, "/x/{other}/", AuthRequirement::None)
            .unwrap_err();
        assert!(err.to_string().contains("/x/{other}/"));
    }

    #[test]
    fn bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(extract_bearer_token(&headers), Some("abc123"));
    }
}

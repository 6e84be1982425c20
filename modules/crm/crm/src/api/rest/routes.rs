//! Route table of the REST surface.
//!
//! Every route is registered twice: with axum for dispatch and with the
//! [`RoutePolicyBuilder`] for the authentication middleware, so that the
//! gate requirement sits next to the handler it protects.

use std::sync::Arc;

use axum::http::Method;
use axum::routing::{MethodRouter, get, post};
use axum::{Extension, Router, middleware};
use crm_sdk::ContactKind;
use tower_http::trace::TraceLayer;

use super::auth::{
    ActorResolver, AuthRequirement, AuthState, RoutePolicyBuilder, RouteRequirement,
    authn_middleware,
};
use super::handlers::{auth, clients, contacts, contracts, events};
use crate::domain::permissions::{Action, Resource};
use crate::domain::repos::CrmRepository;
use crate::domain::service::AppServices;

type AppRouter<R> = Router<Arc<AppServices<R>>>;

/// Methods of a collection route and the action each maps to.
const COLLECTION_ACTIONS: [(Method, Action); 2] =
    [(Method::GET, Action::List), (Method::POST, Action::Create)];

/// Methods of an item route and the action each maps to.
const ITEM_ACTIONS: [(Method, Action); 4] = [
    (Method::GET, Action::Retrieve),
    (Method::PUT, Action::Update),
    (Method::PATCH, Action::PartialUpdate),
    (Method::DELETE, Action::Destroy),
];

/// Every method a login route answers; all but POST get 405 from axum.
const LOGIN_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
];

/// Register the gate requirements of one resource's collection and item routes.
fn gate_resource(
    policy: &mut RoutePolicyBuilder,
    resource: Resource,
    collection: &str,
    item: &str,
) -> anyhow::Result<()> {
    for (path, actions) in [
        (collection, &COLLECTION_ACTIONS[..]),
        (item, &ITEM_ACTIONS[..]),
    ] {
        for (method, action) in actions {
            policy.add(
                method.clone(),
                path,
                AuthRequirement::Required(Some(RouteRequirement {
                    resource,
                    action: *action,
                })),
            )?;
        }
    }
    Ok(())
}

fn contact_routes<R: CrmRepository>(
    router: AppRouter<R>,
    kind: ContactKind,
    collection: &str,
    item: &str,
) -> AppRouter<R> {
    let list: MethodRouter<Arc<AppServices<R>>> = get(contacts::list::<R>)
        .post(contacts::create::<R>)
        .layer(Extension(kind));
    let detail: MethodRouter<Arc<AppServices<R>>> = get(contacts::get::<R>)
        .put(contacts::update::<R>)
        .patch(contacts::update::<R>)
        .delete(contacts::delete::<R>)
        .layer(Extension(kind));
    router.route(collection, list).route(item, detail)
}

/// Build the CRM router with authentication, gate and tracing layers.
///
/// # Errors
/// Fails if a route pattern cannot be registered with the route policy.
pub fn router<R: CrmRepository>(svc: Arc<AppServices<R>>) -> anyhow::Result<Router> {
    let mut policy = RoutePolicyBuilder::default();
    for method in LOGIN_METHODS {
        policy.add(method, "/login/", AuthRequirement::None)?;
    }
    gate_resource(&mut policy, Resource::Client, "/clients/", "/clients/{id}/")?;
    gate_resource(
        &mut policy,
        Resource::Contract,
        "/contracts/",
        "/contracts/{id}/",
    )?;
    gate_resource(&mut policy, Resource::Event, "/events/", "/events/{id}/")?;

    let mut app: AppRouter<R> = Router::new()
        .route("/login/", post(auth::login::<R>))
        .route("/logout/", get(auth::logout::<R>).post(auth::logout::<R>))
        .route("/eventstatuses/", get(events::statuses::<R>))
        .route("/clients/", get(clients::list::<R>).post(clients::create::<R>))
        .route(
            "/clients/{id}/",
            get(clients::get::<R>)
                .put(clients::put::<R>)
                .patch(clients::patch::<R>)
                .delete(clients::delete::<R>),
        )
        .route(
            "/contracts/",
            get(contracts::list::<R>).post(contracts::create::<R>),
        )
        .route(
            "/contracts/{id}/",
            get(contracts::get::<R>)
                .put(contracts::put::<R>)
                .patch(contracts::patch::<R>)
                .delete(contracts::delete::<R>),
        )
        .route("/events/", get(events::list::<R>).post(events::create::<R>))
        .route(
            "/events/{id}/",
            get(events::get::<R>)
                .put(events::put::<R>)
                .patch(events::patch::<R>)
                .delete(events::delete::<R>),
        );

    for kind in ContactKind::ALL {
        let collection = format!("/{}s/", kind.resource_name());
        let item = format!("{collection}{{id}}/");
        gate_resource(
            &mut policy,
            Resource::for_contact(kind),
            &collection,
            &item,
        )?;
        app = contact_routes(app, kind, &collection, &item);
    }

    let auth_state = AuthState {
        resolver: Arc::clone(&svc) as Arc<dyn ActorResolver>,
        route_policy: policy.build(),
    };
    Ok(app
        .layer(middleware::from_fn_with_state(auth_state, authn_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(svc))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn every_resource_route_is_gated() {
        let mut policy = RoutePolicyBuilder::default();
        gate_resource(&mut policy, Resource::Event, "/events/", "/events/{id}/").unwrap();
        let policy = policy.build();

        assert_eq!(
            policy.resolve(&Method::POST, "/events/"),
            AuthRequirement::Required(Some(RouteRequirement {
                resource: Resource::Event,
                action: Action::Create,
            }))
        );
        assert_eq!(
            policy.resolve(&Method::PATCH, "/events/7/"),
            AuthRequirement::Required(Some(RouteRequirement {
                resource: Resource::Event,
                action: Action::PartialUpdate,
            }))
        );
    }
}

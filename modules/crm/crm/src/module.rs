//! Wiring of the CRM module: schema, authorization seed, services and the
//! HTTP router.

use std::sync::Arc;

use axum::Router;
use crm_db::Db;
use crm_db::migration_runner::run_migrations;
use crm_sdk::CrmClientV1;
use tracing::info;

use crate::config::CrmConfig;
use crate::domain::local_client::CrmLocalClient;
use crate::domain::service::AppServices;
use crate::infra::fixtures::seed_authorization;
use crate::infra::storage::{Migrator, OrmCrmRepository};

pub const MODULE_NAME: &str = "crm";

/// The CRM module, ready to serve.
pub struct CrmModule {
    db: Db,
    services: Arc<AppServices<OrmCrmRepository>>,
}

impl CrmModule {
    /// Migrate the schema, seed groups and permissions, and build the services.
    ///
    /// # Errors
    /// Fails on invalid configuration or when migrations or the seed fail.
    #[tracing::instrument(skip_all)]
    pub async fn init(db: Db, cfg: &CrmConfig) -> anyhow::Result<Self> {
        let service_config = cfg.to_service_config()?;
        info!(
            default_page_size = cfg.default_page_size,
            session_ttl_secs = cfg.session_ttl_secs,
            "Initializing CRM module"
        );

        run_migrations::<Migrator>(&db, MODULE_NAME).await?;
        seed_authorization(&db).await?;

        let repo = Arc::new(OrmCrmRepository);
        let services = Arc::new(AppServices::new(&db, &repo, service_config));
        Ok(Self { db, services })
    }

    #[must_use]
    pub fn db(&self) -> &Db {
        &self.db
    }

    #[must_use]
    pub fn services(&self) -> &Arc<AppServices<OrmCrmRepository>> {
        &self.services
    }

    /// REST router with authentication, gate and tracing layers.
    ///
    /// # Errors
    /// Fails if the route policy cannot be built.
    pub fn router(&self) -> anyhow::Result<Router> {
        crate::api::rest::router(Arc::clone(&self.services))
    }

    /// In-process client for other components.
    #[must_use]
    pub fn client(&self) -> Arc<dyn CrmClientV1> {
        Arc::new(CrmLocalClient::new(Arc::clone(&self.services)))
    }
}

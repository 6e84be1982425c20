//! Configuration for the CRM module.

use serde::Deserialize;

use crate::domain::service::ServiceConfig;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CrmConfig {
    /// Page size when a list request carries no `limit`.
    pub default_page_size: u64,
    /// Upper bound for `limit`.
    pub max_page_size: u64,
    /// Lifetime of a login session, in seconds.
    pub session_ttl_secs: u64,
    pub min_password_length: usize,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            max_page_size: 1000,
            session_ttl_secs: 86_400,
            min_password_length: 8,
        }
    }
}

impl CrmConfig {
    /// # Errors
    /// Fails when a page size is zero, the default exceeds the maximum, or
    /// the session lifetime is zero or out of range.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.default_page_size == 0 || self.max_page_size == 0 {
            anyhow::bail!("page sizes must be positive");
        }
        if self.default_page_size > self.max_page_size {
            anyhow::bail!(
                "default_page_size ({}) exceeds max_page_size ({})",
                self.default_page_size,
                self.max_page_size
            );
        }
        if self.session_ttl_secs == 0 {
            anyhow::bail!("session_ttl_secs must be positive");
        }
        Ok(())
    }

    /// # Errors
    /// Fails when the configuration does not validate.
    pub fn to_service_config(&self) -> anyhow::Result<ServiceConfig> {
        self.validate()?;
        let secs = i64::try_from(self.session_ttl_secs)?;
        let session_ttl = chrono::Duration::try_seconds(secs)
            .ok_or_else(|| anyhow::anyhow!("session_ttl_secs out of range: {secs}"))?;
        Ok(ServiceConfig {
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
            session_ttl,
            min_password_length: self.min_password_length,
        })
    }
}

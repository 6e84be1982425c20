use std::sync::Arc;

use chrono::Utc;
use crm_db::Db;
use crm_security::SecurityContext;
use tracing::{debug, info, instrument, warn};

use super::{Deps, ServiceConfig};
use crate::domain::error::DomainError;
use crate::domain::profile::{Actor, ProfileResolver};
use crate::domain::repos::CrmRepository;
use crate::infra::password::{new_token, token_digest, verify_password};

/// Result of a successful login.
#[derive(Clone)]
pub struct LoginSession {
    pub token: String,
    pub username: String,
    pub groups: Vec<String>,
}

impl std::fmt::Debug for LoginSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginSession")
            .field("token", &"***")
            .field("username", &self.username)
            .field("groups", &self.groups)
            .finish()
    }
}

/// Credential check and opaque bearer-token sessions.
pub struct AuthService<R: CrmRepository> {
    db: Db,
    repo: Arc<R>,
    config: Arc<ServiceConfig>,
    profiles: Arc<ProfileResolver<R>>,
}

impl<R: CrmRepository> AuthService<R> {
    #[must_use]
    pub fn new(deps: Deps<R>, profiles: Arc<ProfileResolver<R>>) -> Self {
        Self {
            db: deps.db,
            repo: deps.repo,
            config: deps.config,
            profiles,
        }
    }

    /// Check credentials and open a session.
    ///
    /// # Errors
    /// `Validation` for a missing or empty field; `Forbidden` for an
    /// unknown or inactive user and for a wrong password.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<LoginSession, DomainError> {
        let username = username
            .filter(|u| !u.is_empty())
            .ok_or_else(|| DomainError::missing("username"))?;
        let password = password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| DomainError::missing("password"))?;

        let conn = self.db.conn();
        let Some(user) = self.repo.find_user_by_username(conn, username).await? else {
            warn!("Login for unknown user");
            return Err(DomainError::Forbidden);
        };
        if !user.is_active || !verify_password(password, &user.password_hash) {
            warn!(user_id = user.id, "Login refused");
            return Err(DomainError::Forbidden);
        }

        let token = new_token();
        let now = Utc::now();
        self.repo
            .insert_session(
                conn,
                user.id,
                &token_digest(&token),
                now,
                now + self.config.session_ttl,
            )
            .await?;
        let groups = self.repo.group_names(conn, user.id).await?;
        info!(user_id = user.id, "User logged in");
        Ok(LoginSession {
            token,
            username: user.username,
            groups,
        })
    }

    /// Close the session behind `token`. Closing a closed session is a no-op.
    ///
    /// # Errors
    /// `Database` if the delete fails.
    #[instrument(skip_all)]
    pub async fn logout(&self, token: &str) -> Result<(), DomainError> {
        let removed = self
            .repo
            .delete_session(self.db.conn(), &token_digest(token))
            .await?;
        info!(removed, "User logged out");
        Ok(())
    }

    /// Map a bearer token to the caller it was issued to.
    ///
    /// # Errors
    /// `Unauthorized` for an empty, unknown or expired token, or an inactive user.
    #[instrument(skip_all)]
    pub async fn authenticate(&self, token: &str) -> Result<SecurityContext, DomainError> {
        if token.is_empty() {
            return Err(DomainError::Unauthorized);
        }
        let user = self
            .repo
            .find_session_user(self.db.conn(), &token_digest(token), Utc::now())
            .await?
            .filter(|u| u.is_active)
            .ok_or(DomainError::Unauthorized)?;
        debug!(user_id = user.id, "Authenticated bearer token");
        Ok(SecurityContext::builder()
            .subject_id(user.id)
            .username(user.username)
            .superuser(user.is_superuser)
            .bearer_token(token)
            .build())
    }

    /// Authenticate `token` and resolve the caller's role and permissions.
    ///
    /// # Errors
    /// As for [`Self::authenticate`].
    pub async fn resolve_actor(&self, token: &str) -> Result<Actor, DomainError> {
        let ctx = self.authenticate(token).await?;
        self.profiles.resolve(ctx).await
    }
}

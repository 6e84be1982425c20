use secrecy::{ExposeSecret, SecretString};

use crate::access_scope::RowId;

/// Identity of an authenticated caller.
///
/// Produced by authentication and consumed by profile resolution. Holds
/// only what the session proved; roles and permissions are resolved
/// separately from the store.
#[derive(Clone)]
pub struct SecurityContext {
    subject_id: RowId,
    username: String,
    is_superuser: bool,
    bearer_token: Option<SecretString>,
}

impl std::fmt::Debug for SecurityContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityContext")
            .field("subject_id", &self.subject_id)
            .field("username", &self.username)
            .field("is_superuser", &self.is_superuser)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl SecurityContext {
    #[must_use]
    pub fn builder() -> SecurityContextBuilder {
        SecurityContextBuilder::default()
    }

    /// User id of the caller.
    #[must_use]
    pub fn subject_id(&self) -> RowId {
        self.subject_id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn is_superuser(&self) -> bool {
        self.is_superuser
    }

    /// Raw bearer token the request was authenticated with, if any.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_ref().map(ExposeSecret::expose_secret)
    }
}

#[derive(Default)]
pub struct SecurityContextBuilder {
    subject_id: RowId,
    username: String,
    is_superuser: bool,
    bearer_token: Option<SecretString>,
}

impl SecurityContextBuilder {
    #[must_use]
    pub fn subject_id(mut self, id: RowId) -> Self {
        self.subject_id = id;
        self
    }

    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    #[must_use]
    pub fn superuser(mut self, is_superuser: bool) -> Self {
        self.is_superuser = is_superuser;
        self
    }

    #[must_use]
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(SecretString::from(token.into()));
        self
    }

    #[must_use]
    pub fn build(self) -> SecurityContext {
        SecurityContext {
            subject_id: self.subject_id,
            username: self.username,
            is_superuser: self.is_superuser,
            bearer_token: self.bearer_token,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_all_fields() {
        let ctx = SecurityContext::builder()
            .subject_id(12)
            .username("staff_contact_01")
            .superuser(true)
            .bearer_token("abc")
            .build();

        assert_eq!(ctx.subject_id(), 12);
        assert_eq!(ctx.username(), "staff_contact_01");
        assert!(ctx.is_superuser());
        assert_eq!(ctx.bearer_token(), Some("abc"));
    }

    #[test]
    fn debug_hides_token() {
        let ctx = SecurityContext::builder()
            .subject_id(1)
            .bearer_token("very-secret")
            .build();
        let rendered = format!("{ctx:?}");
        assert!(!rendered.contains("very-secret"));
        assert!(rendered.contains("***"));
    }
}

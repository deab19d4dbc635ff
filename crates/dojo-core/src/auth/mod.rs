//! Caller identity for the remote store.

mod supabase;

use async_trait::async_trait;

use crate::Result;

pub use supabase::{
    normalize_auth_url, resolve_optional_supabase_config, AuthError, AuthResult, AuthSession,
    AuthUser, SessionPersistence, SupabaseAuthClient, SupabaseIdentityProvider,
};

/// Who calls the remote store.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Whether a signed-in or anonymous identity is present.
    async fn has_identity(&self) -> bool;

    /// Create an anonymous identity when none exists.
    async fn create_anonymous_identity(&self) -> Result<()>;

    /// Stable user id of the current identity.
    async fn current_user_id(&self) -> Option<String>;

    /// Bearer token for remote calls, `None` when there is no identity.
    async fn access_token(&self) -> Result<Option<String>>;
}

/// Identity provider for builds without an auth backend.
///
/// Remote calls go out unauthenticated and escalation always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIdentity;

#[async_trait]
impl IdentityProvider for NoIdentity {
    async fn has_identity(&self) -> bool {
        false
    }

    async fn create_anonymous_identity(&self) -> Result<()> {
        Err(AuthError::NotConfigured.into())
    }

    async fn current_user_id(&self) -> Option<String> {
        None
    }

    async fn access_token(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

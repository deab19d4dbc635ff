//! One-shot anonymous sign-in when the remote store rejects the caller.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::auth::IdentityProvider;
use crate::Result;

/// Retries a remote call once after making sure an identity exists.
#[derive(Clone)]
pub struct AuthEscalator {
    identity: Arc<dyn IdentityProvider>,
}

impl AuthEscalator {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self { identity }
    }

    /// Run `call`; on an authorization failure ensure an identity and run it
    /// exactly once more. The second outcome is returned as-is.
    pub async fn with_auth_escalation<T, F, Fut>(&self, call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.scope().run(call).await
    }

    /// Escalation budget for one remote invocation, shared by all its retries.
    pub fn scope(&self) -> EscalationScope<'_> {
        EscalationScope {
            escalator: self,
            spent: AtomicBool::new(false),
        }
    }

    async fn ensure_identity(&self) -> Result<()> {
        if self.identity.has_identity().await {
            return Ok(());
        }
        tracing::info!("Remote store requires an identity; creating an anonymous one");
        self.identity.create_anonymous_identity().await
    }
}

/// Allows at most one escalation across every attempt run through it.
pub struct EscalationScope<'a> {
    escalator: &'a AuthEscalator,
    spent: AtomicBool,
}

impl EscalationScope<'_> {
    pub async fn run<T, F, Fut>(&self, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match call().await {
            Err(error) if error.is_authorization() && !self.spent.swap(true, Ordering::SeqCst) => {
                tracing::warn!("Remote call was rejected ({}); escalating auth", error);
                self.escalator.ensure_identity().await?;
                call().await
            }
            outcome => outcome,
        }
    }
}

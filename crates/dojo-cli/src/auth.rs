//! Supabase session persistence in the OS keychain.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use dojo_core::auth::{
    AuthResult, SessionPersistence, SupabaseAuthClient, SupabaseIdentityProvider,
};
pub use dojo_core::auth::{AuthError, AuthSession};
use dojo_core::config::ClientConfig;

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "dojo-cli";

pub type CliIdentity = SupabaseIdentityProvider<SessionStore>;

/// Session slot keyed by the Supabase project, so two projects never share
/// a session.
#[derive(Clone)]
pub struct SessionStore {
    username: String,
}

impl SessionStore {
    pub fn new(supabase_url: &str) -> Self {
        Self {
            username: format!("supabase_session:{}", supabase_url.trim_end_matches('/')),
        }
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> AuthResult<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))
    }
}

impl SessionPersistence for SessionStore {
    #[cfg(not(test))]
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        let entry = self.entry()?;
        match entry.get_password() {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        let guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard
            .get(&self.username)
            .map(|raw| serde_json::from_str(raw))
            .transpose()
            .map_err(AuthError::from)
    }

    #[cfg(not(test))]
    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        self.entry()?
            .set_password(&raw)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        Ok(())
    }

    #[cfg(test)]
    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard.insert(self.username.clone(), raw);
        Ok(())
    }

    #[cfg(not(test))]
    fn clear_session(&self) -> AuthResult<()> {
        let entry = self.entry()?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn clear_session(&self) -> AuthResult<()> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard.remove(&self.username);
        Ok(())
    }
}

/// Identity provider for the configured Supabase project, if any.
pub fn identity_from_config(config: &ClientConfig) -> AuthResult<Option<CliIdentity>> {
    let Some(supabase) = config.supabase.as_ref() else {
        return Ok(None);
    };

    let client = SupabaseAuthClient::new(
        &supabase.url,
        supabase.anon_key.clone(),
        config.http_timeout,
        SessionStore::new(&supabase.url),
    )?;
    Ok(Some(SupabaseIdentityProvider::new(client)))
}

#[cfg(test)]
mod tests {
    use dojo_core::auth::AuthUser;
    use dojo_core::config::SupabaseConfig;

    use super::*;

    fn session(user: &str) -> AuthSession {
        AuthSession {
            access_token: "secret-access-token".to_string(),
            refresh_token: "secret-refresh-token".to_string(),
            expires_at: 4_000_000_000,
            user: AuthUser {
                id: user.to_string(),
                email: None,
                is_anonymous: true,
            },
        }
    }

    #[test]
    fn sessions_are_scoped_per_project() {
        let first = SessionStore::new("https://one.supabase.co/");
        let second = SessionStore::new("https://two.supabase.co");

        first.save_session(&session("u1")).unwrap();
        assert_eq!(first.load_session().unwrap().unwrap().user.id, "u1");
        assert!(second.load_session().unwrap().is_none());

        first.clear_session().unwrap();
        assert!(first.load_session().unwrap().is_none());
    }

    #[test]
    fn identity_requires_supabase_config() {
        assert!(identity_from_config(&ClientConfig::default()).unwrap().is_none());

        let config = ClientConfig {
            supabase: Some(SupabaseConfig {
                url: "https://demo.supabase.co".to_string(),
                anon_key: "anon".to_string(),
            }),
            ..ClientConfig::default()
        };
        assert!(identity_from_config(&config).unwrap().is_some());
    }

    #[test]
    fn session_debug_redacts_tokens() {
        let rendered = format!("{:?}", session("u1"));
        assert!(!rendered.contains("secret-access-token"));
        assert!(rendered.contains("[REDACTED]"));
    }
}

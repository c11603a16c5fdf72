//! Authentication provider capability
//!
//! [`AuthProvider`] is the seam between this client and whatever performs
//! the actual OIDC handshake. The trait is object-safe so a
//! [`SessionStore`](super::SessionStore) can hold `Arc<dyn AuthProvider>`
//! and tests can substitute a scripted fake.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// Result of a one-shot authentication check.
#[derive(Debug, Clone, Default)]
pub struct AuthCheck {
    pub is_authenticated: bool,
    /// Opaque identity claims as returned by the provider
    pub user_claims: Option<serde_json::Value>,
}

/// Capability trait over the external authentication machinery.
///
/// Mirrors the surface the session layer consumes: a one-shot check, a
/// continuous authenticated-flag stream, token accessors, and the
/// authorize/logoff side effects.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// One-shot authentication check against the provider.
    async fn check_auth(&self) -> Result<AuthCheck>;

    /// Subscribe to the continuous authenticated-flag stream.
    ///
    /// Implementations emit the current flag immediately on subscription,
    /// then every subsequent change, for as long as the provider lives.
    fn subscribe_flags(&self) -> mpsc::UnboundedReceiver<bool>;

    /// Fetch the current access token. Empty when unauthenticated.
    async fn access_token(&self) -> Result<String>;

    /// Fetch the current ID token. Empty when unauthenticated.
    async fn id_token(&self) -> Result<String>;

    /// Start the authorization flow (redirect side effect).
    async fn authorize(&self) -> Result<()>;

    /// End the provider session.
    async fn logoff(&self) -> Result<()>;
}

/// [`AuthProvider`] over a pre-issued bearer token.
///
/// For headless use (CLI, scripts) where the interactive OIDC flow is not
/// available: the session is authenticated exactly while a non-empty token
/// is configured and not yet revoked by [`AuthProvider::logoff`].
pub struct StaticTokenProvider {
    token: String,
    username: Option<String>,
    revoked: AtomicBool,
    flag_senders: Mutex<Vec<mpsc::UnboundedSender<bool>>>,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            username: None,
            revoked: AtomicBool::new(false),
            flag_senders: Mutex::new(Vec::new()),
        }
    }

    /// A provider with no token; the session stays anonymous.
    pub fn anonymous() -> Self {
        Self::new(String::new())
    }

    /// Attach a username claim to authenticated sessions.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    fn is_authenticated(&self) -> bool {
        !self.token.is_empty() && !self.revoked.load(Ordering::SeqCst)
    }

    fn emit_flag(&self, flag: bool) {
        let mut senders = self
            .flag_senders
            .lock()
            .expect("flag subscriber list poisoned");
        senders.retain(|tx| tx.send(flag).is_ok());
    }

    fn claims(&self) -> Option<serde_json::Value> {
        let username = self.username.as_ref()?;
        Some(serde_json::json!({
            "username": username,
            "preferred_username": username,
        }))
    }
}

#[async_trait]
impl AuthProvider for StaticTokenProvider {
    async fn check_auth(&self) -> Result<AuthCheck> {
        if self.is_authenticated() {
            Ok(AuthCheck {
                is_authenticated: true,
                user_claims: self.claims(),
            })
        } else {
            Ok(AuthCheck::default())
        }
    }

    fn subscribe_flags(&self) -> mpsc::UnboundedReceiver<bool> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(self.is_authenticated());
        self.flag_senders
            .lock()
            .expect("flag subscriber list poisoned")
            .push(tx);
        rx
    }

    async fn access_token(&self) -> Result<String> {
        if self.is_authenticated() {
            Ok(self.token.clone())
        } else {
            Ok(String::new())
        }
    }

    async fn id_token(&self) -> Result<String> {
        // A pre-issued bearer token has no separate ID token.
        Ok(String::new())
    }

    async fn authorize(&self) -> Result<()> {
        Err(Error::Auth(
            "static token provider cannot start an authorization flow".to_string(),
        ))
    }

    async fn logoff(&self) -> Result<()> {
        self.revoked.store(true, Ordering::SeqCst);
        self.emit_flag(false);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider_with_token() {
        let provider = StaticTokenProvider::new("tok-123").with_username("alice");

        let check = provider.check_auth().await.unwrap();
        assert!(check.is_authenticated);
        assert_eq!(
            check.user_claims.unwrap()["username"],
            serde_json::json!("alice")
        );
        assert_eq!(provider.access_token().await.unwrap(), "tok-123");
    }

    #[tokio::test]
    async fn test_static_provider_anonymous() {
        let provider = StaticTokenProvider::anonymous();

        let check = provider.check_auth().await.unwrap();
        assert!(!check.is_authenticated);
        assert!(check.user_claims.is_none());
        assert!(provider.access_token().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_subscribe_emits_current_flag() {
        let provider = StaticTokenProvider::new("tok-123");
        let mut flags = provider.subscribe_flags();
        assert_eq!(flags.recv().await, Some(true));
    }

    #[tokio::test]
    async fn test_logoff_revokes_and_emits() {
        let provider = StaticTokenProvider::new("tok-123");
        let mut flags = provider.subscribe_flags();
        assert_eq!(flags.recv().await, Some(true));

        provider.logoff().await.unwrap();
        assert_eq!(flags.recv().await, Some(false));
        assert!(provider.access_token().await.unwrap().is_empty());
        assert!(!provider.check_auth().await.unwrap().is_authenticated);
    }
}

//! Process-wide authentication session state
//!
//! [`SessionStore`] owns the single authoritative [`SessionSnapshot`] and
//! publishes every merge, in order, to any number of observers. It is an
//! explicitly constructed object with its [`AuthProvider`] injected; nothing
//! here is a hidden module-level singleton.
//!
//! ## Merge protocol
//!
//! All snapshot mutation goes through one internal merge primitive that
//! holds the state lock across both the field update and the fan-out to
//! observers, so observers see merges in the exact order they happened and
//! a later partial update always carries every previously merged field.
//! Merges are additive; only the authenticated-to-anonymous transition
//! clears fields.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::auth::provider::AuthProvider;

/// The complete authentication state at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub is_authenticated: bool,
    /// Opaque identity claims; `None` until the first successful check
    pub user_claims: Option<serde_json::Value>,
    /// Bearer access token; non-empty only while authenticated
    pub access_token: String,
    pub id_token: String,
    /// True only before the first completed authentication check
    pub is_loading: bool,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            is_authenticated: false,
            user_claims: None,
            access_token: String::new(),
            id_token: String::new(),
            is_loading: true,
        }
    }
}

impl SessionSnapshot {
    /// Derived lifecycle state.
    pub fn phase(&self) -> SessionPhase {
        if self.is_loading {
            SessionPhase::Loading
        } else if self.is_authenticated {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        }
    }

    /// Whether authenticated requests can be made right now.
    ///
    /// Token retrieval lags the authenticated flag, so this is the
    /// synchronization point dependent fetches wait on.
    pub fn has_usable_token(&self) -> bool {
        self.is_authenticated && !self.access_token.is_empty()
    }
}

/// Session lifecycle states derived from `(is_loading, is_authenticated)`.
///
/// `Loading -> {Anonymous | Authenticated}` after the initial check, then
/// `Authenticated <-> Anonymous` on login/logout. No terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Anonymous,
    Authenticated,
}

/// An observer's view of the session: the current snapshot followed by
/// every subsequent merge.
pub struct SessionEvents {
    rx: mpsc::UnboundedReceiver<SessionSnapshot>,
}

impl SessionEvents {
    /// Next snapshot, `None` once the store is gone.
    pub async fn next(&mut self) -> Option<SessionSnapshot> {
        self.rx.recv().await
    }
}

struct SessionState {
    snapshot: SessionSnapshot,
    observers: Vec<mpsc::UnboundedSender<SessionSnapshot>>,
}

/// Process-wide holder of the authentication session.
///
/// Cheap to clone; clones share the same state and provider.
#[derive(Clone)]
pub struct SessionStore {
    provider: Arc<dyn AuthProvider>,
    state: Arc<Mutex<SessionState>>,
}

impl SessionStore {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self {
            provider,
            state: Arc::new(Mutex::new(SessionState {
                snapshot: SessionSnapshot::default(),
                observers: Vec::new(),
            })),
        }
    }

    /// The latest snapshot, synchronously.
    pub fn current(&self) -> SessionSnapshot {
        self.state
            .lock()
            .expect("session state lock poisoned")
            .snapshot
            .clone()
    }

    /// Subscribe to session changes with replay-latest semantics: the
    /// returned stream yields the current snapshot immediately, then every
    /// subsequent merge. An observer created after login sees
    /// "authenticated" at once instead of waiting for the next transition.
    pub fn observe(&self) -> SessionEvents {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.lock().expect("session state lock poisoned");
        // Seeding and registration happen under the same lock as merges,
        // so no merge can slip between them.
        let _ = tx.send(state.snapshot.clone());
        state.observers.push(tx);
        SessionEvents { rx }
    }

    /// Apply a mutation to the snapshot and publish the result to every
    /// observer, atomically with respect to other merges.
    fn merge(&self, apply: impl FnOnce(&mut SessionSnapshot)) {
        let mut state = self.state.lock().expect("session state lock poisoned");
        apply(&mut state.snapshot);
        let snapshot = state.snapshot.clone();
        state
            .observers
            .retain(|tx| tx.send(snapshot.clone()).is_ok());
    }

    /// Start the session pipelines. Call once at startup.
    ///
    /// Spawns two tasks: one consuming the provider's continuous
    /// authenticated-flag stream, and one running the one-shot check
    /// followed by access- and ID-token retrieval, merging each result as
    /// it arrives. Provider failures are logged and leave the session in
    /// its last known good state; they never reach observers.
    pub fn initialize(&self) {
        let mut flags = self.provider.subscribe_flags();
        let store = self.clone();
        tokio::spawn(async move {
            while let Some(flag) = flags.recv().await {
                tracing::debug!(is_authenticated = flag, "authentication flag update");
                store.merge(|s| {
                    s.is_authenticated = flag;
                    s.is_loading = false;
                    if !flag {
                        // Tokens and claims must not outlive the session
                        // that issued them.
                        s.access_token.clear();
                        s.id_token.clear();
                        s.user_claims = None;
                    }
                });
            }
            tracing::debug!("authentication flag stream ended");
        });

        let store = self.clone();
        let provider = self.provider.clone();
        tokio::spawn(async move {
            match provider.check_auth().await {
                Ok(check) => {
                    tracing::info!(
                        is_authenticated = check.is_authenticated,
                        "authentication check complete"
                    );
                    store.merge(|s| {
                        s.is_authenticated = check.is_authenticated;
                        s.user_claims = check.user_claims;
                        s.is_loading = false;
                    });

                    match provider.access_token().await {
                        // Guarded merge: a token may only land in an
                        // authenticated snapshot.
                        Ok(token) => store.merge(|s| {
                            if s.is_authenticated {
                                s.access_token = token;
                            }
                        }),
                        Err(e) => tracing::error!(error = %e, "failed to fetch access token"),
                    }

                    match provider.id_token().await {
                        Ok(token) => store.merge(|s| {
                            if s.is_authenticated {
                                s.id_token = token;
                            }
                        }),
                        Err(e) => tracing::error!(error = %e, "failed to fetch ID token"),
                    }
                }
                Err(e) => {
                    // Fail-soft: the check failing must not wedge the UI in
                    // a loading state.
                    tracing::error!(error = %e, "authentication check failed");
                    store.merge(|s| s.is_loading = false);
                }
            }
        });
    }

    /// Delegate to the provider's authorization flow. The snapshot is not
    /// touched here; the resulting change arrives through the flag stream.
    pub async fn login(&self) {
        if let Err(e) = self.provider.authorize().await {
            tracing::error!(error = %e, "authorization failed");
        }
    }

    /// Delegate to the provider's logoff. Errors are logged and swallowed;
    /// the snapshot is cleared by the subsequent flag update, so a failed
    /// logoff can leave an authenticated-looking session behind.
    pub async fn logout(&self) {
        match self.provider.logoff().await {
            Ok(()) => tracing::info!("logged off"),
            Err(e) => tracing::error!(error = %e, "logoff failed"),
        }
    }
}

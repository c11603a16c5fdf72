//! Session-dependent resource pipelines
//!
//! A [`DependentResource`] is a piece of data whose retrieval requires a
//! valid authenticated session: user settings, the following list, the user
//! directory. The pipeline subscribes to the session stream, waits until an
//! authenticated snapshot with a usable token arrives, runs its fetcher,
//! and degrades to a declared default on failure. No error ever escapes a
//! pipeline; it keeps reacting to future session transitions.
//!
//! In-flight fetches are never cancelled. Instead every trigger stamps a
//! monotonic request id and completions that are no longer the newest are
//! discarded, so a slow early fetch cannot overwrite the result of a later
//! one.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::auth::{SessionSnapshot, SessionStore};
use crate::error::Result;

/// Fetch side of a resource: load the value for an authenticated session.
#[async_trait]
pub trait ResourceFetcher<T>: Send + Sync {
    async fn fetch(&self, session: &SessionSnapshot) -> Result<T>;
}

/// Write side of a resource: push a new value, returning the
/// server-confirmed one.
#[async_trait]
pub trait ResourceWriter<T>: Send + Sync {
    async fn write(&self, session: &SessionSnapshot, value: &T) -> Result<T>;
}

/// How often the pipeline re-fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPolicy {
    /// Fetch on the first qualifying snapshot only.
    Once,
    /// Fetch on every qualifying snapshot (re-login, token refresh).
    EveryQualifying,
}

struct ResourceState<T> {
    value: Mutex<T>,
    default: T,
    loading: AtomicBool,
    /// Most recently issued request id; completions compare against this.
    sequence: AtomicU64,
}

impl<T: Clone> ResourceState<T> {
    fn apply(&self, request_id: u64, result: Result<T>) {
        let fresh = self.sequence.load(Ordering::SeqCst) == request_id;
        match result {
            Ok(value) => {
                if fresh {
                    *self.value.lock().expect("resource value lock poisoned") = value;
                } else {
                    tracing::debug!(request_id, "discarding stale fetch result");
                }
            }
            Err(e) => {
                tracing::warn!(request_id, error = %e, "resource fetch failed");
                if fresh {
                    *self.value.lock().expect("resource value lock poisoned") =
                        self.default.clone();
                }
            }
        }
        if fresh {
            self.loading.store(false, Ordering::SeqCst);
        }
    }
}

/// A resource bound to the session lifecycle.
///
/// Cheap to clone; clones share the same value and loading state.
pub struct DependentResource<T> {
    state: Arc<ResourceState<T>>,
}

impl<T> Clone for DependentResource<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> DependentResource<T> {
    /// Start a fetch pipeline against `session`.
    ///
    /// The pipeline registers its observer before returning, so a session
    /// that is already authenticated triggers an immediate fetch and no
    /// later transition is missed. Until the first fetch completes the
    /// resource holds `default`.
    pub fn spawn(
        session: &SessionStore,
        fetcher: Arc<dyn ResourceFetcher<T>>,
        default: T,
        policy: FetchPolicy,
    ) -> Self {
        let state = Arc::new(ResourceState {
            value: Mutex::new(default.clone()),
            default,
            loading: AtomicBool::new(false),
            sequence: AtomicU64::new(0),
        });
        let resource = Self {
            state: state.clone(),
        };

        let mut events = session.observe();
        tokio::spawn(async move {
            while let Some(snapshot) = events.next().await {
                if !snapshot.has_usable_token() {
                    continue;
                }
                let request_id = state.sequence.fetch_add(1, Ordering::SeqCst) + 1;
                state.loading.store(true, Ordering::SeqCst);

                let state = state.clone();
                let fetcher = fetcher.clone();
                // Spawned, not awaited: a new qualifying snapshot must not
                // wait for (nor cancel) an in-flight fetch.
                tokio::spawn(async move {
                    let result = fetcher.fetch(&snapshot).await;
                    state.apply(request_id, result);
                });

                if policy == FetchPolicy::Once {
                    break;
                }
            }
        });

        resource
    }

    /// A detached resource holding `default`, with no pipeline attached.
    ///
    /// Useful for write-only call sites that submit through
    /// [`DependentResource::submit`].
    pub fn detached(default: T) -> Self {
        Self {
            state: Arc::new(ResourceState {
                value: Mutex::new(default.clone()),
                default,
                loading: AtomicBool::new(false),
                sequence: AtomicU64::new(0),
            }),
        }
    }

    /// The current value.
    pub fn value(&self) -> T {
        self.state
            .value
            .lock()
            .expect("resource value lock poisoned")
            .clone()
    }

    /// Whether the newest fetch or submit is still in flight.
    pub fn is_loading(&self) -> bool {
        self.state.loading.load(Ordering::SeqCst)
    }

    /// Submit an updated value through `writer`.
    ///
    /// Suspends until a qualifying authenticated snapshot is available
    /// (immediately, if the session already has one), stores `value`
    /// optimistically, then performs the write. On success the
    /// server-confirmed value replaces the optimistic one; on failure the
    /// error is logged and the submitted value is kept rather than rolled
    /// back.
    pub async fn submit(
        &self,
        session: &SessionStore,
        writer: Arc<dyn ResourceWriter<T>>,
        value: T,
    ) -> T {
        let mut events = session.observe();
        let snapshot = loop {
            match events.next().await {
                Some(s) if s.has_usable_token() => break s,
                Some(_) => continue,
                None => {
                    tracing::warn!("session stream closed before update could run");
                    return value;
                }
            }
        };

        let request_id = self.state.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.loading.store(true, Ordering::SeqCst);
        *self
            .state
            .value
            .lock()
            .expect("resource value lock poisoned") = value.clone();

        let confirmed = match writer.write(&snapshot, &value).await {
            Ok(server_value) => {
                if self.state.sequence.load(Ordering::SeqCst) == request_id {
                    *self
                        .state
                        .value
                        .lock()
                        .expect("resource value lock poisoned") = server_value.clone();
                }
                server_value
            }
            Err(e) => {
                tracing::warn!(error = %e, "resource update failed, keeping submitted value");
                value
            }
        };

        if self.state.sequence.load(Ordering::SeqCst) == request_id {
            self.state.loading.store(false, Ordering::SeqCst);
        }
        confirmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_resource_holds_default() {
        let resource = DependentResource::detached(vec!["alice".to_string()]);
        assert_eq!(resource.value(), vec!["alice".to_string()]);
        assert!(!resource.is_loading());
    }

    #[test]
    fn test_stale_results_are_discarded() {
        let state = ResourceState {
            value: Mutex::new(0u32),
            default: 0,
            loading: AtomicBool::new(true),
            sequence: AtomicU64::new(2),
        };

        // Request 1 completes after request 2 was issued: discarded.
        state.apply(1, Ok(10));
        assert_eq!(*state.value.lock().unwrap(), 0);
        assert!(state.loading.load(Ordering::SeqCst));

        // Request 2 is the newest: applied.
        state.apply(2, Ok(20));
        assert_eq!(*state.value.lock().unwrap(), 20);
        assert!(!state.loading.load(Ordering::SeqCst));
    }

    #[test]
    fn test_fresh_failure_falls_back_to_default() {
        let state = ResourceState {
            value: Mutex::new(7u32),
            default: 42,
            loading: AtomicBool::new(true),
            sequence: AtomicU64::new(1),
        };

        state.apply(1, Err(crate::error::Error::Http("boom".to_string())));
        assert_eq!(*state.value.lock().unwrap(), 42);
        assert!(!state.loading.load(Ordering::SeqCst));
    }
}

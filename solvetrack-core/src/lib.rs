//! # solvetrack-core
//!
//! Core library for solvetrack - a coding-practice progress tracker client.
//!
//! This library provides:
//! - The authentication session layer (snapshot, merge protocol, observers)
//! - Session-dependent resource pipelines with safe fallbacks
//! - An HTTP client for the progress backend
//! - Chart aggregation and deterministic per-user colors
//! - Configuration, preferences, and logging infrastructure
//!
//! ## Architecture
//!
//! Everything downstream flows from the session:
//! - **AuthProvider** (external capability): performs the OIDC handshake
//! - **SessionStore**: the single authoritative session snapshot; every
//!   merge is published, in order, to all observers
//! - **DependentResource**: data pipelines gated on an authenticated
//!   snapshot with a usable token, degrading to declared defaults
//! - **analytics**: pure computations over fetched progress data
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use solvetrack_core::api::{ApiClient, IntervalQuery, ProgressClient};
//! use solvetrack_core::{Config, SessionStore, StaticTokenProvider};
//!
//! # async fn run() -> solvetrack_core::Result<()> {
//! let config = Config::load()?;
//! let provider = Arc::new(StaticTokenProvider::anonymous());
//! let session = SessionStore::new(provider);
//! session.initialize();
//!
//! let api = Arc::new(ApiClient::new(config.api.clone())?);
//! let progress = ProgressClient::new(api, session.clone());
//! let series = progress.series_or_empty(&IntervalQuery::default()).await;
//! println!("{} points", series.points.len());
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use auth::{
    AuthCheck, AuthProvider, SessionEvents, SessionPhase, SessionSnapshot, SessionStore,
    StaticTokenProvider,
};
pub use config::Config;
pub use error::{Error, Result};
pub use resource::{DependentResource, FetchPolicy, ResourceFetcher, ResourceWriter};
pub use types::*;

// Public modules
pub mod analytics;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod prefs;
pub mod resource;
pub mod types;

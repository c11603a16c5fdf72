//! Progress data retrieval with session-aware endpoint dispatch

use std::sync::Arc;

use crate::api::client::{ApiClient, IntervalQuery};
use crate::auth::SessionStore;
use crate::error::Result;
use crate::types::{LatestResponse, ProgressSeries};

/// Progress reads that work with or without an authenticated session.
///
/// Progress data is an anonymous-session resource: it never waits on the
/// authentication filter. When the session does hold a usable token, the
/// authenticated endpoint variant runs instead and the backend restricts
/// the result to followed users. Which variant runs is re-evaluated from
/// [`SessionStore::current`] on every request, never cached.
pub struct ProgressClient {
    api: Arc<ApiClient>,
    session: SessionStore,
}

impl ProgressClient {
    pub fn new(api: Arc<ApiClient>, session: SessionStore) -> Self {
        Self { api, session }
    }

    /// Latest solve counts for every tracked user.
    pub async fn latest(&self) -> Result<LatestResponse> {
        self.api.latest().await
    }

    /// Interval-bucketed progress as an ordered series.
    pub async fn series(&self, query: &IntervalQuery) -> Result<ProgressSeries> {
        let snapshot = self.session.current();
        let token = if snapshot.has_usable_token() {
            Some(snapshot.access_token.as_str())
        } else {
            None
        };
        let response = self.api.latest_interval(query, token).await?;
        response.into_series()
    }

    /// Like [`ProgressClient::series`], but degrades to an empty series on
    /// any failure. Chart rendering surfaces an empty chart, never an
    /// error.
    pub async fn series_or_empty(&self, query: &IntervalQuery) -> ProgressSeries {
        match self.series(query).await {
            Ok(series) => series,
            Err(e) => {
                tracing::warn!(error = %e, "progress fetch failed, using empty series");
                ProgressSeries::default()
            }
        }
    }
}

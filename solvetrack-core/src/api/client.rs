//! HTTP client for the progress backend REST API

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::types::{
    Announcement, AnnouncementsResponse, FollowingEnvelope, IntervalResponse, LatestResponse,
    UserListResponse, UserSettings, UserSummary,
};

/// Query parameters of the interval progress endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalQuery {
    /// Interval width in hours (1..=24)
    pub hours: u32,
    /// Number of intervals to look back
    pub limit: u32,
    /// Timezone name used by the backend for interval alignment
    pub timezone: String,
}

impl Default for IntervalQuery {
    fn default() -> Self {
        Self {
            hours: 1,
            limit: 24,
            timezone: "UTC".to_string(),
        }
    }
}

impl IntervalQuery {
    /// Hourly buckets over the last day.
    pub fn hourly(timezone: impl Into<String>) -> Self {
        Self {
            timezone: timezone.into(),
            ..Default::default()
        }
    }

    /// Daily buckets over the last `limit` days.
    pub fn daily(limit: u32, timezone: impl Into<String>) -> Self {
        Self {
            hours: 24,
            limit,
            timezone: timezone.into(),
        }
    }
}

/// Build the path-and-query of an interval request.
///
/// The authenticated variant lives under `/auth` and restricts the result
/// to users the caller follows.
fn interval_path(query: &IntervalQuery, authenticated: bool) -> String {
    let prefix = if authenticated { "/auth" } else { "" };
    format!(
        "{}/progress/latest/interval?hours={}&limit={}&timezone={}",
        prefix,
        query.hours,
        query.limit,
        urlencoding::encode(&query.timezone)
    )
}

/// HTTP client for the progress backend
pub struct ApiClient {
    config: ApiConfig,
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new client from configuration.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: ApiConfig) -> Result<Self> {
        config.validate()?;

        let base_url = config.base_url.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http,
            base_url,
        })
    }

    // ============================================
    // Anonymous endpoints
    // ============================================

    /// Latest solve counts for every tracked user.
    pub async fn latest(&self) -> Result<LatestResponse> {
        self.get_json("/progress/latest", None).await
    }

    /// Interval-bucketed progress; bearer-authenticated requests are
    /// restricted to followed users by the backend.
    pub async fn latest_interval(
        &self,
        query: &IntervalQuery,
        token: Option<&str>,
    ) -> Result<IntervalResponse> {
        let path = interval_path(query, token.is_some());
        self.get_json(&path, token).await
    }

    /// Current site announcements.
    pub async fn announcements(&self) -> Result<Vec<Announcement>> {
        let response: AnnouncementsResponse = self.get_json("/announcements", None).await?;
        Ok(response.announcements)
    }

    // ============================================
    // Authenticated endpoints
    // ============================================

    /// The caller's profile settings.
    pub async fn user_settings(&self, token: &str) -> Result<UserSettings> {
        self.get_json("/user/settings", Some(token)).await
    }

    /// Replace the caller's profile settings, returning the stored value.
    pub async fn update_user_settings(
        &self,
        token: &str,
        settings: &UserSettings,
    ) -> Result<UserSettings> {
        self.put_json("/user/settings", token, settings).await
    }

    /// The user directory (for following management).
    pub async fn user_list(&self, token: &str) -> Result<Vec<UserSummary>> {
        let response: UserListResponse = self.get_json("/user/list", Some(token)).await?;
        Ok(response.users)
    }

    /// Usernames the caller follows.
    pub async fn following_list(&self, token: &str) -> Result<Vec<String>> {
        let response: FollowingEnvelope = self.get_json("/user/following", Some(token)).await?;
        Ok(response.following)
    }

    /// Replace the caller's following list, returning the stored value.
    pub async fn update_following_list(
        &self,
        token: &str,
        following: &[String],
    ) -> Result<Vec<String>> {
        let body = FollowingEnvelope {
            following: following.to_vec(),
        };
        let response: FollowingEnvelope = self.put_json("/user/following", token, &body).await?;
        Ok(response.following)
    }

    // ============================================
    // Request plumbing
    // ============================================

    /// GET with retry for transient failures (transport errors, 5xx),
    /// exponential backoff capped at 30s.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path_and_query: &str,
        token: Option<&str>,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path_and_query);

        let mut last_error = None;
        let mut delay = Duration::from_millis(500);

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::debug!(
                    attempt,
                    max = self.config.max_retries,
                    "retrying API request after {:?}",
                    delay
                );
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, Duration::from_secs(30));
            }

            match self.try_get(&url, token).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    tracing::warn!(url = %url, error = %e, "transient API failure");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Http("max retries exceeded".to_string())))
    }

    async fn try_get<T: DeserializeOwned>(&self, url: &str, token: Option<&str>) -> Result<T> {
        let mut request = self.http.get(url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| Error::Http(format!("request failed: {}", e)))?;
        Self::decode(response).await
    }

    /// PUT with a JSON body, single attempt; writes are not retried.
    async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .put(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Http(format!("request failed: {}", e)))?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| Error::Decode(format!("failed to parse response: {}", e)))
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_requires_valid_config() {
        let config = ApiConfig::default();
        assert!(ApiClient::new(config).is_err());
    }

    #[test]
    fn test_client_with_valid_config() {
        let config = ApiConfig {
            base_url: "https://api.example.com/Prod/".to_string(),
            ..Default::default()
        };
        let client = ApiClient::new(config).unwrap();
        assert_eq!(client.base_url, "https://api.example.com/Prod");
    }

    #[test]
    fn test_interval_path_anonymous() {
        let query = IntervalQuery::default();
        assert_eq!(
            interval_path(&query, false),
            "/progress/latest/interval?hours=1&limit=24&timezone=UTC"
        );
    }

    #[test]
    fn test_interval_path_authenticated_encodes_timezone() {
        let query = IntervalQuery::daily(7, "Asia/Taipei");
        assert_eq!(
            interval_path(&query, true),
            "/auth/progress/latest/interval?hours=24&limit=7&timezone=Asia%2FTaipei"
        );
    }
}

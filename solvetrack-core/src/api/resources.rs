//! Fetcher and writer adapters binding the API to resource pipelines

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::client::ApiClient;
use crate::auth::SessionSnapshot;
use crate::error::Result;
use crate::resource::{ResourceFetcher, ResourceWriter};
use crate::types::{UserSettings, UserSummary};

/// Loads the authenticated user's settings.
pub struct SettingsFetcher {
    pub api: Arc<ApiClient>,
}

#[async_trait]
impl ResourceFetcher<UserSettings> for SettingsFetcher {
    async fn fetch(&self, session: &SessionSnapshot) -> Result<UserSettings> {
        self.api.user_settings(&session.access_token).await
    }
}

/// Pushes updated settings, returning the stored value.
pub struct SettingsWriter {
    pub api: Arc<ApiClient>,
}

#[async_trait]
impl ResourceWriter<UserSettings> for SettingsWriter {
    async fn write(&self, session: &SessionSnapshot, value: &UserSettings) -> Result<UserSettings> {
        self.api
            .update_user_settings(&session.access_token, value)
            .await
    }
}

/// Loads the authenticated user's following list.
pub struct FollowingFetcher {
    pub api: Arc<ApiClient>,
}

#[async_trait]
impl ResourceFetcher<Vec<String>> for FollowingFetcher {
    async fn fetch(&self, session: &SessionSnapshot) -> Result<Vec<String>> {
        self.api.following_list(&session.access_token).await
    }
}

/// Replaces the following list, returning the stored value.
pub struct FollowingWriter {
    pub api: Arc<ApiClient>,
}

#[async_trait]
impl ResourceWriter<Vec<String>> for FollowingWriter {
    async fn write(&self, session: &SessionSnapshot, value: &Vec<String>) -> Result<Vec<String>> {
        self.api
            .update_following_list(&session.access_token, value)
            .await
    }
}

/// Loads the user directory, sorted by preferred username for display.
pub struct UserListFetcher {
    pub api: Arc<ApiClient>,
}

#[async_trait]
impl ResourceFetcher<Vec<UserSummary>> for UserListFetcher {
    async fn fetch(&self, session: &SessionSnapshot) -> Result<Vec<UserSummary>> {
        let mut users = self.api.user_list(&session.access_token).await?;
        users.sort_by(|a, b| {
            a.preferred_username
                .to_lowercase()
                .cmp(&b.preferred_username.to_lowercase())
        });
        Ok(users)
    }
}

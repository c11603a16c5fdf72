//! HTTP client for the progress backend
//!
//! [`ApiClient`] wraps the backend's REST surface: anonymous progress and
//! announcement reads, and bearer-authenticated settings, directory, and
//! following-list operations. [`ProgressClient`] layers the
//! anonymous-versus-authenticated dispatch for progress data on top, and
//! [`resources`] provides the fetcher/writer adapters that plug the API
//! into [`DependentResource`](crate::resource::DependentResource)
//! pipelines.

pub mod client;
pub mod progress;
pub mod resources;

pub use client::{ApiClient, IntervalQuery};
pub use progress::ProgressClient;
pub use resources::{
    FollowingFetcher, FollowingWriter, SettingsFetcher, SettingsWriter, UserListFetcher,
};

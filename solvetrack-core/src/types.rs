//! Core domain types for solvetrack
//!
//! These types mirror the backend wire format (snake_case JSON) and the
//! client-side shapes built from it.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **ProblemStats** | Per-user solve counts split by difficulty |
//! | **ProgressSeries** | Sparse per-user time series of ProblemStats |
//! | **Gap** | A user absent at a timestamp; "no data", distinct from zero |
//! | **UserSettings** | The authenticated user's profile settings |
//! | **Following list** | Usernames whose progress the user tracks |

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================
// Progress data
// ============================================

/// Solve counts for one user at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemStats {
    #[serde(default)]
    pub easy: i64,
    #[serde(default)]
    pub medium: i64,
    #[serde(default)]
    pub hard: i64,
    #[serde(default)]
    pub total: i64,
}

/// One sample of the progress time series.
///
/// A username missing from `per_user` means the backend had no data for
/// that user at this timestamp. That is a gap, not a zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeriesPoint {
    /// Epoch seconds, aligned to the interval start by the backend
    pub timestamp: i64,
    /// Stats per username at this timestamp
    pub per_user: HashMap<String, ProblemStats>,
}

/// An ordered progress time series plus the set of usernames observed
/// anywhere in it.
///
/// Invariant: `points` is sorted by strictly increasing timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressSeries {
    pub points: Vec<TimeSeriesPoint>,
    pub usernames: BTreeSet<String>,
}

impl ProgressSeries {
    /// Build a series from unordered points, sorting by timestamp and
    /// collecting the username set.
    pub fn from_points(mut points: Vec<TimeSeriesPoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        let usernames = points
            .iter()
            .flat_map(|p| p.per_user.keys().cloned())
            .collect();
        Self { points, usernames }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

// ============================================
// User settings and directory
// ============================================

/// Profile settings of the authenticated user.
///
/// `Default` is the single canonical "empty settings" value; call sites
/// needing a placeholder reference it instead of building literals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub preferred_username: String,
    #[serde(default)]
    pub leetcode_username: String,
}

/// One entry of the user directory (used for following management).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub username: String,
    #[serde(default)]
    pub preferred_username: String,
    #[serde(default)]
    pub leetcode_username: String,
}

// ============================================
// Announcements
// ============================================

/// A site announcement shown to users once per publication date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub title: String,
    pub content: String,
    /// Publication date as `YYYY-MM-DD`
    pub date: String,
}

// ============================================
// Wire envelopes
// ============================================

/// Latest solve counts for one user, as served by `/progress/latest`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestEntry {
    /// When the counts were last scraped (epoch seconds)
    #[serde(default)]
    pub timestamp: i64,
    #[serde(flatten)]
    pub stats: ProblemStats,
}

/// Response of `GET /progress/latest`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LatestResponse {
    #[serde(default)]
    pub data: BTreeMap<String, LatestEntry>,
    #[serde(default)]
    pub usernames: Vec<String>,
}

/// Response of `GET /progress/latest/interval` (and its `/auth` variant).
///
/// The backend keys `data` by stringified epoch seconds; use
/// [`IntervalResponse::into_series`] for a numerically ordered series.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntervalResponse {
    #[serde(default)]
    pub data: BTreeMap<String, HashMap<String, ProblemStats>>,
    #[serde(default)]
    pub usernames: Vec<String>,
}

impl IntervalResponse {
    /// Convert the wire envelope into an ordered [`ProgressSeries`].
    ///
    /// String timestamp keys are parsed to integers; lexicographic map
    /// order is not trusted, the points are re-sorted numerically.
    pub fn into_series(self) -> Result<ProgressSeries> {
        let mut points = Vec::with_capacity(self.data.len());
        for (key, per_user) in self.data {
            let timestamp = parse_epoch_key(&key)?;
            points.push(TimeSeriesPoint {
                timestamp,
                per_user,
            });
        }
        Ok(ProgressSeries::from_points(points))
    }
}

/// Parse a stringified epoch-seconds map key.
///
/// The backend occasionally emits fractional timestamps (`datetime.timestamp()`
/// is a float in the source system); the fractional part is truncated.
fn parse_epoch_key(key: &str) -> Result<i64> {
    let whole = key.split('.').next().unwrap_or(key);
    whole
        .parse::<i64>()
        .map_err(|_| Error::Decode(format!("invalid timestamp key: {key:?}")))
}

/// Response of `GET /announcements`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnouncementsResponse {
    #[serde(default)]
    pub announcements: Vec<Announcement>,
}

/// Response of `GET /user/list`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListResponse {
    #[serde(default)]
    pub users: Vec<UserSummary>,
}

/// Response and request body of the `/user/following` endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FollowingEnvelope {
    #[serde(default)]
    pub following: Vec<String>,
}

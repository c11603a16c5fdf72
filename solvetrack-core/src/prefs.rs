//! Persisted UI preferences
//!
//! A plain string key/value file (`preferences.toml` in the XDG state
//! directory) holding the chart selections and the announcement
//! bookkeeping timestamps. A missing key means "use the default", never an
//! error; every change is written back immediately.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::analytics::{ChartDifficulty, ChartInterval, ChartMode};
use crate::config::Config;
use crate::error::{Error, Result};

const KEY_CHART_INTERVAL: &str = "chart-interval";
const KEY_CHART_MODE: &str = "chart-mode";
const KEY_CHART_DIFFICULTY: &str = "chart-difficulty";
const KEY_ANNOUNCEMENTS_FETCHED: &str = "announcements-last-fetched";
const KEY_ANNOUNCEMENTS_SHOWN: &str = "announcements-last-shown";

/// Announcements are refreshed at most once per day.
const ANNOUNCEMENT_FETCH_INTERVAL_SECS: i64 = 24 * 60 * 60;

/// Persisted key/value preferences.
#[derive(Debug)]
pub struct Preferences {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl Preferences {
    /// Load preferences from `path`.
    ///
    /// A missing file yields empty preferences; an unreadable or corrupt
    /// file is logged and treated the same way rather than failing
    /// startup.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<BTreeMap<String, String>>(&content) {
                Ok(values) => values,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "corrupt preferences file, starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read preferences, starting empty");
                BTreeMap::new()
            }
        };
        Self { path, values }
    }

    /// Load preferences from the default XDG path.
    pub fn load_default() -> Self {
        Self::load(Config::preferences_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ============================================
    // Chart selections
    // ============================================

    pub fn chart_interval(&self) -> ChartInterval {
        self.chart_interval_or(ChartInterval::default())
    }

    /// Stored interval, or `fallback` when unset/unparseable.
    pub fn chart_interval_or(&self, fallback: ChartInterval) -> ChartInterval {
        self.parsed(KEY_CHART_INTERVAL).unwrap_or(fallback)
    }

    pub fn set_chart_interval(&mut self, interval: ChartInterval) -> Result<()> {
        self.put(KEY_CHART_INTERVAL, interval.as_str())
    }

    pub fn chart_mode(&self) -> ChartMode {
        self.chart_mode_or(ChartMode::default())
    }

    /// Stored mode, or `fallback` when unset/unparseable.
    pub fn chart_mode_or(&self, fallback: ChartMode) -> ChartMode {
        self.parsed(KEY_CHART_MODE).unwrap_or(fallback)
    }

    pub fn set_chart_mode(&mut self, mode: ChartMode) -> Result<()> {
        self.put(KEY_CHART_MODE, mode.as_str())
    }

    pub fn chart_difficulty(&self) -> ChartDifficulty {
        self.chart_difficulty_or(ChartDifficulty::default())
    }

    /// Stored difficulty, or `fallback` when unset/unparseable.
    pub fn chart_difficulty_or(&self, fallback: ChartDifficulty) -> ChartDifficulty {
        self.parsed(KEY_CHART_DIFFICULTY).unwrap_or(fallback)
    }

    pub fn set_chart_difficulty(&mut self, difficulty: ChartDifficulty) -> Result<()> {
        self.put(KEY_CHART_DIFFICULTY, difficulty.as_str())
    }

    // ============================================
    // Announcement bookkeeping
    // ============================================

    /// Whether announcements are due for a refresh at `now` (epoch secs).
    pub fn should_fetch_announcements(&self, now: i64) -> bool {
        match self.epoch(KEY_ANNOUNCEMENTS_FETCHED) {
            Some(last) => now - last >= ANNOUNCEMENT_FETCH_INTERVAL_SECS,
            None => true,
        }
    }

    pub fn mark_announcements_fetched(&mut self, now: i64) -> Result<()> {
        self.put(KEY_ANNOUNCEMENTS_FETCHED, &now.to_string())
    }

    /// When the announcement modal was last shown, if ever.
    pub fn announcements_last_shown(&self) -> Option<i64> {
        self.epoch(KEY_ANNOUNCEMENTS_SHOWN)
    }

    pub fn mark_announcements_shown(&mut self, now: i64) -> Result<()> {
        self.put(KEY_ANNOUNCEMENTS_SHOWN, &now.to_string())
    }

    // ============================================
    // Raw access
    // ============================================

    fn parsed<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.values.get(key).and_then(|raw| raw.parse().ok())
    }

    fn epoch(&self, key: &str) -> Option<i64> {
        self.values.get(key).and_then(|raw| raw.parse().ok())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string(&self.values)
            .map_err(|e| Error::Config(format!("failed to serialize preferences: {}", e)))?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn prefs_in(dir: &TempDir) -> Preferences {
        Preferences::load(dir.path().join("preferences.toml"))
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let prefs = prefs_in(&dir);

        assert_eq!(prefs.chart_interval(), ChartInterval::Day);
        assert_eq!(prefs.chart_mode(), ChartMode::Delta);
        assert_eq!(prefs.chart_difficulty(), ChartDifficulty::Total);
        assert!(prefs.announcements_last_shown().is_none());
    }

    #[test]
    fn test_changes_survive_reload() {
        let dir = TempDir::new().unwrap();
        let mut prefs = prefs_in(&dir);

        prefs.set_chart_interval(ChartInterval::Hour).unwrap();
        prefs
            .set_chart_difficulty(ChartDifficulty::MedHard)
            .unwrap();

        let reloaded = prefs_in(&dir);
        assert_eq!(reloaded.chart_interval(), ChartInterval::Hour);
        assert_eq!(reloaded.chart_difficulty(), ChartDifficulty::MedHard);
        // Untouched key still defaults.
        assert_eq!(reloaded.chart_mode(), ChartMode::Delta);
    }

    #[test]
    fn test_corrupt_file_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.toml");
        std::fs::write(&path, "not [ valid toml").unwrap();

        let prefs = Preferences::load(&path);
        assert_eq!(prefs.chart_interval(), ChartInterval::Day);
    }

    #[test]
    fn test_unknown_value_falls_back_to_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.toml");
        std::fs::write(&path, "chart-interval = \"fortnight\"\n").unwrap();

        let prefs = Preferences::load(&path);
        assert_eq!(prefs.chart_interval(), ChartInterval::Day);
    }

    #[test]
    fn test_explicit_fallback_when_key_missing() {
        let dir = TempDir::new().unwrap();
        let prefs = prefs_in(&dir);
        assert_eq!(
            prefs.chart_interval_or(ChartInterval::Hour),
            ChartInterval::Hour
        );

        let mut prefs = prefs;
        prefs.set_chart_interval(ChartInterval::Day).unwrap();
        // A stored value wins over the fallback.
        assert_eq!(
            prefs.chart_interval_or(ChartInterval::Hour),
            ChartInterval::Day
        );
    }

    #[test]
    fn test_announcement_fetch_gate() {
        let dir = TempDir::new().unwrap();
        let mut prefs = prefs_in(&dir);

        let now = 1_700_000_000;
        assert!(prefs.should_fetch_announcements(now));

        prefs.mark_announcements_fetched(now).unwrap();
        assert!(!prefs.should_fetch_announcements(now + 60));
        assert!(prefs.should_fetch_announcements(now + ANNOUNCEMENT_FETCH_INTERVAL_SECS));
    }

    #[test]
    fn test_unrelated_keys_are_preserved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.toml");
        std::fs::write(&path, "future-key = \"kept\"\n").unwrap();

        let mut prefs = Preferences::load(&path);
        prefs.set_chart_mode(ChartMode::Total).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("future-key"));
        assert!(content.contains("chart-mode"));
    }
}

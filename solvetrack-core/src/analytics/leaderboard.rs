//! Sortable leaderboard over the latest solve counts

use std::str::FromStr;

use crate::types::{LatestResponse, ProblemStats};

/// Column a leaderboard is sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    Username,
    Easy,
    Medium,
    Hard,
    #[default]
    Total,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Username => "username",
            SortKey::Easy => "easy",
            SortKey::Medium => "medium",
            SortKey::Hard => "hard",
            SortKey::Total => "total",
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "username" => Ok(SortKey::Username),
            "easy" => Ok(SortKey::Easy),
            "medium" => Ok(SortKey::Medium),
            "hard" => Ok(SortKey::Hard),
            "total" => Ok(SortKey::Total),
            _ => Err(format!("unknown sort key: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    fn flip(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub username: String,
    pub stats: ProblemStats,
}

/// Latest solve counts, sorted for display.
///
/// Defaults to total count descending. Re-selecting the current sort key
/// toggles the direction; selecting a new key resets to descending.
#[derive(Debug, Clone, Default)]
pub struct Leaderboard {
    rows: Vec<LeaderboardRow>,
    sort_key: SortKey,
    direction: SortDirection,
}

impl Leaderboard {
    pub fn from_latest(response: &LatestResponse) -> Self {
        let rows = response
            .data
            .iter()
            .map(|(username, entry)| LeaderboardRow {
                username: username.clone(),
                stats: entry.stats,
            })
            .collect();
        let mut board = Self {
            rows,
            sort_key: SortKey::default(),
            direction: SortDirection::default(),
        };
        board.resort();
        board
    }

    pub fn rows(&self) -> &[LeaderboardRow] {
        &self.rows
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Sort by `key`, toggling direction when the key is unchanged.
    pub fn sort_by(&mut self, key: SortKey) {
        if self.sort_key == key {
            self.direction = self.direction.flip();
        } else {
            self.sort_key = key;
            self.direction = SortDirection::Descending;
        }
        self.resort();
    }

    /// Sort by an explicit key and direction.
    pub fn sort(&mut self, key: SortKey, direction: SortDirection) {
        self.sort_key = key;
        self.direction = direction;
        self.resort();
    }

    fn resort(&mut self) {
        let key = self.sort_key;
        let direction = self.direction;
        self.rows.sort_by(|a, b| {
            let ordering = match key {
                SortKey::Username => a
                    .username
                    .to_lowercase()
                    .cmp(&b.username.to_lowercase()),
                SortKey::Easy => a.stats.easy.cmp(&b.stats.easy),
                SortKey::Medium => a.stats.medium.cmp(&b.stats.medium),
                SortKey::Hard => a.stats.hard.cmp(&b.stats.hard),
                SortKey::Total => a.stats.total.cmp(&b.stats.total),
            };
            match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LatestEntry;
    use std::collections::BTreeMap;

    fn latest(entries: &[(&str, i64, i64)]) -> LatestResponse {
        let data: BTreeMap<String, LatestEntry> = entries
            .iter()
            .map(|(name, easy, total)| {
                (
                    name.to_string(),
                    LatestEntry {
                        timestamp: 0,
                        stats: ProblemStats {
                            easy: *easy,
                            total: *total,
                            ..Default::default()
                        },
                    },
                )
            })
            .collect();
        LatestResponse {
            usernames: data.keys().cloned().collect(),
            data,
        }
    }

    #[test]
    fn test_defaults_to_total_descending() {
        let board = Leaderboard::from_latest(&latest(&[("a", 1, 10), ("b", 2, 30), ("c", 3, 20)]));
        let order: Vec<&str> = board.rows().iter().map(|r| r.username.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_reselecting_key_toggles_direction() {
        let mut board =
            Leaderboard::from_latest(&latest(&[("a", 1, 10), ("b", 2, 30), ("c", 3, 20)]));
        board.sort_by(SortKey::Total);
        assert_eq!(board.direction(), SortDirection::Ascending);
        let order: Vec<&str> = board.rows().iter().map(|r| r.username.as_str()).collect();
        assert_eq!(order, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_new_key_resets_to_descending() {
        let mut board =
            Leaderboard::from_latest(&latest(&[("a", 5, 10), ("b", 2, 30), ("c", 3, 20)]));
        board.sort_by(SortKey::Total);
        board.sort_by(SortKey::Easy);
        assert_eq!(board.direction(), SortDirection::Descending);
        let order: Vec<&str> = board.rows().iter().map(|r| r.username.as_str()).collect();
        assert_eq!(order, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_username_sort_is_case_insensitive() {
        let mut board =
            Leaderboard::from_latest(&latest(&[("Bravo", 0, 0), ("alpha", 0, 0), ("Charlie", 0, 0)]));
        board.sort(SortKey::Username, SortDirection::Ascending);
        let order: Vec<&str> = board.rows().iter().map(|r| r.username.as_str()).collect();
        assert_eq!(order, vec!["alpha", "Bravo", "Charlie"]);
    }
}

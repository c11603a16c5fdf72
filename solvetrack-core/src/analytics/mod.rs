//! Analytics module for solvetrack
//!
//! Pure computations that turn fetched progress data into display-ready
//! shapes:
//! - Chart aggregation (cumulative and period-over-period series)
//! - Deterministic per-user colors
//! - Sortable leaderboard rows

pub mod chart;
pub mod color;
pub mod leaderboard;

pub use chart::{aggregate, ChartDifficulty, ChartInterval, ChartMode, ChartSeries};
pub use color::{hash_color, HslColor};
pub use leaderboard::{Leaderboard, LeaderboardRow, SortDirection, SortKey};

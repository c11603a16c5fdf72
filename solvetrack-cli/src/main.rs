//! solvetrack - coding practice progress from the terminal
//!
//! Thin command line client over solvetrack-core: latest leaderboard,
//! aggregated chart series, and announcements. Uses XDG Base Directory
//! locations for configuration, preferences, and logs:
//! - Config: $XDG_CONFIG_HOME/solvetrack/config.toml
//! - Preferences: $XDG_STATE_HOME/solvetrack/preferences.toml
//! - Logs: $XDG_STATE_HOME/solvetrack/solvetrack.log

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{FixedOffset, Local, Utc};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use solvetrack_core::analytics::{
    aggregate, hash_color, ChartDifficulty, ChartInterval, ChartMode, Leaderboard, SortDirection,
    SortKey,
};
use solvetrack_core::api::{
    ApiClient, FollowingFetcher, FollowingWriter, IntervalQuery, ProgressClient, SettingsFetcher,
    SettingsWriter, UserListFetcher,
};
use solvetrack_core::prefs::Preferences;
use solvetrack_core::{
    Config, DependentResource, ResourceFetcher, SessionStore, StaticTokenProvider, UserSettings,
};

#[derive(Parser)]
#[command(name = "solvetrack")]
#[command(about = "Coding practice progress tracker")]
#[command(version)]
struct Args {
    /// Override the backend base URL from config
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the latest solve counts per user
    Latest {
        /// Sort column (username, easy, medium, hard, total)
        #[arg(long, default_value = "total")]
        sort: String,

        /// Sort ascending instead of descending
        #[arg(long)]
        ascending: bool,
    },
    /// Show the aggregated progress series
    Chart {
        /// Bucket width: "hour" or "day" (persisted as preference)
        #[arg(long)]
        interval: Option<String>,

        /// "total" or "delta" (persisted as preference)
        #[arg(long)]
        mode: Option<String>,

        /// "easy", "medium", "hard", "med_hard" or "total" (persisted as preference)
        #[arg(long)]
        difficulty: Option<String>,

        /// Number of intervals to look back
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show current announcements
    Announcements {
        /// Fetch even if already checked today
        #[arg(long)]
        force: bool,
    },
    /// Show or update your profile settings (requires a configured token)
    Settings {
        /// Set a new LeetCode username
        #[arg(long)]
        leetcode_username: Option<String>,

        /// Set a new preferred display name
        #[arg(long)]
        preferred_username: Option<String>,
    },
    /// Show the user directory or update your following list
    Following {
        /// Follow a user
        #[arg(long)]
        add: Option<String>,

        /// Unfollow a user
        #[arg(long)]
        remove: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Ensure XDG environment variables are set before using core library
    Config::ensure_xdg_env();

    let mut config = Config::load().context("failed to load configuration")?;
    let _log_guard = solvetrack_core::logging::init(&config.logging).ok();

    if let Some(api_url) = args.api_url {
        config.api.base_url = api_url;
    }

    tracing::info!("solvetrack starting");

    let api =
        Arc::new(ApiClient::new(config.api.clone()).context("failed to create API client")?);

    // Headless session: authenticated exactly while a bearer token is
    // configured. The interactive OIDC flow lives outside this binary.
    let provider = match config.auth.static_token() {
        Some(token) => {
            let provider = StaticTokenProvider::new(token);
            match &config.auth.username {
                Some(username) => provider.with_username(username.clone()),
                None => provider,
            }
        }
        None => StaticTokenProvider::anonymous(),
    };
    let session = SessionStore::new(Arc::new(provider));
    session.initialize();
    wait_for_session(&session).await;

    match args.command {
        Command::Latest { sort, ascending } => latest(&api, &sort, ascending).await,
        Command::Chart {
            interval,
            mode,
            difficulty,
            limit,
        } => chart(&api, &session, &config, interval, mode, difficulty, limit).await,
        Command::Announcements { force } => announcements(&api, force).await,
        Command::Settings {
            leetcode_username,
            preferred_username,
        } => settings(&api, &session, leetcode_username, preferred_username).await,
        Command::Following { add, remove } => following(&api, &session, add, remove).await,
    }
}

/// Wait until the initial authentication check has settled, including the
/// token merge when the session is authenticated.
async fn wait_for_session(session: &SessionStore) {
    let mut events = session.observe();
    let settled = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(snapshot) = events.next().await {
            if !snapshot.is_loading
                && (!snapshot.is_authenticated || !snapshot.access_token.is_empty())
            {
                break;
            }
        }
    })
    .await;

    if settled.is_err() {
        tracing::warn!("session did not settle in time, continuing anonymously");
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

async fn latest(api: &ApiClient, sort: &str, ascending: bool) -> Result<()> {
    let key = SortKey::from_str(sort).map_err(|e| anyhow::anyhow!(e))?;
    let direction = if ascending {
        SortDirection::Ascending
    } else {
        SortDirection::Descending
    };

    let pb = spinner("Fetching latest progress...");
    let response = api.latest().await.context("failed to fetch latest progress")?;
    pb.finish_and_clear();

    let mut board = Leaderboard::from_latest(&response);
    board.sort(key, direction);

    if board.rows().is_empty() {
        println!("No progress data.");
        return Ok(());
    }

    println!(
        "{:<24} {:>6} {:>8} {:>6} {:>7}",
        "USERNAME", "EASY", "MEDIUM", "HARD", "TOTAL"
    );
    for row in board.rows() {
        println!(
            "{:<24} {:>6} {:>8} {:>6} {:>7}",
            row.username, row.stats.easy, row.stats.medium, row.stats.hard, row.stats.total
        );
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn chart(
    api: &Arc<ApiClient>,
    session: &SessionStore,
    config: &Config,
    interval: Option<String>,
    mode: Option<String>,
    difficulty: Option<String>,
    limit: Option<u32>,
) -> Result<()> {
    let mut prefs = Preferences::load(Config::preferences_path());

    // Flags override preferences and are persisted as the new selection.
    let interval = match interval {
        Some(raw) => {
            let parsed = ChartInterval::from_str(&raw).map_err(|e| anyhow::anyhow!(e))?;
            if let Err(e) = prefs.set_chart_interval(parsed) {
                tracing::warn!(error = %e, "failed to persist chart interval");
            }
            parsed
        }
        None => prefs.chart_interval_or(config.chart.interval()),
    };
    let mode = match mode {
        Some(raw) => {
            let parsed = ChartMode::from_str(&raw).map_err(|e| anyhow::anyhow!(e))?;
            if let Err(e) = prefs.set_chart_mode(parsed) {
                tracing::warn!(error = %e, "failed to persist chart mode");
            }
            parsed
        }
        None => prefs.chart_mode_or(config.chart.mode()),
    };
    let difficulty = match difficulty {
        Some(raw) => {
            let parsed = ChartDifficulty::from_str(&raw).map_err(|e| anyhow::anyhow!(e))?;
            if let Err(e) = prefs.set_chart_difficulty(parsed) {
                tracing::warn!(error = %e, "failed to persist chart difficulty");
            }
            parsed
        }
        None => prefs.chart_difficulty_or(config.chart.difficulty()),
    };

    let query = IntervalQuery {
        hours: interval.hours(),
        limit: limit.unwrap_or(config.chart.limit),
        timezone: config.chart.timezone.clone(),
    };

    let progress = ProgressClient::new(api.clone(), session.clone());
    let pb = spinner("Fetching progress series...");
    let series = progress.series_or_empty(&query).await;
    pb.finish_and_clear();

    let chart = aggregate(&series, interval, mode, difficulty, label_offset(config));

    if chart.is_empty() {
        println!("No chart data.");
        return Ok(());
    }

    println!(
        "{} / {} ({} buckets)",
        mode.as_str(),
        difficulty.as_str(),
        interval.as_str()
    );
    println!();

    let name_width = chart
        .datasets
        .keys()
        .map(|u| u.chars().count())
        .max()
        .unwrap_or(8)
        .max(8);

    print!("{:<name_width$} ", "");
    for label in &chart.labels {
        print!(" {:>6}", label);
    }
    println!();

    for (username, data) in &chart.datasets {
        print!("{:<name_width$} ", username);
        for value in data {
            match value {
                Some(v) => print!(" {:>6}", v),
                None => print!(" {:>6}", "-"),
            }
        }
        println!("   {}", hash_color(username).css());
    }

    Ok(())
}

/// Offset used for axis labels: configured minutes, else the local zone.
fn label_offset(config: &Config) -> FixedOffset {
    if config.chart.utc_offset_minutes != 0 {
        FixedOffset::east_opt(config.chart.utc_offset_minutes * 60)
            .unwrap_or_else(|| *Local::now().offset())
    } else {
        *Local::now().offset()
    }
}

async fn announcements(api: &ApiClient, force: bool) -> Result<()> {
    let mut prefs = Preferences::load(Config::preferences_path());
    let now = Utc::now().timestamp();

    if !force && !prefs.should_fetch_announcements(now) {
        println!("Announcements already checked today (use --force to refetch).");
        return Ok(());
    }

    let pb = spinner("Fetching announcements...");
    let announcements = api
        .announcements()
        .await
        .context("failed to fetch announcements")?;
    pb.finish_and_clear();

    if let Err(e) = prefs.mark_announcements_fetched(now) {
        tracing::warn!(error = %e, "failed to persist announcement bookkeeping");
    }

    if announcements.is_empty() {
        println!("No announcements.");
        return Ok(());
    }

    for announcement in &announcements {
        println!("== {} ({})", announcement.title, announcement.date);
        println!("{}", announcement.content);
        println!();
    }

    if let Err(e) = prefs.mark_announcements_shown(now) {
        tracing::warn!(error = %e, "failed to persist announcement bookkeeping");
    }

    Ok(())
}

async fn settings(
    api: &Arc<ApiClient>,
    session: &SessionStore,
    leetcode_username: Option<String>,
    preferred_username: Option<String>,
) -> Result<()> {
    let snapshot = session.current();
    if !snapshot.has_usable_token() {
        anyhow::bail!("not signed in: configure auth.access_token in config.toml");
    }

    let fetcher = SettingsFetcher { api: api.clone() };
    let pb = spinner("Loading settings...");
    let current = fetcher
        .fetch(&snapshot)
        .await
        .context("failed to load settings")?;
    pb.finish_and_clear();

    if leetcode_username.is_none() && preferred_username.is_none() {
        print_settings(&current);
        return Ok(());
    }

    let updated = UserSettings {
        leetcode_username: leetcode_username.unwrap_or_else(|| current.leetcode_username.clone()),
        preferred_username: preferred_username
            .unwrap_or_else(|| current.preferred_username.clone()),
        ..current.clone()
    };

    let resource = DependentResource::detached(current);
    let pb = spinner("Updating settings...");
    let confirmed = resource
        .submit(session, Arc::new(SettingsWriter { api: api.clone() }), updated)
        .await;
    pb.finish_and_clear();

    println!("Settings updated.");
    print_settings(&confirmed);
    Ok(())
}

fn print_settings(settings: &UserSettings) {
    println!("{:<20} {}", "email:", settings.email);
    println!("{:<20} {}", "username:", settings.username);
    println!("{:<20} {}", "preferred username:", settings.preferred_username);
    println!("{:<20} {}", "leetcode username:", settings.leetcode_username);
}

async fn following(
    api: &Arc<ApiClient>,
    session: &SessionStore,
    add: Option<String>,
    remove: Option<String>,
) -> Result<()> {
    let snapshot = session.current();
    if !snapshot.has_usable_token() {
        anyhow::bail!("not signed in: configure auth.access_token in config.toml");
    }

    let fetcher = FollowingFetcher { api: api.clone() };
    let pb = spinner("Loading following list...");
    let mut list = fetcher
        .fetch(&snapshot)
        .await
        .context("failed to load following list")?;
    pb.finish_and_clear();

    if add.is_none() && remove.is_none() {
        let directory_fetcher = UserListFetcher { api: api.clone() };
        let pb = spinner("Loading user directory...");
        let directory = directory_fetcher
            .fetch(&snapshot)
            .await
            .context("failed to load user directory")?;
        pb.finish_and_clear();

        for user in &directory {
            let marker = if list.contains(&user.username) {
                "[following]"
            } else {
                ""
            };
            println!(
                "{:<24} {:<24} {}",
                user.preferred_username, user.leetcode_username, marker
            );
        }
        return Ok(());
    }

    if let Some(username) = add {
        if !list.contains(&username) {
            list.push(username);
        }
    }
    if let Some(username) = remove {
        list.retain(|u| u != &username);
    }

    let resource = DependentResource::detached(Vec::new());
    let pb = spinner("Updating following list...");
    let confirmed = resource
        .submit(session, Arc::new(FollowingWriter { api: api.clone() }), list)
        .await;
    pb.finish_and_clear();

    println!("Now following {} user(s).", confirmed.len());
    for username in &confirmed {
        println!("  {}", username);
    }
    Ok(())
}

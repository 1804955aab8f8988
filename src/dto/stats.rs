use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Aggregated statistics for one user over their finished matches.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatsView {
    /// User the statistics belong to.
    pub user_id: Uuid,
    /// Display name from the user directory.
    pub display_name: String,
    /// Total score across finished matches.
    pub sum_score: u64,
    /// Mean score, rounded to two decimals (exact integers stay exact).
    pub avg_score: f64,
    /// Finished matches played.
    pub games: usize,
    /// Matches won (score strictly greater than the opponent's).
    pub wins: usize,
    /// Matches lost (score strictly less than the opponent's).
    pub losses: usize,
    /// Matches drawn (equal scores).
    pub draws: usize,
}

/// One leaderboard entry.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardRow {
    /// 1-based position under the requested ordering.
    pub rank: usize,
    /// Statistics backing the entry.
    #[serde(flatten)]
    pub stats: StatsView,
}

/// One page of the leaderboard.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardPage {
    /// Rows on this page.
    pub items: Vec<LeaderboardRow>,
    /// 1-based page number.
    pub page: usize,
    /// Requested page size.
    pub page_size: usize,
    /// Total ranked users across all pages.
    pub total: usize,
}

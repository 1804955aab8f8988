//! Statistics derived by folding over finalized matches.
//!
//! The read path never touches in-flight matches, so every aggregation is
//! deterministic and can be recomputed at will.

use std::cmp::Ordering;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    dao::models::{MatchEntity, MatchStatus, ProgressEntity},
    dto::{
        common::paginate,
        sort::{LeaderboardSortField, SortCriterion, SortDirection, parse_criteria},
        stats::{LeaderboardPage, LeaderboardRow, StatsView},
    },
    error::ServiceError,
    state::SharedState,
};

/// Ordering applied when the caller supplies no criteria.
const DEFAULT_CRITERIA: [SortCriterion<LeaderboardSortField>; 2] = [
    SortCriterion {
        field: LeaderboardSortField::AvgScore,
        direction: SortDirection::Desc,
    },
    SortCriterion {
        field: LeaderboardSortField::SumScore,
        direction: SortDirection::Desc,
    },
];

/// Running aggregate for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTally {
    /// User the tally belongs to.
    pub user_id: Uuid,
    /// Total score across finished matches.
    pub sum_score: u64,
    /// Finished matches played.
    pub games: usize,
    /// Matches won.
    pub wins: usize,
    /// Matches lost.
    pub losses: usize,
    /// Matches drawn.
    pub draws: usize,
}

impl UserTally {
    fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            sum_score: 0,
            games: 0,
            wins: 0,
            losses: 0,
            draws: 0,
        }
    }

    /// Mean score rounded to two decimals; exact integers stay exact.
    pub fn avg_score(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            round2(self.sum_score as f64 / self.games as f64)
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Fold finished matches into per-user tallies.
///
/// The returned map preserves first-seen order over the match log, which is
/// the persistence order leaderboard ties fall back to.
pub fn accumulate<'a>(
    matches: impl IntoIterator<Item = &'a MatchEntity>,
) -> IndexMap<Uuid, UserTally> {
    let mut tallies: IndexMap<Uuid, UserTally> = IndexMap::new();

    for game in matches {
        if game.status != MatchStatus::Finished {
            continue;
        }
        let Some(player_two) = game.player_two.as_ref() else {
            continue;
        };
        record(&mut tallies, &game.player_one, player_two);
        record(&mut tallies, player_two, &game.player_one);
    }

    tallies
}

fn record(tallies: &mut IndexMap<Uuid, UserTally>, own: &ProgressEntity, other: &ProgressEntity) {
    let tally = tallies
        .entry(own.user_id)
        .or_insert_with(|| UserTally::new(own.user_id));
    tally.sum_score += u64::from(own.score);
    tally.games += 1;
    match own.score.cmp(&other.score) {
        Ordering::Greater => tally.wins += 1,
        Ordering::Less => tally.losses += 1,
        Ordering::Equal => tally.draws += 1,
    }
}

/// Stable-sort tallies by the supplied criteria, or the default ordering when
/// none are given. Rows equal under every criterion keep persistence order.
pub fn sort_tallies(
    tallies: &mut [UserTally],
    criteria: &[SortCriterion<LeaderboardSortField>],
) {
    let criteria: &[SortCriterion<LeaderboardSortField>] = if criteria.is_empty() {
        &DEFAULT_CRITERIA
    } else {
        criteria
    };

    tallies.sort_by(|a, b| {
        for criterion in criteria {
            let ordering = compare_field(a, b, criterion.field);
            let ordering = match criterion.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

fn compare_field(a: &UserTally, b: &UserTally, field: LeaderboardSortField) -> Ordering {
    match field {
        LeaderboardSortField::SumScore => a.sum_score.cmp(&b.sum_score),
        LeaderboardSortField::AvgScore => a.avg_score().total_cmp(&b.avg_score()),
        LeaderboardSortField::Games => a.games.cmp(&b.games),
        LeaderboardSortField::Wins => a.wins.cmp(&b.wins),
        LeaderboardSortField::Losses => a.losses.cmp(&b.losses),
        LeaderboardSortField::Draws => a.draws.cmp(&b.draws),
    }
}

/// Aggregated statistics for one user.
pub async fn statistics(state: &SharedState, user_id: Uuid) -> Result<StatsView, ServiceError> {
    if !state.users().exists(user_id).await? {
        return Err(ServiceError::NotFound(format!("user `{user_id}` not found")));
    }

    let finished = state.matches().finished_matches().await?;
    let tallies = accumulate(finished.iter());
    let tally = tallies
        .get(&user_id)
        .cloned()
        .unwrap_or_else(|| UserTally::new(user_id));

    build_view(state, tally).await
}

/// One page of the global leaderboard under the requested ordering.
pub async fn leaderboard(
    state: &SharedState,
    sort: Option<&str>,
    page: usize,
    page_size: usize,
) -> Result<LeaderboardPage, ServiceError> {
    let criteria: Vec<SortCriterion<LeaderboardSortField>> = match sort {
        Some(raw) => {
            parse_criteria(raw).map_err(|err| ServiceError::InvalidInput(err.to_string()))?
        }
        None => Vec::new(),
    };

    let finished = state.matches().finished_matches().await?;
    let mut tallies: Vec<UserTally> = accumulate(finished.iter()).into_values().collect();
    sort_tallies(&mut tallies, &criteria);

    let start_rank = page.saturating_sub(1).saturating_mul(page_size);
    let (page_items, total) = paginate(tallies, page, page_size);

    let mut items = Vec::with_capacity(page_items.len());
    for (offset, tally) in page_items.into_iter().enumerate() {
        items.push(LeaderboardRow {
            rank: start_rank + offset + 1,
            stats: build_view(state, tally).await?,
        });
    }

    Ok(LeaderboardPage {
        items,
        page,
        page_size,
        total,
    })
}

async fn build_view(state: &SharedState, tally: UserTally) -> Result<StatsView, ServiceError> {
    let display_name = state
        .users()
        .display_name(tally.user_id)
        .await?
        .unwrap_or_else(|| tally.user_id.to_string());

    Ok(StatsView {
        user_id: tally.user_id,
        display_name,
        sum_score: tally.sum_score,
        avg_score: tally.avg_score(),
        games: tally.games,
        wins: tally.wins,
        losses: tally.losses,
        draws: tally.draws,
    })
}

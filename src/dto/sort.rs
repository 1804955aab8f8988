//! Sort-criteria grammar shared by the match list and leaderboard endpoints.
//!
//! A criteria string is a comma-separated list of `field:direction` pairs,
//! e.g. `avg_score:desc,sum_score:desc`. The direction defaults to `desc`
//! when omitted.

use std::str::FromStr;

use thiserror::Error;

/// Direction of a single sort criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest first.
    Asc,
    /// Largest first.
    Desc,
}

impl FromStr for SortDirection {
    type Err = SortParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(SortParseError::UnknownDirection(other.to_string())),
        }
    }
}

/// A `(field, direction)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortCriterion<F> {
    /// Field the rows are compared on.
    pub field: F,
    /// Direction of the comparison.
    pub direction: SortDirection,
}

/// Fields the leaderboard can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardSortField {
    /// Total score across finished matches.
    SumScore,
    /// Mean score across finished matches.
    AvgScore,
    /// Number of finished matches played.
    Games,
    /// Matches won.
    Wins,
    /// Matches lost.
    Losses,
    /// Matches drawn.
    Draws,
}

impl FromStr for LeaderboardSortField {
    type Err = SortParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "sum_score" => Ok(LeaderboardSortField::SumScore),
            "avg_score" => Ok(LeaderboardSortField::AvgScore),
            "games" => Ok(LeaderboardSortField::Games),
            "wins" => Ok(LeaderboardSortField::Wins),
            "losses" => Ok(LeaderboardSortField::Losses),
            "draws" => Ok(LeaderboardSortField::Draws),
            other => Err(SortParseError::UnknownField(other.to_string())),
        }
    }
}

/// Fields a user's match list can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSortField {
    /// When the waiting slot was opened.
    CreatedAt,
}

impl FromStr for MatchSortField {
    type Err = SortParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "created_at" => Ok(MatchSortField::CreatedAt),
            other => Err(SortParseError::UnknownField(other.to_string())),
        }
    }
}

/// Error produced when a criteria string does not follow the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SortParseError {
    /// The field name is not sortable on this endpoint.
    #[error("unknown sort field `{0}`")]
    UnknownField(String),
    /// The direction is neither `asc` nor `desc`.
    #[error("unknown sort direction `{0}`")]
    UnknownDirection(String),
    /// An empty criterion between commas.
    #[error("empty sort criterion")]
    Empty,
}

/// Parse a comma-separated criteria string.
///
/// An empty or all-whitespace input yields no criteria; callers apply their
/// endpoint's default ordering in that case.
pub fn parse_criteria<F>(raw: &str) -> Result<Vec<SortCriterion<F>>, SortParseError>
where
    F: FromStr<Err = SortParseError>,
{
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    trimmed
        .split(',')
        .map(|token| {
            let token = token.trim();
            if token.is_empty() {
                return Err(SortParseError::Empty);
            }
            let (field, direction) = match token.split_once(':') {
                Some((field, direction)) => {
                    (field.trim(), direction.trim().parse::<SortDirection>()?)
                }
                None => (token, SortDirection::Desc),
            };
            Ok(SortCriterion {
                field: field.parse::<F>()?,
                direction,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_field_direction_pairs() {
        let criteria: Vec<SortCriterion<LeaderboardSortField>> =
            parse_criteria("avg_score:desc, sum_score:asc").unwrap();
        assert_eq!(criteria, vec![
            SortCriterion {
                field: LeaderboardSortField::AvgScore,
                direction: SortDirection::Desc,
            },
            SortCriterion {
                field: LeaderboardSortField::SumScore,
                direction: SortDirection::Asc,
            },
        ]);
    }

    #[test]
    fn direction_defaults_to_desc() {
        let criteria: Vec<SortCriterion<LeaderboardSortField>> =
            parse_criteria("wins").unwrap();
        assert_eq!(criteria[0].direction, SortDirection::Desc);
    }

    #[test]
    fn empty_string_yields_no_criteria() {
        let criteria: Vec<SortCriterion<LeaderboardSortField>> = parse_criteria("  ").unwrap();
        assert!(criteria.is_empty());
    }

    #[test]
    fn unknown_field_is_rejected() {
        let result = parse_criteria::<LeaderboardSortField>("elo:desc");
        assert_eq!(result, Err(SortParseError::UnknownField("elo".into())));
    }

    #[test]
    fn unknown_direction_is_rejected() {
        let result = parse_criteria::<MatchSortField>("created_at:down");
        assert_eq!(
            result,
            Err(SortParseError::UnknownDirection("down".into()))
        );
    }
}

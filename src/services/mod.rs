/// OpenAPI documentation generation.
pub mod documentation;
/// Background sweep finalizing stale matches.
pub mod finisher;
/// Health check service.
pub mod health_service;
/// Matchmaking and answer processing.
pub mod match_service;
/// Statistics and leaderboard aggregation.
pub mod stats_service;

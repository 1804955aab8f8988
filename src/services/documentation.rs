use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Trivia Duel Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::quiz::connect,
        crate::routes::quiz::submit_answer,
        crate::routes::quiz::get_match,
        crate::routes::quiz::my_matches,
        crate::routes::stats::user_statistics,
        crate::routes::stats::leaderboard,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::quiz::ConnectRequest,
            crate::dto::quiz::AnswerRequest,
            crate::dto::quiz::AnswerResult,
            crate::dto::quiz::MatchView,
            crate::dto::quiz::MatchPage,
            crate::dto::stats::StatsView,
            crate::dto::stats::LeaderboardRow,
            crate::dto::stats::LeaderboardPage,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "quiz", description = "Matchmaking and answer submission"),
        (name = "stats", description = "Statistics and leaderboard read path"),
    )
)]
pub struct ApiDoc;

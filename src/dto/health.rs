use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok").
    pub status: String,
    /// Number of published questions available for matchmaking.
    pub published_questions: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(published_questions: usize) -> Self {
        Self {
            status: "ok".to_string(),
            published_questions,
        }
    }
}

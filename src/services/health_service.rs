use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with a health payload including the published-question count.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let published = match state.catalog().published_count().await {
        Ok(count) => count,
        Err(err) => {
            warn!(error = %err, "question catalog health probe failed");
            0
        }
    };

    HealthResponse::ok(published)
}

//! Background sweep that finalizes matches whose grace window elapsed.

use std::time::SystemTime;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::{dao::match_store::FinalizeOutcome, state::SharedState};

/// Drive the finisher on the configured period until the process exits.
pub async fn run(state: SharedState) {
    let mut interval = tokio::time::interval(state.config().sweep_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(
        period = ?state.config().sweep_interval,
        "match finisher sweep started"
    );

    loop {
        interval.tick().await;
        tick(&state).await;
    }
}

/// One idempotent sweep: finalize every match meeting the finish predicate.
///
/// Each match is handled independently; a storage failure on one match is
/// logged and left for the next tick rather than aborting the batch.
pub async fn tick(state: &SharedState) {
    let store = state.matches();
    let now = SystemTime::now();

    let due = match store.due_for_finish(now).await {
        Ok(due) => due,
        Err(err) => {
            warn!(error = %err, "finisher could not list due matches; will retry");
            return;
        }
    };

    for match_id in due {
        match store.finalize(match_id, now).await {
            Ok(FinalizeOutcome::Finalized(game)) => {
                info!(
                    %match_id,
                    player_one_score = game.player_one.score,
                    player_two_score = game.player_two.as_ref().map(|p| p.score),
                    "match finalized"
                );
            }
            Ok(FinalizeOutcome::AlreadyFinished) => {
                debug!(%match_id, "match already finalized by a concurrent writer");
            }
            Ok(FinalizeOutcome::NotDue) => {
                debug!(%match_id, "match no longer due; skipping");
            }
            Ok(FinalizeOutcome::NotFound) => {
                warn!(%match_id, "due match disappeared before finalization");
            }
            Err(err) => {
                warn!(%match_id, error = %err, "finalization failed; leaving for next sweep");
            }
        }
    }
}

//! Coordinate-lock walking: straight-line locomotion with a hard stop on a
//! one-dimensional threshold.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::NavOutcome;
use super::zone::ZoneDescriptor;
use crate::client::{Control, GameClient};

/// Tight cadence on purpose: the gap between `safe_threshold` and the
/// server's kick boundary is the only buffer against latency, so the stop
/// must land within a tick or two of the crossing. Sprint stays off for the
/// same reason.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Walks forward until the zone's axis coordinate crosses its safe threshold,
/// then cuts every control state.
///
/// No exit path leaves locomotion engaged: a failed sample clears controls
/// best-effort before resolving `Aborted`.
pub async fn walk_until_threshold(client: &dyn GameClient, zone: &ZoneDescriptor) -> NavOutcome {
    info!(
        "nav.walk.start zone={} threshold={}",
        zone.name, zone.safe_threshold
    );

    if client.set_control(Control::Forward, true).await.is_err() {
        return NavOutcome::Aborted;
    }
    if client.set_control(Control::Sprint, false).await.is_err() {
        let _ = client.clear_controls().await;
        return NavOutcome::Aborted;
    }

    let mut poll = tokio::time::interval(POLL_INTERVAL);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        poll.tick().await;

        let pos = match client.position().await {
            Ok(pos) => pos,
            Err(err) => {
                debug!("nav.walk.aborted zone={} err={err:#}", zone.name);
                let _ = client.clear_controls().await;
                return NavOutcome::Aborted;
            }
        };

        let coord = pos.axis(zone.axis);
        if zone.crossed(coord) {
            let stopped = client.clear_controls().await;
            info!("nav.walk.stop zone={} coord={coord:.3}", zone.name);
            if stopped.is_err() {
                return NavOutcome::Aborted;
            }
            return NavOutcome::Completed;
        }
    }
}

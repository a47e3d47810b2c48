//! Teleport detection from position displacement.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::NavOutcome;
use crate::client::{GameClient, Vec3};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Displacement that counts as a teleport. Far beyond anything ordinary
/// walking can cover within one poll window, so drift can never trip it.
const DISPLACEMENT_THRESHOLD: f64 = 500.0;

/// Displacement small enough to re-anchor the reference point. Also doubles
/// as the slack for the sequencer's "already landed here" check.
pub const QUIESCENT_THRESHOLD: f64 = 20.0;

/// Settle time after a confirmed teleport: the world around the landing point
/// is still streaming in and physics can still nudge the entity.
const STABILIZE: Duration = Duration::from_secs(3);

/// Polls position until a teleport is confirmed, then re-anchors `reference`
/// to the landing sample and waits out the settle delay.
///
/// Sub-quiescent samples re-anchor `reference` as well; without that, slow
/// walking would accumulate distance against a stale anchor and eventually
/// read as a teleport. A failed position read resolves `Aborted` with no
/// side effects: the supervisor observes the disconnect independently.
pub async fn detect_teleport(
    client: &dyn GameClient,
    destination: &str,
    reference: &mut Vec3,
) -> NavOutcome {
    info!("nav.teleport.watch destination={destination}");

    let mut poll = tokio::time::interval(POLL_INTERVAL);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        poll.tick().await;

        let pos = match client.position().await {
            Ok(pos) => pos,
            Err(err) => {
                debug!("nav.teleport.aborted destination={destination} err={err:#}");
                return NavOutcome::Aborted;
            }
        };

        let distance = pos.distance_to(reference);
        if distance >= DISPLACEMENT_THRESHOLD {
            *reference = pos;
            info!("nav.teleport.confirmed destination={destination} distance={distance:.1}");
            let _ = client.clear_controls().await;
            tokio::time::sleep(STABILIZE).await;
            return NavOutcome::Completed;
        }

        if distance < QUIESCENT_THRESHOLD {
            *reference = pos;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::ScriptedClient;

    #[tokio::test(start_paused = true)]
    async fn jitter_re_anchors_and_never_fires() {
        let client = ScriptedClient::scripted(&[
            (0.6, 64.0, 0.4),
            (0.4, 64.0, 0.7),
            (0.5, 64.1, 0.5),
        ]);
        let mut reference = Vec3 { x: 0.5, y: 64.0, z: 0.5 };

        // The script runs dry after three quiescent samples, which reads as a
        // torn-down connection: the detector must abort, not confirm.
        let outcome = detect_teleport(&client, "limbo", &mut reference).await;
        assert_eq!(outcome, NavOutcome::Aborted);
        assert_eq!(reference, Vec3 { x: 0.5, y: 64.1, z: 0.5 });
        assert!(client.control_calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn large_displacement_confirms_once_and_stops_polling() {
        let client = ScriptedClient::scripted(&[
            (0.4, 64.0, 0.6),
            (3.5, 100.0, -999.5),
        ]);
        let mut reference = Vec3 { x: 0.5, y: 64.0, z: 0.5 };

        let outcome = detect_teleport(&client, "limbo", &mut reference).await;
        assert_eq!(outcome, NavOutcome::Completed);
        assert_eq!(reference, Vec3 { x: 3.5, y: 100.0, z: -999.5 });
        // Polling stopped at the confirming sample: nothing else was consumed,
        // and any further poll would have failed the empty script.
    }

    #[tokio::test(start_paused = true)]
    async fn intermediate_displacement_keeps_the_anchor() {
        // 30 units is past quiescent but nowhere near a teleport: the anchor
        // must stay put so a follow-up jump is measured from the old point.
        let client = ScriptedClient::scripted(&[(30.0, 64.0, 0.5)]);
        let mut reference = Vec3 { x: 0.5, y: 64.0, z: 0.5 };

        let outcome = detect_teleport(&client, "limbo", &mut reference).await;
        assert_eq!(outcome, NavOutcome::Aborted);
        assert_eq!(reference, Vec3 { x: 0.5, y: 64.0, z: 0.5 });
    }

    #[tokio::test(start_paused = true)]
    async fn failed_read_aborts_silently() {
        let client = ScriptedClient::new();
        let before = Vec3 { x: 1.0, y: 2.0, z: 3.0 };
        let mut reference = before;

        let outcome = detect_teleport(&client, "lobby", &mut reference).await;
        assert_eq!(outcome, NavOutcome::Aborted);
        assert_eq!(reference, before);
    }
}

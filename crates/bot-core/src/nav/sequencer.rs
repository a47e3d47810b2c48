//! The linear state machine that chains login, teleport waits, and walks
//! over the scripted zone route.

use std::time::Duration;

use tracing::{debug, info};

use super::NavOutcome;
use super::teleport::{QUIESCENT_THRESHOLD, detect_teleport};
use super::walker::walk_until_threshold;
use super::zone::ZoneDescriptor;
use crate::client::{GameClient, Vec3};
use crate::session::SessionFlags;

/// Grace period between spawning and the in-game login command; the server
/// rejects chat sent before the join settles.
const LOGIN_SETTLE: Duration = Duration::from_secs(2);

/// Wait after the final walk before going active: the main world streams in
/// slowly and early chat sends get eaten.
const WORLD_LOAD: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    LoggingIn,
    AwaitingTeleport(usize),
    Walking(usize),
    /// Terminal. Persists until the supervisor tears the session down.
    Active,
}

pub struct ZoneSequencer {
    route: Vec<ZoneDescriptor>,
    state: SequencerState,
}

impl ZoneSequencer {
    pub fn new(route: Vec<ZoneDescriptor>) -> Self {
        Self {
            route,
            state: SequencerState::Idle,
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Runs the route to completion: log in, then per zone await the teleport
    /// into it and walk out of it. Flips the session active after the final
    /// world-load delay.
    ///
    /// A zone's teleport wait is skipped when the current position already
    /// sits at the zone's landing point; after a crash-recovery reconnect the
    /// server respawns the bot inside the first zone and the teleport it
    /// would be waiting for has already happened.
    ///
    /// Any sub-step abort ends the whole sequence without error propagation;
    /// the supervisor's disconnect handling is the sole recovery path.
    pub async fn run(
        &mut self,
        client: &dyn GameClient,
        flags: &SessionFlags,
        password: &str,
    ) -> NavOutcome {
        self.state = SequencerState::LoggingIn;
        tokio::time::sleep(LOGIN_SETTLE).await;

        let login = format!("/login {password}");
        if client.chat(&login).await.is_err() {
            return NavOutcome::Aborted;
        }
        flags.set_authenticated(true);
        info!("nav.login.sent");

        let mut reference = match client.position().await {
            Ok(pos) => pos,
            Err(_) => return NavOutcome::Aborted,
        };

        for i in 0..self.route.len() {
            let zone = self.route[i].clone();

            let pos: Vec3 = match client.position().await {
                Ok(pos) => pos,
                Err(_) => return NavOutcome::Aborted,
            };

            if zone.contains(&pos, QUIESCENT_THRESHOLD) {
                info!(
                    "nav.zone.failsafe zone={} coord={:.1}",
                    zone.name,
                    pos.axis(zone.axis)
                );
                reference = pos;
            } else {
                self.state = SequencerState::AwaitingTeleport(i);
                if detect_teleport(client, zone.name, &mut reference).await == NavOutcome::Aborted {
                    debug!("nav.sequence.aborted state={:?}", self.state);
                    return NavOutcome::Aborted;
                }
            }

            self.state = SequencerState::Walking(i);
            if walk_until_threshold(client, &zone).await == NavOutcome::Aborted {
                debug!("nav.sequence.aborted state={:?}", self.state);
                return NavOutcome::Aborted;
            }
        }

        tokio::time::sleep(WORLD_LOAD).await;
        flags.set_active(true);
        self.state = SequencerState::Active;
        info!("nav.sequence.active");
        NavOutcome::Completed
    }
}

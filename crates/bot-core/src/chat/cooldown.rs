//! Per-sender rate limiting.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

pub const COOLDOWN_WINDOW: Duration = Duration::from_millis(5000);

/// Above this many tracked senders, entries past the window are pruned on the
/// next accept. Keeps the table bounded by recently-active senders rather
/// than every name ever seen.
const MAX_TRACKED_SENDERS: usize = 256;

/// Maps sender name to the instant of their last accepted message. A sender
/// is accepted at most once per window; rejections do not refresh the
/// timestamp.
#[derive(Debug, Default)]
pub struct CooldownTable {
    last_accepted: HashMap<String, Instant>,
}

impl CooldownTable {
    pub fn accept(&mut self, sender: &str, now: Instant) -> bool {
        if let Some(last) = self.last_accepted.get(sender)
            && now.duration_since(*last) < COOLDOWN_WINDOW
        {
            return false;
        }

        if self.last_accepted.len() >= MAX_TRACKED_SENDERS {
            self.prune(now);
        }
        self.last_accepted.insert(sender.to_string(), now);
        true
    }

    /// Entries past the window can never reject again, so they are dead
    /// weight and safe to drop.
    fn prune(&mut self, now: Instant) {
        self.last_accepted
            .retain(|_, last| now.duration_since(*last) < COOLDOWN_WINDOW);
    }

    pub fn len(&self) -> usize {
        self.last_accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_accepted.is_empty()
    }
}

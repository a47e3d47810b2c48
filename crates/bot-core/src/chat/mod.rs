//! Whisper-to-reply bridge: parse incoming chat lines, rate-limit senders,
//! fetch a generated reply, and relay it back as a private message.

pub mod cooldown;
pub mod whisper;

pub use cooldown::{COOLDOWN_WINDOW, CooldownTable};
pub use whisper::{Whisper, parse_whisper};

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::client::GameClient;
use crate::reply::ReplyEngine;

/// Pause before relaying so bursts of replies never trip the platform's own
/// anti-spam throttling.
const RELAY_PAUSE: Duration = Duration::from_secs(2);

/// Hard cap under the platform's chat message limit, leaving room for the
/// `/msg <sender> ` prefix.
const REPLY_MAX_CHARS: usize = 240;

/// Sent instead of a reply that sanitized down to nothing; the platform
/// rejects empty messages.
const EMPTY_REPLY_PLACEHOLDER: &str = "...";

pub struct ChatBridge {
    own_name: String,
    cooldowns: CooldownTable,
}

impl ChatBridge {
    pub fn new(own_name: impl Into<String>) -> Self {
        Self {
            own_name: own_name.into(),
            cooldowns: CooldownTable::default(),
        }
    }

    /// Handles one raw chat line. Non-whispers, self-whispers, and senders
    /// inside their cooldown window are dropped silently. A reply-service
    /// failure is also silent toward the sender; operators see the warn log.
    pub async fn handle_line(
        &mut self,
        client: &dyn GameClient,
        engine: &dyn ReplyEngine,
        line: &str,
    ) {
        let Some(whisper) = parse_whisper(line) else {
            return;
        };

        // Relayed replies come back as our own whispers; answering them would
        // loop forever.
        if whisper.sender.eq_ignore_ascii_case(&self.own_name) {
            return;
        }

        if !self.cooldowns.accept(&whisper.sender, Instant::now()) {
            debug!("chat.cooldown.dropped sender={}", whisper.sender);
            return;
        }

        info!("chat.whisper.accepted sender={}", whisper.sender);
        let reply = match engine.reply(&whisper.content, &whisper.sender).await {
            Ok(Some(reply)) => reply,
            Ok(None) => return,
            Err(err) => {
                warn!("chat.reply.failed sender={} err={err:#}", whisper.sender);
                return;
            }
        };

        let text = sanitize_reply(&reply);
        tokio::time::sleep(RELAY_PAUSE).await;

        let msg = format!("/msg {} {}", whisper.sender, text);
        if let Err(err) = client.chat(&msg).await {
            warn!("chat.relay.failed sender={} err={err:#}", whisper.sender);
        }
    }
}

/// Collapses whitespace runs (the engine is fond of newlines), trims, and
/// caps the length. Never returns an empty string.
pub fn sanitize_reply(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let capped: String = collapsed.chars().take(REPLY_MAX_CHARS).collect();
    if capped.is_empty() {
        EMPTY_REPLY_PLACEHOLDER.to_string()
    } else {
        capped
    }
}

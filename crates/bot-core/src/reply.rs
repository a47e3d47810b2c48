//! Reply-engine boundary: the external service that turns an incoming
//! whisper into a chat reply.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Generation can be slow; anything past this is treated as a failure and
/// the sender gets nothing.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

pub trait ReplyEngine: Send + Sync {
    /// Returns the generated reply, or `None` when the engine had nothing to
    /// say for this message.
    fn reply<'a>(
        &'a self,
        message: &'a str,
        sender: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<String>>> + Send + 'a>>;
}

#[derive(Debug, Clone)]
pub struct ReplyConfig {
    /// Full endpoint URL, e.g. `http://127.0.0.1:8090/reply`.
    pub endpoint: String,
    /// Routing tag so the engine can keep per-channel conversation context.
    pub group_name: String,
}

#[derive(Serialize)]
struct ReplyRequest<'a> {
    message: &'a str,
    sender_id: &'a str,
    username: &'a str,
    display_name: &'a str,
    group_name: &'a str,
}

#[derive(Deserialize)]
struct ReplyResponse {
    #[serde(default)]
    reply: Option<String>,
}

/// `POST`s the whisper to an HTTP reply service and decodes the JSON answer.
pub struct HttpReplyEngine {
    http: Client,
    cfg: ReplyConfig,
}

impl HttpReplyEngine {
    pub fn new(cfg: ReplyConfig) -> Self {
        Self {
            http: Client::new(),
            cfg,
        }
    }
}

impl ReplyEngine for HttpReplyEngine {
    fn reply<'a>(
        &'a self,
        message: &'a str,
        sender: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<String>>> + Send + 'a>> {
        Box::pin(async move {
            let request = ReplyRequest {
                message,
                sender_id: sender,
                username: sender,
                display_name: sender,
                group_name: &self.cfg.group_name,
            };

            let res = self
                .http
                .post(&self.cfg.endpoint)
                .timeout(REQUEST_TIMEOUT)
                .json(&request)
                .send()
                .await
                .context("reply request failed")?
                .error_for_status()
                .context("reply non-2xx response")?
                .json::<ReplyResponse>()
                .await
                .context("reply response decode failed")?;

            Ok(res.reply)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_carries_sender_in_every_identity_field() {
        let request = ReplyRequest {
            message: "hello there",
            sender_id: "_greg05",
            username: "_greg05",
            display_name: "_greg05",
            group_name: "ingame_dm",
        };
        let v = serde_json::to_value(&request).expect("serialize");
        assert_eq!(v["message"], "hello there");
        assert_eq!(v["sender_id"], "_greg05");
        assert_eq!(v["username"], "_greg05");
        assert_eq!(v["display_name"], "_greg05");
        assert_eq!(v["group_name"], "ingame_dm");
    }

    #[test]
    fn response_reply_field_is_optional() {
        let with: ReplyResponse = serde_json::from_str(r#"{"reply":"hi"}"#).expect("decode");
        assert_eq!(with.reply.as_deref(), Some("hi"));

        let without: ReplyResponse = serde_json::from_str("{}").expect("decode");
        assert_eq!(without.reply, None);
    }
}

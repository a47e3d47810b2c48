//! JSON-lines control connection to the protocol gateway.
//!
//! One TCP connection per session. Request ops (`connect`, `position`,
//! `control`, `clear_controls`, `chat`) are answered in order on the same
//! lane; unsolicited `event` lines (`spawn`, `chat`, `kicked`, `end`) are
//! pushed onto the session's event channel. The gateway owns the actual game
//! protocol; this side never sees a packet.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Context;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{debug, warn};

use wispbot_core::client::{Connector, Control, GameClient, GameEvent, Vec3};

const EVENT_CHANNEL_CAPACITY: usize = 64;

type Pending = Arc<Mutex<VecDeque<oneshot::Sender<Value>>>>;

pub struct RemoteGameClient {
    writer: Mutex<OwnedWriteHalf>,
    pending: Pending,
}

impl RemoteGameClient {
    async fn request(&self, req: Value) -> anyhow::Result<Value> {
        let (tx, rx) = oneshot::channel();
        let line = format!("{req}\n");
        {
            let mut writer = self.writer.lock().await;
            self.pending.lock().await.push_back(tx);
            writer
                .write_all(line.as_bytes())
                .await
                .context("control write")?;
            writer.flush().await.ok();
        }

        let value = rx.await.context("control connection closed")?;
        if value.get("ok").and_then(Value::as_bool) != Some(true) {
            anyhow::bail!("control request failed: {value}");
        }
        Ok(value)
    }
}

impl GameClient for RemoteGameClient {
    fn position<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec3>> + Send + 'a>> {
        Box::pin(async move {
            let v = self.request(json!({ "op": "position" })).await?;
            let pos = v
                .get("position")
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("missing position in response"))?;
            serde_json::from_value(pos).context("decode position")
        })
    }

    fn set_control<'a>(
        &'a self,
        control: Control,
        state: bool,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.request(json!({ "op": "control", "control": control, "state": state }))
                .await?;
            Ok(())
        })
    }

    fn clear_controls<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.request(json!({ "op": "clear_controls" })).await?;
            Ok(())
        })
    }

    fn chat<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.request(json!({ "op": "chat", "text": text })).await?;
            Ok(())
        })
    }
}

/// Join parameters forwarded to the gateway with the initial `connect` op.
#[derive(Debug, Clone)]
pub struct HelloParams {
    pub host: String,
    pub username: String,
    pub version: String,
}

pub struct ControlConnector {
    addr: String,
    hello: HelloParams,
}

impl ControlConnector {
    pub fn new(addr: impl Into<String>, hello: HelloParams) -> Self {
        Self {
            addr: addr.into(),
            hello,
        }
    }
}

impl Connector for ControlConnector {
    #[allow(clippy::type_complexity)]
    fn connect<'a>(
        &'a self,
    ) -> Pin<
        Box<
            dyn Future<Output = anyhow::Result<(Arc<dyn GameClient>, mpsc::Receiver<GameEvent>)>>
                + Send
                + 'a,
        >,
    > {
        Box::pin(async move {
            let stream = TcpStream::connect(&self.addr)
                .await
                .with_context(|| format!("connect control port {}", self.addr))?;
            let (read, write) = stream.into_split();

            let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
            let pending: Pending = Arc::new(Mutex::new(VecDeque::new()));
            tokio::spawn(read_loop(read, Arc::clone(&pending), events_tx));

            let client = RemoteGameClient {
                writer: Mutex::new(write),
                pending,
            };
            client
                .request(json!({
                    "op": "connect",
                    "host": self.hello.host,
                    "username": self.hello.username,
                    "version": self.hello.version,
                }))
                .await?;

            Ok((Arc::new(client) as Arc<dyn GameClient>, events_rx))
        })
    }
}

/// Demultiplexes the gateway's line stream: event lines go to the session's
/// channel, everything else answers the oldest in-flight request. Ends when
/// the connection or the session side goes away, failing any waiters and
/// signalling `Disconnected`.
async fn read_loop(read: OwnedReadHalf, pending: Pending, events: mpsc::Sender<GameEvent>) {
    let mut lines = BufReader::new(read).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                warn!("control.read.error err={err}");
                break;
            }
        };
        let value: Value = match serde_json::from_str(line.trim()) {
            Ok(v) => v,
            Err(err) => {
                debug!("control.read.invalid_json err={err}");
                continue;
            }
        };

        if value.get("event").is_some() {
            if let Some(event) = map_event_line(&value) {
                if events.send(event).await.is_err() {
                    break;
                }
            }
            continue;
        }

        let Some(tx) = pending.lock().await.pop_front() else {
            debug!("control.read.unmatched_response");
            continue;
        };
        let _ = tx.send(value);
    }

    // Dropping the queued senders wakes every in-flight request with an
    // error; the explicit event covers pure event consumers.
    pending.lock().await.clear();
    let _ = events.send(GameEvent::Disconnected).await;
}

fn map_event_line(value: &Value) -> Option<GameEvent> {
    let event = value.get("event").and_then(Value::as_str)?;
    match event {
        "spawn" => Some(GameEvent::Spawned),
        "chat" => value
            .get("text")
            .and_then(Value::as_str)
            .map(|text| GameEvent::Chat(text.to_string())),
        "kicked" => Some(GameEvent::Kicked(
            value
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        )),
        "end" => Some(GameEvent::Disconnected),
        other => {
            debug!("control.event.unknown event={other}");
            None
        }
    }
}

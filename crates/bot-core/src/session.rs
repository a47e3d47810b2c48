//! One live connection: shared flags, owned tasks, and the event loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::chat::ChatBridge;
use crate::client::{Control, GameClient, GameEvent};
use crate::nav::ZoneSequencer;
use crate::nav::zone::scripted_route;
use crate::reply::ReplyEngine;

const ANTI_IDLE_PERIOD: Duration = Duration::from_secs(60);
const JUMP_HOLD: Duration = Duration::from_millis(250);

/// Cross-task flags for one session. Built fresh per connection; a superseded
/// copy dies with its session's tasks, so stale handlers cannot flip a live
/// session's state.
#[derive(Debug, Default)]
pub struct SessionFlags {
    authenticated: AtomicBool,
    active: AtomicBool,
}

impl SessionFlags {
    pub fn authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    pub fn set_authenticated(&self, value: bool) {
        self.authenticated.store(value, Ordering::SeqCst);
    }

    pub fn active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn set_active(&self, value: bool) {
        self.active.store(value, Ordering::SeqCst);
    }
}

/// Why the session ended. The supervisor treats both the same way; the split
/// exists for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    Kicked(String),
    Disconnected,
}

pub struct Session {
    client: Arc<dyn GameClient>,
    flags: Arc<SessionFlags>,
    password: String,
    tasks: Vec<JoinHandle<()>>,
}

impl Session {
    pub fn new(client: Arc<dyn GameClient>, password: impl Into<String>) -> Self {
        Self {
            client,
            flags: Arc::new(SessionFlags::default()),
            password: password.into(),
            tasks: Vec::new(),
        }
    }

    pub fn flags(&self) -> Arc<SessionFlags> {
        Arc::clone(&self.flags)
    }

    /// Consumes events until the connection dies, then aborts every task this
    /// session spawned so no poller or timer outlives its connection.
    ///
    /// The navigation sequence starts on the first `Spawned` only; the server
    /// re-fires spawn on respawns and the route must not restart mid-run.
    /// Chat lines are dropped wholesale until the sequencer flips `active`.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<GameEvent>,
        engine: Arc<dyn ReplyEngine>,
        own_name: &str,
    ) -> SessionEnd {
        let mut bridge = ChatBridge::new(own_name);
        let mut nav_started = false;

        self.tasks.push(spawn_anti_idle(Arc::clone(&self.client)));

        let end = loop {
            let Some(event) = events.recv().await else {
                break SessionEnd::Disconnected;
            };
            match event {
                GameEvent::Spawned => {
                    if !nav_started {
                        nav_started = true;
                        self.tasks.push(spawn_navigation(
                            Arc::clone(&self.client),
                            Arc::clone(&self.flags),
                            self.password.clone(),
                        ));
                    }
                }
                GameEvent::Chat(line) => {
                    debug!("chat.line {line}");
                    if self.flags.active() {
                        bridge
                            .handle_line(self.client.as_ref(), engine.as_ref(), &line)
                            .await;
                    }
                }
                GameEvent::Kicked(reason) => {
                    warn!("session.kicked reason={reason}");
                    break SessionEnd::Kicked(reason);
                }
                GameEvent::Disconnected => break SessionEnd::Disconnected,
            }
        };

        for task in &self.tasks {
            task.abort();
        }
        info!("session.closed");
        end
    }
}

fn spawn_navigation(
    client: Arc<dyn GameClient>,
    flags: Arc<SessionFlags>,
    password: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut sequencer = ZoneSequencer::new(scripted_route());
        let outcome = sequencer.run(client.as_ref(), &flags, &password).await;
        debug!("nav.sequence.finished outcome={outcome:?}");
    })
}

/// Brief periodic jump so the server's idle detection never fires. Runs for
/// the whole session regardless of navigation phase or the active flag, and
/// dies with the session.
fn spawn_anti_idle(client: Arc<dyn GameClient>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(ANTI_IDLE_PERIOD);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; jumping at connect time would
        // race the spawn handshake.
        tick.tick().await;
        loop {
            tick.tick().await;
            if client.set_control(Control::Jump, true).await.is_err() {
                break;
            }
            tokio::time::sleep(JUMP_HOLD).await;
            if client.set_control(Control::Jump, false).await.is_err() {
                break;
            }
        }
    })
}

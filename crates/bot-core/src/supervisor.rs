//! Connection lifecycle: create a session, run it to disconnect, tear down,
//! recreate after a fixed backoff.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::client::Connector;
use crate::config::Settings;
use crate::reply::ReplyEngine;
use crate::session::Session;

/// Fixed, deliberately long backoff. The server rate-limits rejoin attempts,
/// and growing the delay would only keep the bot offline longer after an
/// outage ends.
const RECONNECT_BACKOFF: Duration = Duration::from_secs(30);

pub struct Supervisor {
    settings: Settings,
    reconnect_pending: bool,
}

impl Supervisor {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            reconnect_pending: false,
        }
    }

    /// Marks a restart as pending. Returns `false` when one is already
    /// scheduled: a kick followed by the transport closing delivers two
    /// disconnect signals for one outage, and only the first may schedule a
    /// recreation.
    pub fn on_disconnect(&mut self) -> bool {
        if self.reconnect_pending {
            return false;
        }
        self.reconnect_pending = true;
        true
    }

    pub fn on_session_started(&mut self) {
        self.reconnect_pending = false;
    }

    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_pending
    }

    /// Runs sessions forever. Every iteration is a clean restart: a brand-new
    /// session over a brand-new connection, with nothing carried over from
    /// the previous one.
    pub async fn run(&mut self, connector: &dyn Connector, engine: Arc<dyn ReplyEngine>) {
        loop {
            info!(
                "session.connect host={} user={}",
                self.settings.host, self.settings.username
            );
            let (client, events) = match connector.connect().await {
                Ok(pair) => pair,
                Err(err) => {
                    warn!(
                        "session.connect.failed err={err:#} backoff_secs={}",
                        RECONNECT_BACKOFF.as_secs()
                    );
                    sleep(RECONNECT_BACKOFF).await;
                    continue;
                }
            };
            self.on_session_started();

            let session = Session::new(client, self.settings.password.clone());
            let end = session
                .run(events, Arc::clone(&engine), &self.settings.username)
                .await;

            if self.on_disconnect() {
                warn!(
                    "session.reconnect.scheduled end={end:?} backoff_secs={}",
                    RECONNECT_BACKOFF.as_secs()
                );
                sleep(RECONNECT_BACKOFF).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::mpsc;

    use super::*;
    use crate::client::{GameClient, GameEvent};
    use crate::testutil::ScriptedClient;

    fn test_settings() -> Settings {
        Settings::parse(
            r#"
            host = "play.example.org"
            username = "wisp"
            password = "hunter2"
            reply_url = "http://127.0.0.1:8090/reply"
            "#,
        )
        .expect("settings")
    }

    struct NoReplyEngine;

    impl ReplyEngine for NoReplyEngine {
        fn reply<'a>(
            &'a self,
            _message: &'a str,
            _sender: &'a str,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<String>>> + Send + 'a>> {
            Box::pin(async move { Ok(None) })
        }
    }

    /// Hands out pre-scripted sessions, then fails every further attempt.
    #[derive(Default)]
    struct FakeConnector {
        sessions: Mutex<VecDeque<mpsc::Receiver<GameEvent>>>,
        connects: AtomicUsize,
        failures: AtomicUsize,
    }

    impl Connector for FakeConnector {
        #[allow(clippy::type_complexity)]
        fn connect<'a>(
            &'a self,
        ) -> Pin<
            Box<
                dyn Future<
                        Output = anyhow::Result<(
                            Arc<dyn GameClient>,
                            mpsc::Receiver<GameEvent>,
                        )>,
                    > + Send
                    + 'a,
            >,
        > {
            Box::pin(async move {
                let Some(events) = self.sessions.lock().unwrap().pop_front() else {
                    self.failures.fetch_add(1, Ordering::SeqCst);
                    anyhow::bail!("gateway unreachable");
                };
                self.connects.fetch_add(1, Ordering::SeqCst);
                Ok((
                    Arc::new(ScriptedClient::new()) as Arc<dyn GameClient>,
                    events,
                ))
            })
        }
    }

    #[test]
    fn duplicate_disconnect_signals_schedule_one_restart() {
        let mut supervisor = Supervisor::new(test_settings());
        assert!(!supervisor.reconnect_pending());

        assert!(supervisor.on_disconnect());
        assert!(!supervisor.on_disconnect());
        assert!(supervisor.reconnect_pending());

        // The next session clears the guard; a later outage schedules again.
        supervisor.on_session_started();
        assert!(supervisor.on_disconnect());
    }

    #[tokio::test(start_paused = true)]
    async fn each_outage_produces_exactly_one_recreation() {
        let connector = FakeConnector::default();
        {
            let mut sessions = connector.sessions.lock().unwrap();
            // Both scripted sessions die instantly with the duplicate
            // kick-then-end signal pair.
            for _ in 0..2 {
                let (tx, rx) = mpsc::channel(4);
                tx.try_send(GameEvent::Kicked("afk".to_string())).expect("send");
                tx.try_send(GameEvent::Disconnected).expect("send");
                sessions.push_back(rx);
            }
        }

        let mut supervisor = Supervisor::new(test_settings());
        let engine: Arc<dyn ReplyEngine> = Arc::new(NoReplyEngine);

        // session 1 at t=0, session 2 at t=30, first failed attempt at t=60;
        // cut the loop off shortly after.
        let _ = tokio::time::timeout(
            Duration::from_secs(70),
            supervisor.run(&connector, engine),
        )
        .await;

        assert_eq!(connector.connects.load(Ordering::SeqCst), 2);
        assert_eq!(connector.failures.load(Ordering::SeqCst), 1);
    }
}

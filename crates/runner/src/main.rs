//! Bot entry point: load settings, wire the real gateway and reply-engine
//! implementations, and run the session supervisor forever.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use wispbot_core::config::Settings;
use wispbot_core::reply::{HttpReplyEngine, ReplyConfig, ReplyEngine};
use wispbot_core::supervisor::Supervisor;

mod control;

use control::{ControlConnector, HelloParams};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load()?;
    info!(
        "boot host={} user={} version={}",
        settings.host, settings.username, settings.version
    );

    let engine: Arc<dyn ReplyEngine> = Arc::new(HttpReplyEngine::new(ReplyConfig {
        endpoint: settings.reply_url.clone(),
        group_name: settings.group_name.clone(),
    }));
    let connector = ControlConnector::new(
        settings.control_addr.clone(),
        HelloParams {
            host: settings.host.clone(),
            username: settings.username.clone(),
            version: settings.version.clone(),
        },
    );

    let mut supervisor = Supervisor::new(settings);
    supervisor.run(&connector, engine).await;
    Ok(())
}

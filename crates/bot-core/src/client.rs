//! Boundary traits for the game-protocol client.
//!
//! The bot never speaks the game protocol itself. It reads positions and
//! drives locomotion through `GameClient`, and a `Connector` hands out fresh
//! client handles together with their connection-event streams. The runner
//! implements both over a control connection to an out-of-process gateway.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Position snapshot taken at sample time. Always copied, never a live view,
/// so a later comparison cannot race against the entity moving underneath it.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn distance_to(&self, other: &Vec3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn axis(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Locomotion control states the gateway exposes. Boolean toggles, matching
/// the platform's held-key model.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    Forward,
    Jump,
    Sprint,
}

/// Connection-level events pushed by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    Spawned,
    /// One raw chat line, already stripped of framing.
    Chat(String),
    Kicked(String),
    Disconnected,
}

/// Boundary the bot uses to read game state and drive the character.
pub trait GameClient: Send + Sync {
    fn position<'a>(&'a self)
    -> Pin<Box<dyn Future<Output = anyhow::Result<Vec3>> + Send + 'a>>;

    fn set_control<'a>(
        &'a self,
        control: Control,
        state: bool,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

    fn clear_controls<'a>(&'a self)
    -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

    fn chat<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;
}

/// Creates fresh connections for the supervisor. Each call yields an
/// independent client handle plus its event stream; nothing is shared with a
/// previous session, so a superseded session cannot touch the new connection.
pub trait Connector: Send + Sync {
    #[allow(clippy::type_complexity)]
    fn connect<'a>(
        &'a self,
    ) -> Pin<
        Box<
            dyn Future<Output = anyhow::Result<(Arc<dyn GameClient>, mpsc::Receiver<GameEvent>)>>
                + Send
                + 'a,
        >,
    >;
}

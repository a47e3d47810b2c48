//! Scripted `GameClient` fake shared by the unit tests.
//!
//! Position samples are a strict script: every poll pops exactly one sample,
//! and an empty queue fails the read like a torn-down connection would. That
//! keeps each test's poll count explicit and makes accidental extra polls
//! show up as aborts.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use crate::client::{Control, GameClient, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCall {
    Set(Control, bool),
    Clear,
}

#[derive(Default)]
pub struct ScriptedClient {
    positions: Mutex<VecDeque<Vec3>>,
    controls: Mutex<Vec<ControlCall>>,
    chats: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripted(samples: &[(f64, f64, f64)]) -> Self {
        let client = Self::new();
        for &(x, y, z) in samples {
            client.push_position(Vec3 { x, y, z });
        }
        client
    }

    pub fn push_position(&self, pos: Vec3) {
        self.positions.lock().unwrap().push_back(pos);
    }

    pub fn control_calls(&self) -> Vec<ControlCall> {
        self.controls.lock().unwrap().clone()
    }

    pub fn chat_lines(&self) -> Vec<String> {
        self.chats.lock().unwrap().clone()
    }
}

impl GameClient for ScriptedClient {
    fn position<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec3>> + Send + 'a>> {
        Box::pin(async move {
            self.positions
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("no position sample queued"))
        })
    }

    fn set_control<'a>(
        &'a self,
        control: Control,
        state: bool,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.controls
                .lock()
                .unwrap()
                .push(ControlCall::Set(control, state));
            Ok(())
        })
    }

    fn clear_controls<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.controls.lock().unwrap().push(ControlCall::Clear);
            Ok(())
        })
    }

    fn chat<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.chats.lock().unwrap().push(text.to_string());
            Ok(())
        })
    }
}

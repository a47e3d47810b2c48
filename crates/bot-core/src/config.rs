//! Runtime configuration.
//!
//! Settings load once at startup from `wispbot.toml`. Search order mirrors the
//! repo's conventions: `$WISPBOT_CONFIG_DIR`, the working directory, then the
//! repo-local `config/` directory. Credentials and the reply-service URL may
//! come from the environment instead of the file; missing required fields
//! abort startup with a diagnostic.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

const CONFIG_FILE: &str = "wispbot.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Game server the gateway should join.
    pub host: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Reply-engine endpoint, e.g. `http://127.0.0.1:8090/reply`.
    #[serde(default)]
    pub reply_url: String,
    /// Protocol version string forwarded to the gateway.
    #[serde(default = "default_version")]
    pub version: String,
    /// Control port of the protocol gateway.
    #[serde(default = "default_control_addr")]
    pub control_addr: String,
    /// Routing tag sent with every reply request so the engine can keep
    /// per-channel conversation context.
    #[serde(default = "default_group_name")]
    pub group_name: String,
}

fn default_version() -> String {
    "1.21.10".to_string()
}

fn default_control_addr() -> String {
    "127.0.0.1:7878".to_string()
}

fn default_group_name() -> String {
    "ingame_dm".to_string()
}

impl Settings {
    pub fn load() -> anyhow::Result<Settings> {
        let path = resolve_config_path(CONFIG_FILE)?;
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let mut settings = Settings::parse(&text)?;
        settings.apply_env_overrides();
        settings.validate()?;
        Ok(settings)
    }

    pub fn parse(text: &str) -> anyhow::Result<Settings> {
        toml::from_str(text).context("Failed to parse TOML")
    }

    fn apply_env_overrides(&mut self) {
        for (field, var) in [
            (&mut self.username, "WISPBOT_USERNAME"),
            (&mut self.password, "WISPBOT_PASSWORD"),
            (&mut self.reply_url, "WISPBOT_REPLY_URL"),
        ] {
            if field.is_empty()
                && let Ok(value) = env::var(var)
            {
                *field = value;
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (value, name) in [
            (&self.host, "host"),
            (&self.username, "username (or WISPBOT_USERNAME)"),
            (&self.password, "password (or WISPBOT_PASSWORD)"),
            (&self.reply_url, "reply_url (or WISPBOT_REPLY_URL)"),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("missing required config field: {name}");
            }
        }
        Ok(())
    }
}

fn resolve_config_path(relative_path: &str) -> anyhow::Result<PathBuf> {
    let rel = Path::new(relative_path);

    if let Some(root) = env::var_os("WISPBOT_CONFIG_DIR") {
        let candidate = PathBuf::from(root).join(rel);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    if let Ok(cwd) = env::current_dir() {
        let candidate = cwd.join(rel);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    // Repo convenience: <repo_root>/config/<relative_path>.
    // This crate typically lives at <repo_root>/crates/bot-core.
    let candidate = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .ok_or_else(|| anyhow::anyhow!("CARGO_MANIFEST_DIR has insufficient ancestors"))?
        .join("config")
        .join(rel);
    if candidate.is_file() {
        return Ok(candidate);
    }

    anyhow::bail!("Config file not found for {:?}", rel);
}

//! Private-message line parsing.

use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Whisper {
    pub sender: String,
    pub content: String,
}

fn whisper_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Only the keyword is case-insensitive; sender names are word characters.
    RE.get_or_init(|| {
        Regex::new(r"^(\w+) (?i:whispers): (.*)$").expect("static whisper pattern is valid")
    })
}

/// Matches the platform's private-message line, e.g.
/// `_greg05 whispers: hello there`. Anything else (public chat, server
/// notices, system lines) yields `None` and is dropped upstream.
pub fn parse_whisper(line: &str) -> Option<Whisper> {
    let caps = whisper_re().captures(line)?;
    Some(Whisper {
        sender: caps[1].to_string(),
        content: caps[2].to_string(),
    })
}

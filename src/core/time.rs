//! Timestamps, event ids, and the envelope around `--format json` output.

use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};
use ulid::Ulid;

pub const ENVELOPE_VERSION: &str = "1.0.0";

/// Unix-epoch seconds with a `Z` suffix, e.g. `1771220592Z`.
pub fn now_epoch_z() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{}Z", secs)
}

pub fn new_event_id() -> String {
    Ulid::new().to_string()
}

/// JSON response for a learner-scoped read.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<'a, T: Serialize> {
    pub envelope_version: &'static str,
    pub ts: String,
    pub event_id: String,
    pub cmd: &'a str,
    pub status: &'a str,
    pub learner: &'a str,
    pub data: T,
}

impl<'a, T: Serialize> Envelope<'a, T> {
    pub fn ok(cmd: &'a str, learner: &'a str, data: T) -> Self {
        Self {
            envelope_version: ENVELOPE_VERSION,
            ts: now_epoch_z(),
            event_id: new_event_id(),
            cmd,
            status: "ok",
            learner,
            data,
        }
    }
}

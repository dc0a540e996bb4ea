use serde::{Deserialize, Serialize};

use crate::timer::{SessionType, TimerState};

/// Immutable view of the timer at the moment an event was emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub state: TimerState,
    /// `None` while idle.
    #[serde(rename = "type")]
    pub session_type: Option<SessionType>,
    /// Seconds.
    pub duration: u64,
    pub time_remaining: u64,
    pub session_count: u32,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerEventKind {
    Start,
    Pause,
    Resume,
    Tick,
    Complete,
    Stop,
    Reset,
    Restore,
}

/// Every state change and every tick of the timer produces a TimerEvent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerEvent {
    pub kind: TimerEventKind,
    pub snapshot: TimerSnapshot,
}

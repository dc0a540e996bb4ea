use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of interval tracked by the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionType {
    Work,
    Break,
    LongBreak,
}

impl SessionType {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionType::Work => "work",
            SessionType::Break => "break",
            SessionType::LongBreak => "long-break",
        }
    }

    /// Title and message of the system notification shown when a session
    /// of this type completes.
    pub fn completion_notice(self) -> (&'static str, &'static str) {
        match self {
            SessionType::Work => ("Work session complete", "Nice focus! Time to take a break."),
            SessionType::Break => ("Break is over", "Ready to get back to work?"),
            SessionType::LongBreak => ("Long break is over", "Recharged? Let's start a new cycle."),
        }
    }
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SessionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" => Ok(SessionType::Work),
            "break" => Ok(SessionType::Break),
            "long-break" | "long_break" | "longbreak" => Ok(SessionType::LongBreak),
            other => Err(format!("unknown session type: {other}")),
        }
    }
}

/// Persisted form of the current session (`currentSession` store key).
///
/// `time_remaining` is rewritten on every tick. `duration`, `paused` and
/// `last_tick` are carried so the timer can be rebuilt after a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    #[serde(rename = "type")]
    pub session_type: SessionType,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    pub time_remaining: u64,
    pub is_active: bool,
    /// Full countdown length in seconds.
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub paused: bool,
    /// Wall-clock time the countdown is accounted up to. Advances by one
    /// second per tick and is reset on resume.
    #[serde(default)]
    pub last_tick: Option<DateTime<Utc>>,
}

impl Session {
    /// Blocking applies while a work session is running or paused.
    pub fn is_active_work(&self) -> bool {
        self.is_active && self.session_type == SessionType::Work
    }

    /// Whole seconds of countdown owed at `now`. Zero while paused or
    /// inactive.
    pub fn seconds_behind(&self, now: DateTime<Utc>) -> u64 {
        if !self.is_active || self.paused {
            return 0;
        }
        let since = self.last_tick.unwrap_or(self.start_time);
        u64::try_from((now - since).num_seconds()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_type_uses_kebab_case_on_the_wire() {
        assert_eq!(
            serde_json::to_string(&SessionType::LongBreak).unwrap(),
            "\"long-break\""
        );
        let parsed: SessionType = serde_json::from_str("\"work\"").unwrap();
        assert_eq!(parsed, SessionType::Work);
    }

    #[test]
    fn session_type_parses_cli_spellings() {
        assert_eq!("long_break".parse::<SessionType>(), Ok(SessionType::LongBreak));
        assert!("nap".parse::<SessionType>().is_err());
    }

    #[test]
    fn session_reads_minimal_record() {
        let json = r#"{
            "id": "s-1",
            "type": "break",
            "startTime": "2026-01-01T10:00:00Z",
            "timeRemaining": 120,
            "isActive": true
        }"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.session_type, SessionType::Break);
        assert!(session.end_time.is_none());
        assert!(!session.completed);
        assert!(!session.is_active_work());
        assert!(session.last_tick.is_none());
    }

    #[test]
    fn seconds_behind_counts_from_last_tick() {
        let start: DateTime<Utc> = "2026-01-01T10:00:00Z".parse().unwrap();
        let mut session = Session {
            id: "s-1".into(),
            session_type: SessionType::Work,
            start_time: start,
            end_time: None,
            completed: false,
            time_remaining: 1500,
            is_active: true,
            duration: 1500,
            paused: false,
            last_tick: None,
        };
        let now = start + chrono::Duration::seconds(90);
        assert_eq!(session.seconds_behind(now), 90);

        session.last_tick = Some(start + chrono::Duration::seconds(80));
        assert_eq!(session.seconds_behind(now), 10);
        // Clock went backwards.
        assert_eq!(session.seconds_behind(start), 0);

        session.paused = true;
        assert_eq!(session.seconds_behind(now), 0);
    }
}

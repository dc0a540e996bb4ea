use super::SessionType;
use crate::settings::Settings;

/// What the timer does after a session completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: SessionType,
    pub auto_start: bool,
}

/// Pick the session that follows `completed`.
///
/// `work_sessions` is the number of work sessions completed so far,
/// including `completed` when it was a work session.
pub fn next_transition(completed: SessionType, work_sessions: u32, settings: &Settings) -> Transition {
    match completed {
        SessionType::Work => {
            let every = settings.sessions_before_long_break.max(1);
            let next = if work_sessions > 0 && work_sessions % every == 0 {
                SessionType::LongBreak
            } else {
                SessionType::Break
            };
            Transition {
                next,
                auto_start: settings.auto_start_breaks,
            }
        }
        SessionType::Break | SessionType::LongBreak => Transition {
            next: SessionType::Work,
            auto_start: settings.auto_start_pomodoros,
        },
    }
}

//! Per-user timer settings (`settings` store key).

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::timer::SessionType;

/// Sound played when a session completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationSound {
    None,
    Bell,
    Chime,
    Digital,
}

impl std::str::FromStr for NotificationSound {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "bell" => Ok(Self::Bell),
            "chime" => Ok(Self::Chime),
            "digital" => Ok(Self::Digital),
            other => Err(format!("unknown sound: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Minutes.
    #[serde(default = "default_work_duration")]
    pub work_duration: u32,
    #[serde(default = "default_break_duration")]
    pub break_duration: u32,
    #[serde(default = "default_long_break_duration")]
    pub long_break_duration: u32,
    #[serde(default = "default_sessions_before_long_break")]
    pub sessions_before_long_break: u32,
    #[serde(default)]
    pub auto_start_breaks: bool,
    #[serde(default)]
    pub auto_start_pomodoros: bool,
    #[serde(default = "default_sound")]
    pub notification_sound: NotificationSound,
    /// 0..=100
    #[serde(default = "default_volume")]
    pub notification_volume: u8,
}

fn default_work_duration() -> u32 {
    25
}
fn default_break_duration() -> u32 {
    5
}
fn default_long_break_duration() -> u32 {
    15
}
fn default_sessions_before_long_break() -> u32 {
    4
}
fn default_sound() -> NotificationSound {
    NotificationSound::Bell
}
fn default_volume() -> u8 {
    50
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_duration: default_work_duration(),
            break_duration: default_break_duration(),
            long_break_duration: default_long_break_duration(),
            sessions_before_long_break: default_sessions_before_long_break(),
            auto_start_breaks: false,
            auto_start_pomodoros: false,
            notification_sound: default_sound(),
            notification_volume: default_volume(),
        }
    }
}

const MAX_DURATION_MIN: u64 = 24 * 60;

impl Settings {
    /// Configured minutes for the given session type.
    pub fn minutes_for(&self, session_type: SessionType) -> u32 {
        match session_type {
            SessionType::Work => self.work_duration,
            SessionType::Break => self.break_duration,
            SessionType::LongBreak => self.long_break_duration,
        }
    }

    /// Countdown length in seconds for the given session type.
    pub fn duration_secs(&self, session_type: SessionType) -> u64 {
        u64::from(self.minutes_for(session_type)).saturating_mul(60)
    }

    /// Whether completion should make any sound at all.
    pub fn sound_enabled(&self) -> bool {
        self.notification_sound != NotificationSound::None && self.notification_volume > 0
    }

    /// Reject values the timer cannot work with.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("workDuration", self.work_duration),
            ("breakDuration", self.break_duration),
            ("longBreakDuration", self.long_break_duration),
        ] {
            check_range(field, u64::from(value), 1, MAX_DURATION_MIN)?;
        }
        check_range(
            "sessionsBeforeLongBreak",
            u64::from(self.sessions_before_long_break),
            1,
            100,
        )?;
        check_range("notificationVolume", u64::from(self.notification_volume), 0, 100)?;
        Ok(())
    }
}

fn check_range(field: &'static str, value: u64, min: u64, max: u64) -> Result<(), ValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            value,
        })
    }
}

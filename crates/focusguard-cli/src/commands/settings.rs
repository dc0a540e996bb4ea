use clap::Subcommand;
use focusguard_core::{Config, Settings};

use super::{open_store, print_json, CommandResult};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print the stored settings as JSON
    Show,
    /// Change one setting
    Set {
        /// Setting name (e.g. "workDuration", "autoStartBreaks")
        key: String,
        /// New value
        value: String,
    },
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("invalid value for {key}: {value}"))
}

fn apply(settings: &mut Settings, key: &str, value: &str) -> Result<(), String> {
    match key {
        "workDuration" => settings.work_duration = parse(key, value)?,
        "breakDuration" => settings.break_duration = parse(key, value)?,
        "longBreakDuration" => settings.long_break_duration = parse(key, value)?,
        "sessionsBeforeLongBreak" => settings.sessions_before_long_break = parse(key, value)?,
        "autoStartBreaks" => settings.auto_start_breaks = parse(key, value)?,
        "autoStartPomodoros" => settings.auto_start_pomodoros = parse(key, value)?,
        "notificationSound" => settings.notification_sound = value.parse()?,
        "notificationVolume" => settings.notification_volume = parse(key, value)?,
        other => return Err(format!("unknown setting: {other}")),
    }
    Ok(())
}

pub fn run(action: SettingsAction) -> CommandResult {
    let config = Config::load_or_default();
    let store = open_store(&config)?;

    match action {
        SettingsAction::Show => {
            print_json(&store.settings_or(&config.defaults))?;
        }
        SettingsAction::Set { key, value } => {
            let mut settings = store.settings_or(&config.defaults);
            apply(&mut settings, &key, &value)?;
            store.set_settings(&settings)?;
            print_json(&settings)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use focusguard_core::NotificationSound;

    #[test]
    fn applies_known_keys() {
        let mut settings = Settings::default();
        apply(&mut settings, "workDuration", "50").unwrap();
        apply(&mut settings, "autoStartBreaks", "true").unwrap();
        apply(&mut settings, "notificationSound", "chime").unwrap();
        assert_eq!(settings.work_duration, 50);
        assert!(settings.auto_start_breaks);
        assert_eq!(settings.notification_sound, NotificationSound::Chime);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        let mut settings = Settings::default();
        assert!(apply(&mut settings, "theme", "dark").is_err());
        assert!(apply(&mut settings, "workDuration", "soon").is_err());
        assert!(apply(&mut settings, "notificationVolume", "300").is_err());
        assert_eq!(settings, Settings::default());
    }
}

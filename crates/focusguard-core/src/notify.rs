//! Completion sound and system notification sink.

use crate::settings::NotificationSound;

pub trait Notifier: Send {
    /// Play the completion sound. Never called for `NotificationSound::None`
    /// or a volume of 0.
    fn play_sound(&mut self, sound: NotificationSound, volume: u8);

    /// Show a system notification.
    fn notify(&mut self, title: &str, message: &str);
}

/// Notifier that only writes to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn play_sound(&mut self, sound: NotificationSound, volume: u8) {
        tracing::info!(?sound, volume, "completion sound");
    }

    fn notify(&mut self, title: &str, message: &str) {
        tracing::info!(%title, %message, "notification");
    }
}

//! Session timer engine.
//!
//! The timer is a tick-driven state machine. It does not use internal
//! threads: the owner calls `tick()` once per second, and each tick takes
//! exactly one second off the countdown.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!         Running -> Completed -> (Running | Idle)
//! any -> Idle on stop()
//! ```
//!
//! Every transition and every tick is persisted to the `currentSession`
//! store key and emitted to listeners. Commands that are not valid in the
//! current state return `None` without side effects. The completed
//! work-session count is kept under its own store key so it outlives the
//! session and the process.
//!
//! A timer rebuilt with `restore()` replays one tick for every whole second
//! of wall-clock time that passed since the session was last ticked.
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = SessionTimer::new(store, Box::new(OfflineBackend), Box::new(LogNotifier));
//! timer.start(SessionType::Work);
//! // Once per second:
//! timer.tick();
//! ```

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::listeners::{Listener, ListenerId, Listeners};
use super::policy::next_transition;
use super::session::{Session, SessionType};
use crate::backend::SessionBackend;
use crate::events::{TimerEvent, TimerEventKind, TimerSnapshot};
use crate::notify::Notifier;
use crate::settings::Settings;
use crate::storage::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Completed,
}

/// Core timer engine. Owns the current session; the store only mirrors it.
pub struct SessionTimer {
    store: Arc<Store>,
    backend: Box<dyn SessionBackend>,
    notifier: Box<dyn Notifier>,
    /// Used when the store has no settings or cannot be read.
    defaults: Settings,
    /// Used when the store cannot produce a user id.
    fallback_user_id: String,
    listeners: Listeners,
    state: TimerState,
    session: Option<Session>,
    /// Completed work sessions, mirrored to the `sessionCount` store key.
    session_count: u32,
}

impl SessionTimer {
    /// Create an idle timer, continuing the stored work-session count.
    pub fn new(
        store: Arc<Store>,
        backend: Box<dyn SessionBackend>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let session_count = store.session_count().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read session count, starting from 0");
            0
        });
        Self {
            store,
            backend,
            notifier,
            defaults: Settings::default(),
            fallback_user_id: uuid::Uuid::new_v4().to_string(),
            listeners: Listeners::default(),
            state: TimerState::Idle,
            session: None,
            session_count,
        }
    }

    pub fn with_defaults(mut self, defaults: Settings) -> Self {
        self.defaults = defaults;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_count(&self) -> u32 {
        self.session_count
    }

    pub fn time_remaining(&self) -> u64 {
        self.session.as_ref().map(|s| s.time_remaining).unwrap_or(0)
    }

    /// Current immutable view of the timer.
    pub fn snapshot(&self) -> TimerSnapshot {
        let session = self.session.as_ref();
        TimerSnapshot {
            state: self.state,
            session_type: session.map(|s| s.session_type),
            duration: session.map(|s| s.duration).unwrap_or(0),
            time_remaining: session.map(|s| s.time_remaining).unwrap_or(0),
            session_count: self.session_count,
            session_id: session.map(|s| s.id.clone()),
        }
    }

    // ── Listeners ────────────────────────────────────────────────────

    pub fn subscribe(&mut self, listener: Listener) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a new session of `session_type`.
    ///
    /// Accepted from `Idle` and `Completed`. If the backend refuses to
    /// create the session, the failure is logged and nothing changes.
    pub fn start(&mut self, session_type: SessionType) -> Option<TimerEvent> {
        if !matches!(self.state, TimerState::Idle | TimerState::Completed) {
            tracing::debug!(state = ?self.state, "start ignored");
            return None;
        }

        let settings = self.settings();
        let user_id = self.user_id();
        let remote = match self.backend.start_session(&user_id, session_type) {
            Ok(remote) => remote,
            Err(e) => {
                tracing::error!(error = %e, %session_type, "failed to start session");
                return None;
            }
        };

        let duration = settings.duration_secs(session_type);
        let start_time = Utc::now();
        self.session = Some(Session {
            id: remote.id,
            session_type,
            start_time,
            end_time: None,
            completed: false,
            time_remaining: duration,
            is_active: true,
            duration,
            paused: false,
            last_tick: Some(start_time),
        });
        self.state = TimerState::Running;
        tracing::info!(%session_type, duration, "session started");

        self.persist();
        Some(self.emit(TimerEventKind::Start))
    }

    pub fn pause(&mut self) -> Option<TimerEvent> {
        if self.state != TimerState::Running {
            return None;
        }
        let session = self.session.as_mut()?;
        session.paused = true;
        self.state = TimerState::Paused;
        tracing::info!(remaining = session.time_remaining, "session paused");

        self.persist();
        Some(self.emit(TimerEventKind::Pause))
    }

    pub fn resume(&mut self) -> Option<TimerEvent> {
        if self.state != TimerState::Paused {
            return None;
        }
        let session = self.session.as_mut()?;
        session.paused = false;
        // Time spent paused is not owed to the countdown.
        session.last_tick = Some(Utc::now());
        self.state = TimerState::Running;
        tracing::info!(remaining = session.time_remaining, "session resumed");

        self.persist();
        Some(self.emit(TimerEventKind::Resume))
    }

    /// Cancel whatever is going on and return to `Idle`.
    ///
    /// The backend record is finalized; a backend failure is logged but
    /// never prevents the stop.
    pub fn stop(&mut self) -> Option<TimerEvent> {
        if self.state == TimerState::Idle && self.session.is_none() {
            return None;
        }

        if let Some(mut session) = self.session.take() {
            if !session.completed {
                if let Err(e) = self.backend.complete_session(&session.id) {
                    tracing::warn!(error = %e, session_id = %session.id, "failed to finalize stopped session");
                }
            }
            session.completed = true;
            session.is_active = false;
            session.end_time.get_or_insert_with(Utc::now);
            tracing::info!(
                session_id = %session.id,
                session_type = %session.session_type,
                remaining = session.time_remaining,
                "session stopped"
            );
        }
        self.state = TimerState::Idle;

        self.persist();
        Some(self.emit(TimerEventKind::Stop))
    }

    /// Advance the countdown by one second.
    ///
    /// Returns the tick event, or the completion event when this tick
    /// finished the session. No-op unless running.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        self.advance(true)
    }

    /// One second of countdown. Intermediate ticks skip the store write
    /// when `persist_each` is false; reaching zero always persists.
    fn advance(&mut self, persist_each: bool) -> Option<TimerEvent> {
        if self.state != TimerState::Running {
            return None;
        }
        let session = self.session.as_mut()?;
        session.time_remaining = session.time_remaining.saturating_sub(1);
        let since = session.last_tick.unwrap_or(session.start_time);
        session.last_tick = Some(since + chrono::Duration::seconds(1));

        if session.time_remaining > 0 {
            tracing::debug!(remaining = session.time_remaining, "tick");
            if persist_each {
                self.persist();
            }
            return Some(self.emit(TimerEventKind::Tick));
        }

        // Reached zero: the state change happens within this tick.
        session.is_active = false;
        session.paused = false;
        self.state = TimerState::Completed;
        self.persist();
        let expired = self.emit(TimerEventKind::Tick);

        Some(self.finish().unwrap_or(expired))
    }

    /// Rebuild the machine from the `currentSession` left in the store by a
    /// previous owner. Only valid while idle.
    ///
    /// A running session catches up on the wall-clock seconds that passed,
    /// one tick each, and may complete and auto-transition while doing so.
    /// A session whose completion was never finalized is restored as
    /// `Completed` and finalized again.
    pub fn restore(&mut self) -> Option<TimerEvent> {
        if self.state != TimerState::Idle || self.session.is_some() {
            return None;
        }
        let mut session = match self.store.current_session() {
            Ok(Some(session)) if !session.completed => session,
            Ok(_) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read persisted session");
                return None;
            }
        };

        // Records written without a duration still satisfy the invariant.
        session.duration = session.duration.max(session.time_remaining);
        self.state = if !session.is_active {
            TimerState::Completed
        } else if session.paused {
            TimerState::Paused
        } else {
            TimerState::Running
        };
        tracing::info!(
            session_id = %session.id,
            session_type = %session.session_type,
            remaining = session.time_remaining,
            state = ?self.state,
            "session restored"
        );
        self.session = Some(session);
        let restored = self.emit(TimerEventKind::Restore);

        if self.state == TimerState::Completed {
            self.finish();
        } else {
            self.catch_up();
        }
        Some(restored)
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Tick once per whole second owed by the running session.
    fn catch_up(&mut self) {
        let now = Utc::now();
        let mut replayed = 0u64;
        while self.state == TimerState::Running {
            let behind = self.session.as_ref().map_or(0, |s| s.seconds_behind(now));
            if behind == 0 {
                break;
            }
            self.advance(false);
            replayed += 1;
        }
        if replayed > 0 {
            self.persist();
            tracing::info!(replayed, "caught up on elapsed time");
        }
    }

    /// Completion side effects and the auto-transition decision.
    ///
    /// Returns `None` if the backend could not finalize the session; the
    /// machine then stays in `Completed`.
    fn finish(&mut self) -> Option<TimerEvent> {
        let settings = self.settings();
        let session = self.session.as_mut()?;
        let completed_type = session.session_type;

        if let Err(e) = self.backend.complete_session(&session.id) {
            tracing::error!(error = %e, session_id = %session.id, "failed to complete session");
            return None;
        }

        session.completed = true;
        session.end_time = Some(Utc::now());
        if completed_type == SessionType::Work {
            self.session_count += 1;
            if let Err(e) = self.store.set_session_count(self.session_count) {
                tracing::warn!(error = %e, "failed to persist session count");
            }
        }
        tracing::info!(
            session_id = %session.id,
            session_type = %completed_type,
            session_count = self.session_count,
            "session completed"
        );
        self.persist();

        if settings.sound_enabled() {
            self.notifier
                .play_sound(settings.notification_sound, settings.notification_volume);
        }
        let (title, message) = completed_type.completion_notice();
        self.notifier.notify(title, message);
        let complete = self.emit(TimerEventKind::Complete);

        let transition = next_transition(completed_type, self.session_count, &settings);
        tracing::debug!(next = %transition.next, auto_start = transition.auto_start, "next session");
        if transition.auto_start && self.start(transition.next).is_some() {
            return Some(complete);
        }

        self.session = None;
        self.state = TimerState::Idle;
        self.persist();
        self.emit(TimerEventKind::Reset);
        Some(complete)
    }

    fn settings(&self) -> Settings {
        self.store.settings_or(&self.defaults)
    }

    fn user_id(&self) -> String {
        self.store.ensure_user_id().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read user id, using in-memory id");
            self.fallback_user_id.clone()
        })
    }

    fn persist(&self) {
        if let Err(e) = self.store.set_current_session(self.session.as_ref()) {
            tracing::warn!(error = %e, "failed to persist session state");
        }
    }

    fn emit(&mut self, kind: TimerEventKind) -> TimerEvent {
        let event = TimerEvent {
            kind,
            snapshot: self.snapshot(),
        };
        self.listeners.emit(&event);
        event
    }
}

impl std::fmt::Debug for SessionTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTimer")
            .field("state", &self.state)
            .field("session", &self.session)
            .field("session_count", &self.session_count)
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}

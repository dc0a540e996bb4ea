//! # Focusguard Core Library
//!
//! Core logic for Focusguard, a work/break timer that blocks distracting
//! sites during work sessions and tracks where browsing time goes. The CLI
//! is a thin layer over this library.
//!
//! ## Architecture
//!
//! - **Timer**: a tick-driven session state machine that persists its
//!   current session on every change and emits snapshot events
//! - **Storage**: a strongly-typed key-value store with change
//!   notifications, backed by SQLite, plus TOML configuration
//! - **Blocking**: navigation monitor and page overlay that follow the
//!   shared session state through store notifications
//! - **Visits / Analytics**: visit logging, URL categorization and totals
//!
//! ## Key Components
//!
//! - [`SessionTimer`]: Core timer state machine
//! - [`Store`]: Typed key-value store (`userId`, `settings`, `blockedSites`,
//!   `currentSession`)
//! - [`NavigationMonitor`] / [`OverlayController`]: blocking decisions
//! - [`SessionBackend`]: Trait for the sessions API

pub mod analytics;
pub mod backend;
pub mod blocking;
pub mod error;
pub mod events;
pub mod notify;
pub mod settings;
pub mod storage;
pub mod timer;
pub mod visits;

pub use backend::{HttpBackend, OfflineBackend, RemoteSession, SessionBackend};
pub use blocking::{BlockedSite, NavigationMonitor, OverlayController, SharedSessionState, BLOCKED_PAGE};
pub use error::{BackendError, ConfigError, CoreError, StoreError, ValidationError};
pub use events::{TimerEvent, TimerEventKind, TimerSnapshot};
pub use notify::{LogNotifier, Notifier};
pub use settings::{NotificationSound, Settings};
pub use storage::{Config, Database, SharedDatabase, Store, StoreChange, StoreKey};
pub use timer::{Session, SessionTimer, SessionType, TimerState};
pub use visits::{categorize_url, Category, VisitRecord, VisitTracker};

mod engine;
mod listeners;
mod policy;
mod session;

pub use engine::{SessionTimer, TimerState};
pub use listeners::{Listener, ListenerId};
pub use policy::{next_transition, Transition};
pub use session::{Session, SessionType};

// Library surface for the game core, the terminal front end and headless tests.
pub mod app;
pub mod app_dirs;
pub mod audio;
pub mod config;
pub mod controller;
pub mod countdown;
pub mod error;
pub mod runtime;
pub mod session;
pub mod target;
pub mod ui;

pub use audio::Cue;
pub use controller::{SessionController, SessionEvent};
pub use error::TapError;
pub use session::{GameSession, SessionConfig, SessionSnapshot, TickOutcome};

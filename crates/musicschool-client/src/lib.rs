//! Client services of the music school practice companion.
//!
//! Each service wraps the backend traits from `musicschool-backend`, keeps
//! its UI-facing state in [`subscription::Observable`] values and degrades
//! to cached or empty results when the backend is unreachable. The
//! [`commands`] module is the user-facing surface used by the shell.

pub mod auth;
pub mod clock;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod groups;
pub mod names;
pub mod performances;
pub mod profile;
pub mod state;
pub mod study_log;
pub mod subscription;
pub mod timer;

mod error;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use state::{AppState, Backend};

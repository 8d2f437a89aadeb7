//! Data models for Bé Vui Học.
//!
//! - [`AppState`]: top-level flow state (screen, student, subject, final score)
//!   and its pure transition function
//! - [`Student`], [`Subject`], [`Question`]: registration and quiz content
//! - [`ResultSummary`]: what the results screen displays
//! - [`AppSettings`]: settings loaded from `settings.yaml`
//!
//! State updates go through [`StateManager`](crate::state::StateManager), which
//! applies [`FlowEvent`]s and emits change events.

pub mod app_state;
pub mod config;
pub mod quiz;
pub mod results;

pub use app_state::{AppState, FlowError, FlowEvent, Screen};
pub use config::{ApiSettings, AppSettings, AudioSettings, LoggingSettings};
pub use quiz::{OPTIONS_PER_QUESTION, Question, SUBJECTS, Student, Subject, ValidationError};
pub use results::{MAX_SCORE, ResultSummary};

// Bé Vui Học - timed AI-generated quizzes for primary school students
//
// This is the library crate containing the quiz engine, flow state, services
// and UI wiring. The binary crate (main.rs) provides the GUI entry point.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod session;
pub mod state;
pub mod ui;

// Re-export commonly used types for convenience
pub use config::{ConfigError, ConfigManager, LoadedSettings};
pub use metrics::QuizMetrics;
pub use models::{AppSettings, AppState, FlowEvent, Question, Screen};
pub use session::{QuizSession, SessionEvent, SessionHandle, SessionRunner};
pub use state::{StateChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

// UI module - Slint window, event loop bridge and presentation helpers
//
// This module contains:
// - EventLoopBridge: Coordinates between the tokio runtime and the Slint event loop
// - GuiController: Wires the window to flow state and quiz sessions
// - view: Option highlighting, progress and confetti, independent of Slint

pub mod bridge;
pub mod controller;
pub mod view;

pub use bridge::EventLoopBridge;
pub use controller::{GuiController, MainWindow, QuizServices};

// State management module
//
// This module provides the StateManager which wraps the flow state with thread-safe
// access using Arc<RwLock<T>> and emits change events for GUI updates.

use crate::models::{AppState, FlowError, FlowEvent, Screen};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when the flow state is modified
///
/// These events let the GUI switch screens and start or tear down quiz sessions
/// without polling the state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// The visible screen changed
    ScreenChanged { from: Screen, to: Screen },

    /// A student was registered on the welcome screen
    StudentRegistered { name: String, class_name: String },

    /// A subject was chosen and a quiz is about to start
    SubjectSelected { subject: String },

    /// A quiz session finished
    QuizCompleted { score: u32 },

    /// The student chose to play again from the results screen
    Replayed,
}

/// Thread-safe flow state manager with event emission
///
/// - [`read()`](Self::read) / [`snapshot()`](Self::snapshot) for reading
/// - [`dispatch()`](Self::dispatch) to apply a [`FlowEvent`] through
///   [`AppState::apply`]
/// - [`subscribe()`](Self::subscribe) for listening to state changes
pub struct StateManager {
    state: Arc<RwLock<AppState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager on the welcome screen
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            state_tx,
        }
    }

    /// Clone of the current state
    pub fn snapshot(&self) -> AppState {
        self.read(|s| s.clone())
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let screen = state_manager.read(|state| state.screen);
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        f(&state)
    }

    /// Apply a flow event and emit change events
    ///
    /// The transition is computed by [`AppState::apply`]. On error the state is
    /// left untouched and nothing is emitted.
    ///
    /// # Returns
    /// The emitted StateChange events
    pub fn dispatch(&self, event: FlowEvent) -> Result<Vec<StateChange>, FlowError> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());

        let next = match state.apply(event) {
            Ok(next) => next,
            Err(e) => {
                tracing::warn!("Rejected flow event on {} screen: {}", state.screen, e);
                return Err(e);
            }
        };

        let changes = Self::detect_changes(&state, &next);
        *state = next;
        drop(state);

        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = self.state_tx.send(change.clone());
        }

        Ok(changes)
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    /// Work out which events describe the move from `old` to `new`.
    ///
    /// Detail events come first, the screen change last, so a subscriber that
    /// reacts to `ScreenChanged` sees the complete new state.
    fn detect_changes(old: &AppState, new: &AppState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.student != new.student {
            if let Some(student) = &new.student {
                changes.push(StateChange::StudentRegistered {
                    name: student.name.clone(),
                    class_name: student.class_name.clone(),
                });
            }
        }

        if old.selected_subject != new.selected_subject {
            if let Some(subject) = &new.selected_subject {
                changes.push(StateChange::SubjectSelected {
                    subject: subject.clone(),
                });
            }
        }

        match (old.screen, new.screen) {
            (Screen::Quiz, Screen::Results) => {
                changes.push(StateChange::QuizCompleted {
                    score: new.final_score,
                });
            }
            (Screen::Results, Screen::SubjectSelection) => {
                changes.push(StateChange::Replayed);
            }
            _ => {}
        }

        if old.screen != new.screen {
            changes.push(StateChange::ScreenChanged {
                from: old.screen,
                to: new.screen,
            });
        }

        changes
    }

    // Convenience methods for the GUI callbacks

    pub fn submit_student(&self, name: &str, class_name: &str) -> Result<Vec<StateChange>, FlowError> {
        self.dispatch(FlowEvent::StudentSubmitted {
            name: name.to_string(),
            class_name: class_name.to_string(),
        })
    }

    pub fn select_subject(&self, subject: &str) -> Result<Vec<StateChange>, FlowError> {
        self.dispatch(FlowEvent::SubjectSelected {
            subject: subject.to_string(),
        })
    }

    pub fn complete_quiz(&self, score: u32) -> Result<Vec<StateChange>, FlowError> {
        self.dispatch(FlowEvent::QuizCompleted { score })
    }

    pub fn play_again(&self) -> Result<Vec<StateChange>, FlowError> {
        self.dispatch(FlowEvent::PlayAgain)
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Make StateManager cloneable for sharing across threads
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registered() -> StateManager {
        let manager = StateManager::new();
        manager.submit_student("An", "2A").unwrap();
        manager
    }

    #[test]
    fn test_new_state_manager() {
        let manager = StateManager::new();
        let state = manager.snapshot();

        assert_eq!(state.screen, Screen::Welcome);
        assert!(state.student.is_none());
        assert_eq!(state.final_score, 0);
    }

    #[test]
    fn test_submit_student_events() {
        let manager = StateManager::new();

        let changes = manager.submit_student(" An ", "2A").unwrap();

        assert_eq!(changes.len(), 2);
        assert_eq!(
            changes[0],
            StateChange::StudentRegistered {
                name: "An".to_string(),
                class_name: "2A".to_string()
            }
        );
        assert_eq!(
            changes[1],
            StateChange::ScreenChanged {
                from: Screen::Welcome,
                to: Screen::SubjectSelection
            }
        );
    }

    #[test]
    fn test_select_subject_events() {
        let manager = registered();

        let changes = manager.select_subject("Tiếng Việt").unwrap();

        assert!(matches!(changes[0], StateChange::SubjectSelected { .. }));
        assert!(matches!(
            changes[1],
            StateChange::ScreenChanged { to: Screen::Quiz, .. }
        ));
        assert_eq!(manager.read(|s| s.selected_subject.clone()).as_deref(), Some("Tiếng Việt"));
    }

    #[test]
    fn test_complete_and_replay() {
        let manager = registered();
        manager.select_subject("Toán").unwrap();

        let changes = manager.complete_quiz(29).unwrap();
        assert_eq!(changes[0], StateChange::QuizCompleted { score: 29 });
        assert_eq!(manager.read(|s| s.final_score), 29);

        let changes = manager.play_again().unwrap();
        assert_eq!(changes[0], StateChange::Replayed);

        let state = manager.snapshot();
        assert_eq!(state.screen, Screen::SubjectSelection);
        assert_eq!(state.final_score, 0);
        assert!(state.selected_subject.is_none());
        assert_eq!(state.student_name(), Some("An"));
    }

    #[test]
    fn test_rejected_event_leaves_state_and_emits_nothing() {
        let manager = StateManager::new();
        let mut rx = manager.subscribe();

        assert!(manager.play_again().is_err());
        assert!(manager.submit_student("", "2A").is_err());

        assert!(rx.try_recv().is_err());
        assert_eq!(manager.snapshot(), AppState::default());
    }

    #[test]
    fn test_subscribe_to_changes() {
        let manager = StateManager::new();
        let mut rx = manager.subscribe();

        manager.submit_student("An", "2A").unwrap();

        let event = rx.try_recv();
        assert!(matches!(event, Ok(StateChange::StudentRegistered { .. })));
    }

    #[test]
    fn test_clone_shares_state() {
        let manager1 = StateManager::new();
        let manager2 = manager1.clone();

        manager1.submit_student("An", "2A").unwrap();

        assert_eq!(manager2.read(|s| s.screen), Screen::SubjectSelection);
    }
}

use crate::models::quiz::{Student, Subject, ValidationError};
use crate::models::results::MAX_SCORE;
use std::fmt;
use thiserror::Error;

/// The four screens of the application, in flow order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Welcome,
    SubjectSelection,
    Quiz,
    Results,
}

impl Screen {
    /// Index used by the Slint `screen` property.
    pub fn index(self) -> i32 {
        match self {
            Screen::Welcome => 0,
            Screen::SubjectSelection => 1,
            Screen::Quiz => 2,
            Screen::Results => 3,
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Screen::Welcome => "welcome",
            Screen::SubjectSelection => "subject_selection",
            Screen::Quiz => "quiz",
            Screen::Results => "results",
        };
        f.write_str(name)
    }
}

/// Inputs that move the application between screens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowEvent {
    StudentSubmitted { name: String, class_name: String },
    SubjectSelected { subject: String },
    QuizCompleted { score: u32 },
    PlayAgain,
}

impl FlowEvent {
    fn name(&self) -> &'static str {
        match self {
            FlowEvent::StudentSubmitted { .. } => "student_submitted",
            FlowEvent::SubjectSelected { .. } => "subject_selected",
            FlowEvent::QuizCompleted { .. } => "quiz_completed",
            FlowEvent::PlayAgain => "play_again",
        }
    }
}

/// Rejected flow transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("Event '{event}' is not valid on the {screen} screen")]
    InvalidTransition { screen: Screen, event: &'static str },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Score {0} exceeds the maximum of {max}", max = MAX_SCORE)]
    ScoreOutOfRange(u32),
}

/// Top-level application state.
///
/// Never mutated in place by callers: [`AppState::apply`] computes the next
/// state, and [`crate::state::StateManager`] swaps it in and emits change
/// events.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppState {
    pub screen: Screen,
    pub student: Option<Student>,
    pub selected_subject: Option<String>,
    pub final_score: u32,
}

impl AppState {
    /// Compute the state that follows `event`.
    ///
    /// The flow is strictly linear apart from the results → subject selection
    /// replay edge, which keeps the student and clears subject and score.
    pub fn apply(&self, event: FlowEvent) -> Result<AppState, FlowError> {
        match (self.screen, event) {
            (Screen::Welcome, FlowEvent::StudentSubmitted { name, class_name }) => {
                let student = Student::new(&name, &class_name)?;
                Ok(AppState {
                    screen: Screen::SubjectSelection,
                    student: Some(student),
                    selected_subject: None,
                    final_score: 0,
                })
            }
            (Screen::SubjectSelection, FlowEvent::SubjectSelected { subject }) => {
                let subject = Subject::find(&subject)
                    .ok_or(ValidationError::UnknownSubject(subject))?;
                Ok(AppState {
                    screen: Screen::Quiz,
                    selected_subject: Some(subject.name.to_string()),
                    ..self.clone()
                })
            }
            (Screen::Quiz, FlowEvent::QuizCompleted { score }) => {
                if score > MAX_SCORE {
                    return Err(FlowError::ScoreOutOfRange(score));
                }
                Ok(AppState {
                    screen: Screen::Results,
                    final_score: score,
                    ..self.clone()
                })
            }
            (Screen::Results, FlowEvent::PlayAgain) => Ok(AppState {
                screen: Screen::SubjectSelection,
                student: self.student.clone(),
                selected_subject: None,
                final_score: 0,
            }),
            (screen, event) => Err(FlowError::InvalidTransition {
                screen,
                event: event.name(),
            }),
        }
    }

    pub fn student_name(&self) -> Option<&str> {
        self.student.as_ref().map(|s| s.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submitted() -> FlowEvent {
        FlowEvent::StudentSubmitted {
            name: "An".to_string(),
            class_name: "2A".to_string(),
        }
    }

    fn at_quiz() -> AppState {
        AppState::default()
            .apply(submitted())
            .unwrap()
            .apply(FlowEvent::SubjectSelected {
                subject: "Toán".to_string(),
            })
            .unwrap()
    }

    #[test]
    fn test_default_is_welcome() {
        let state = AppState::default();
        assert_eq!(state.screen, Screen::Welcome);
        assert!(state.student.is_none());
    }

    #[test]
    fn test_linear_flow() {
        let state = at_quiz();
        assert_eq!(state.screen, Screen::Quiz);
        assert_eq!(state.selected_subject.as_deref(), Some("Toán"));

        let state = state.apply(FlowEvent::QuizCompleted { score: 29 }).unwrap();
        assert_eq!(state.screen, Screen::Results);
        assert_eq!(state.final_score, 29);
    }

    #[test]
    fn test_replay_keeps_student() {
        let state = at_quiz()
            .apply(FlowEvent::QuizCompleted { score: 12 })
            .unwrap()
            .apply(FlowEvent::PlayAgain)
            .unwrap();

        assert_eq!(state.screen, Screen::SubjectSelection);
        assert_eq!(state.final_score, 0);
        assert!(state.selected_subject.is_none());
        assert_eq!(state.student_name(), Some("An"));
    }

    #[test]
    fn test_blank_student_rejected() {
        let err = AppState::default()
            .apply(FlowEvent::StudentSubmitted {
                name: " ".to_string(),
                class_name: "2A".to_string(),
            })
            .unwrap_err();
        assert_eq!(err, FlowError::Validation(ValidationError::MissingName));
    }

    #[test]
    fn test_no_back_navigation() {
        let err = at_quiz()
            .apply(FlowEvent::SubjectSelected {
                subject: "Tiếng Việt".to_string(),
            })
            .unwrap_err();
        assert!(matches!(
            err,
            FlowError::InvalidTransition {
                screen: Screen::Quiz,
                event: "subject_selected"
            }
        ));

        assert!(at_quiz().apply(submitted()).is_err());
        assert!(at_quiz().apply(FlowEvent::PlayAgain).is_err());
    }

    #[test]
    fn test_unknown_subject_rejected() {
        let state = AppState::default().apply(submitted()).unwrap();
        let err = state
            .apply(FlowEvent::SubjectSelected {
                subject: "Hóa học".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, FlowError::Validation(ValidationError::UnknownSubject(_))));
    }

    #[test]
    fn test_score_above_maximum_rejected() {
        let err = at_quiz()
            .apply(FlowEvent::QuizCompleted { score: 31 })
            .unwrap_err();
        assert_eq!(err, FlowError::ScoreOutOfRange(31));
    }
}

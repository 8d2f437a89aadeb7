// GUI Controller - Bridges the Slint window with flow state and quiz sessions
//
// Coordinates:
// - Slint UI (MainWindow, four screens)
// - StateManager (welcome -> subject selection -> quiz -> results)
// - SessionRunner (one tokio task per quiz)
// - EventLoopBridge (async/GUI coordination)
//
// Slint callbacks run on the main thread and own the current SessionHandle.
// Session events and state changes arrive on other threads and reach the
// window only through the bridge.

use crate::metrics::QuizMetrics;
use crate::models::{FlowError, Question, ResultSummary, SUBJECTS, ValidationError};
use crate::services::{AudioEvent, AudioSender, ContentProvider};
use crate::session::{SessionEvent, SessionHandle, SessionRunner};
use crate::state::{StateChange, StateManager};
use crate::ui::bridge::EventLoopBridge;
use crate::ui::view::{self, CONFETTI_PIECES, Confetti, FlowView, OptionState};
use anyhow::{Context, Result};
use slint::{Color, ComponentHandle, ModelRc, SharedString, VecModel};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;

// Include the generated Slint code
slint::include_modules!();

/// Long-lived dependencies handed to every quiz session
#[derive(Clone)]
pub struct QuizServices {
    pub provider: Arc<dyn ContentProvider>,
    pub audio: Option<AudioSender>,
    pub metrics: Arc<QuizMetrics>,
}

/// GUI Controller that wires the Slint window to application state
///
/// # Example
/// ```ignore
/// let state_manager = Arc::new(StateManager::new());
/// let services = QuizServices { provider, audio: Some(audio_tx), metrics };
/// let runtime = tokio::runtime::Runtime::new()?;
///
/// let controller = GuiController::new(state_manager, services, runtime.handle().clone())?;
/// controller.run()?;  // Blocks until window is closed
/// ```
pub struct GuiController {
    ui: MainWindow,

    _bridge: EventLoopBridge<MainWindow>,

    /// The quiz in progress, if any. Only touched on the UI thread.
    session: Rc<RefCell<Option<SessionHandle>>>,
}

impl GuiController {
    pub fn new(
        state_manager: Arc<StateManager>,
        services: QuizServices,
        tokio_handle: tokio::runtime::Handle,
    ) -> Result<Self> {
        let ui = MainWindow::new().context("Failed to create Slint UI")?;
        let bridge = EventLoopBridge::new(&ui, tokio_handle);
        let session = Rc::new(RefCell::new(None));

        Self::sync_ui_with_state(&ui, &state_manager);
        Self::setup_callbacks(&ui, &bridge, &state_manager, &services, &session);
        Self::setup_state_subscription(&bridge, &state_manager, services.audio.clone());

        tracing::info!("GUI controller initialized");

        Ok(Self {
            ui,
            _bridge: bridge,
            session,
        })
    }

    /// Run the GUI (blocks until window is closed), then tear down any quiz
    /// still running.
    pub fn run(self) -> Result<(), slint::PlatformError> {
        tracing::info!("Starting GUI event loop");
        let result = self.ui.run();
        self.shutdown();
        result
    }

    /// Cancel the running session. Its completion callback will not fire.
    pub fn shutdown(&self) {
        if let Some(handle) = self.session.borrow_mut().take() {
            if !handle.is_finished() {
                tracing::warn!("Window closed during a quiz - tearing the session down");
            }
            handle.cancel();
        }
    }

    fn sync_ui_with_state(ui: &MainWindow, state_manager: &StateManager) {
        let state = state_manager.snapshot();

        let subjects: Vec<SubjectItem> = SUBJECTS
            .iter()
            .map(|s| SubjectItem {
                name: s.name.into(),
                icon: s.icon.into(),
                color: Color::from_rgb_u8(s.display_color[0], s.display_color[1], s.display_color[2]),
            })
            .collect();
        ui.set_subjects(ModelRc::new(VecModel::from(subjects)));

        let flow = FlowView::from_state(&state);
        let confetti = flow_confetti(&flow);
        Self::apply_flow_view(ui, &flow, confetti);
        ui.set_total_questions(crate::session::TOTAL_QUESTIONS as i32);
        Self::reset_quiz_view(ui);

        tracing::debug!("UI synchronized with initial state");
    }

    fn setup_callbacks(
        ui: &MainWindow,
        bridge: &EventLoopBridge<MainWindow>,
        state_manager: &Arc<StateManager>,
        services: &QuizServices,
        session: &Rc<RefCell<Option<SessionHandle>>>,
    ) {
        let state = Arc::clone(state_manager);
        let ui_weak = ui.as_weak();

        ui.on_submit_student(move |name, class_name| {
            let error = match state.submit_student(&name, &class_name) {
                Ok(_) => SharedString::new(),
                Err(e) => {
                    tracing::debug!("Registration rejected: {}", e);
                    welcome_error_text(&e).into()
                }
            };
            if let Some(ui) = ui_weak.upgrade() {
                ui.set_welcome_error(error);
            }
        });

        let state = Arc::clone(state_manager);
        let ui_weak = ui.as_weak();
        let bridge_handle = bridge.clone();
        let services_handle = services.clone();
        let session_slot = Rc::clone(session);

        ui.on_select_subject(move |subject| {
            let Some(student_name) = state.read(|s| s.student_name().map(str::to_string)) else {
                tracing::error!("Subject selected before a student registered");
                return;
            };

            if let Err(e) = state.select_subject(&subject) {
                tracing::warn!("Subject selection rejected: {}", e);
                return;
            }

            if let Some(ui) = ui_weak.upgrade() {
                Self::reset_quiz_view(&ui);
            }

            let handle = Self::start_session(
                &bridge_handle,
                &state,
                &services_handle,
                subject.to_string(),
                student_name,
            );
            // replaces (and tears down) any stale session
            session_slot.replace(Some(handle));
        });

        let session_slot = Rc::clone(session);
        ui.on_answer_selected(move |option| {
            if let Some(handle) = session_slot.borrow().as_ref() {
                handle.answer(option.as_str());
            }
        });

        let session_slot = Rc::clone(session);
        ui.on_retry_quiz(move || {
            tracing::info!("Retry requested from the error panel");
            if let Some(handle) = session_slot.borrow().as_ref() {
                handle.retry();
            }
        });

        let state = Arc::clone(state_manager);
        let session_slot = Rc::clone(session);
        ui.on_play_again(move || {
            session_slot.borrow_mut().take();
            if let Err(e) = state.play_again() {
                tracing::warn!("Play again rejected: {}", e);
            }
        });
    }

    fn start_session(
        bridge: &EventLoopBridge<MainWindow>,
        state: &Arc<StateManager>,
        services: &QuizServices,
        subject: String,
        student_name: String,
    ) -> SessionHandle {
        tracing::info!("Starting quiz: subject='{}'", subject);

        let mut runner = SessionRunner::new(subject, student_name, Arc::clone(&services.provider))
            .with_metrics(Arc::clone(&services.metrics));
        if let Some(audio) = &services.audio {
            runner = runner.with_audio(audio.clone());
        }

        let completion_state = Arc::clone(state);
        let _runtime = bridge.runtime().enter();
        let (handle, events) = runner.spawn(move |score| {
            if let Err(e) = completion_state.complete_quiz(score) {
                tracing::error!("Failed to record final score {}: {}", score, e);
            }
        });

        bridge.spawn(Self::forward_session_events(events, bridge.clone()));
        handle
    }

    /// Mirror session events onto the quiz screen until the session ends.
    async fn forward_session_events(
        mut events: mpsc::UnboundedReceiver<SessionEvent>,
        bridge: EventLoopBridge<MainWindow>,
    ) {
        let mut current: Option<Question> = None;

        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::Loading => bridge.update_ui(|ui| {
                    ui.set_quiz_loading(true);
                    ui.set_quiz_error(SharedString::new());
                }),

                SessionEvent::Failed { message } => bridge.update_ui(move |ui| {
                    ui.set_quiz_loading(false);
                    ui.set_quiz_error(message.into());
                }),

                SessionEvent::QuestionShown {
                    index,
                    total,
                    question,
                    time_left,
                    score,
                } => {
                    let options = option_items(view::option_states(&question, None, false));
                    let text: SharedString = question.question_text.as_str().into();
                    current = Some(question);

                    bridge.update_ui(move |ui| {
                        ui.set_quiz_loading(false);
                        ui.set_quiz_error(SharedString::new());
                        ui.set_question_number(index as i32 + 1);
                        ui.set_total_questions(total as i32);
                        ui.set_progress(view::progress(index, total));
                        ui.set_time_left(time_left as i32);
                        ui.set_score(score as i32);
                        ui.set_question_text(text);
                        ui.set_options(ModelRc::new(VecModel::from(options)));
                        ui.set_answered(false);
                    });
                }

                SessionEvent::Tick { time_left } => {
                    bridge.update_ui(move |ui| ui.set_time_left(time_left as i32))
                }

                SessionEvent::Answered { outcome, timed_out } => {
                    let Some(question) = current.as_ref() else {
                        continue;
                    };
                    if timed_out {
                        tracing::debug!("Question {} timed out", outcome.question_index + 1);
                    }

                    let options = option_items(view::option_states(
                        question,
                        outcome.selected.as_deref(),
                        true,
                    ));
                    let score = outcome.score as i32;
                    bridge.update_ui(move |ui| {
                        ui.set_answered(true);
                        ui.set_score(score);
                        ui.set_options(ModelRc::new(VecModel::from(options)));
                    });
                }

                SessionEvent::Completed { score } => {
                    tracing::debug!("Session reported final score {}", score);
                }
            }
        }

        tracing::debug!("Session event stream closed");
    }

    fn setup_state_subscription(
        bridge: &EventLoopBridge<MainWindow>,
        state_manager: &Arc<StateManager>,
        audio: Option<AudioSender>,
    ) {
        let bridge_handle = bridge.clone();
        let state_manager_clone = Arc::clone(state_manager);
        let mut rx = state_manager.subscribe();

        std::thread::spawn(move || {
            tracing::debug!("State subscription thread started");

            loop {
                match rx.blocking_recv() {
                    Ok(change) => {
                        tracing::trace!("State change received: {:?}", change);
                        Self::apply_state_change(&bridge_handle, audio.as_ref(), change);
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("State channel closed");
                        break;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("State subscription lagged by {} events - resyncing", skipped);
                        let flow = FlowView::from_state(&state_manager_clone.snapshot());
                        let confetti = flow_confetti(&flow);
                        bridge_handle.update_ui(move |ui| {
                            Self::apply_flow_view(ui, &flow, confetti);
                        });
                    }
                }
            }

            tracing::debug!("State subscription thread terminated");
        });
    }

    fn apply_state_change(
        bridge: &EventLoopBridge<MainWindow>,
        audio: Option<&AudioSender>,
        change: StateChange,
    ) {
        match change {
            StateChange::ScreenChanged { from, to } => {
                tracing::info!("Screen: {} -> {}", from, to);
                bridge.update_ui(move |ui| ui.set_screen(to.index()));
            }

            StateChange::StudentRegistered { name, class_name } => {
                tracing::info!("Student registered (class {})", class_name);
                bridge.update_ui(move |ui| {
                    ui.set_student_name(name.into());
                    ui.set_welcome_error(SharedString::new());
                });
            }

            StateChange::SubjectSelected { subject } => {
                tracing::debug!("Subject selected: {}", subject);
            }

            StateChange::QuizCompleted { score } => {
                let summary = ResultSummary::new(score);
                let confetti = if summary.is_perfect {
                    if let Some(audio) = audio {
                        audio.play(AudioEvent::Cheer);
                    }
                    perfect_confetti()
                } else {
                    Vec::new()
                };

                bridge.update_ui(move |ui| {
                    ui.set_final_score(summary.score as i32);
                    ui.set_max_score(summary.max_score as i32);
                    ui.set_perfect_score(summary.is_perfect);
                    ui.set_confetti(ModelRc::new(VecModel::from(confetti)));
                });
            }

            StateChange::Replayed => {
                bridge.update_ui(|ui| {
                    ui.set_confetti(ModelRc::default());
                    ui.set_perfect_score(false);
                    ui.set_final_score(0);
                    Self::reset_quiz_view(ui);
                });
            }
        }
    }

    /// Overwrite every flow-owned property from a snapshot.
    fn apply_flow_view(ui: &MainWindow, flow: &FlowView, confetti: Vec<ConfettiPiece>) {
        ui.set_screen(flow.screen);
        ui.set_student_name(flow.student_name.as_str().into());
        ui.set_welcome_error(SharedString::new());
        ui.set_final_score(flow.final_score as i32);
        ui.set_max_score(flow.max_score as i32);
        ui.set_perfect_score(flow.perfect);
        ui.set_confetti(ModelRc::new(VecModel::from(confetti)));
    }

    /// Put the quiz screen back into its loading state.
    fn reset_quiz_view(ui: &MainWindow) {
        ui.set_quiz_loading(true);
        ui.set_quiz_error(SharedString::new());
        ui.set_question_number(1);
        ui.set_time_left(crate::session::TIME_PER_QUESTION as i32);
        ui.set_score(0);
        ui.set_progress(0.0);
        ui.set_question_text(SharedString::new());
        ui.set_options(ModelRc::default());
        ui.set_answered(false);
    }
}

/// Message under the welcome form for a rejected registration
fn welcome_error_text(error: &FlowError) -> &'static str {
    match error {
        FlowError::Validation(ValidationError::MissingName) => "Vui lòng nhập họ và tên của bé.",
        FlowError::Validation(ValidationError::MissingClassName) => "Vui lòng nhập lớp của bé.",
        _ => "Không thể bắt đầu, vui lòng thử lại.",
    }
}

fn perfect_confetti() -> Vec<ConfettiPiece> {
    confetti_pieces(&view::generate_confetti(
        &mut rand::thread_rng(),
        CONFETTI_PIECES,
    ))
}

/// Fresh confetti for a perfect result, nothing otherwise
fn flow_confetti(flow: &FlowView) -> Vec<ConfettiPiece> {
    if flow.perfect {
        perfect_confetti()
    } else {
        Vec::new()
    }
}

fn option_items(states: Vec<(String, OptionState)>) -> Vec<OptionItem> {
    states
        .into_iter()
        .map(|(text, state)| OptionItem {
            text: text.into(),
            state: state.as_int(),
        })
        .collect()
}

fn confetti_pieces(confetti: &[Confetti]) -> Vec<ConfettiPiece> {
    confetti
        .iter()
        .map(|c| ConfettiPiece {
            x: c.x,
            duration: c.duration,
            delay: c.delay,
            color: Color::from_rgb_u8(c.color[0], c.color[1], c.color[2]),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Screen;

    #[test]
    fn test_welcome_error_text() {
        assert_eq!(
            welcome_error_text(&FlowError::Validation(ValidationError::MissingName)),
            "Vui lòng nhập họ và tên của bé."
        );
        assert_eq!(
            welcome_error_text(&FlowError::Validation(ValidationError::MissingClassName)),
            "Vui lòng nhập lớp của bé."
        );
        assert_eq!(
            welcome_error_text(&FlowError::InvalidTransition {
                screen: Screen::Quiz,
                event: "StudentSubmitted"
            }),
            "Không thể bắt đầu, vui lòng thử lại."
        );
    }

    #[test]
    fn test_option_items_carry_state() {
        let items = option_items(vec![
            ("Chó".to_string(), OptionState::Dimmed),
            ("Mèo".to_string(), OptionState::Correct),
        ]);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].text, "Chó");
        assert_eq!(items[0].state, 3);
        assert_eq!(items[1].state, 1);
    }

    #[test]
    fn test_flow_confetti_only_when_perfect() {
        let perfect = FlowView {
            screen: Screen::Results.index(),
            student_name: "An".to_string(),
            final_score: 30,
            max_score: 30,
            perfect: true,
        };
        assert_eq!(flow_confetti(&perfect).len(), CONFETTI_PIECES);

        let stale = FlowView {
            perfect: false,
            final_score: 0,
            screen: Screen::SubjectSelection.index(),
            ..perfect
        };
        assert!(flow_confetti(&stale).is_empty());
    }

    #[test]
    fn test_confetti_colors() {
        let pieces = confetti_pieces(&[Confetti {
            x: 0.5,
            duration: 3.0,
            delay: 1.0,
            color: [255, 0, 0],
        }]);

        assert_eq!(pieces[0].color, Color::from_rgb_u8(255, 0, 0));
        assert_eq!(pieces[0].x, 0.5);
    }
}

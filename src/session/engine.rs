use crate::models::Question;
use thiserror::Error;

/// Questions presented per session
pub const TOTAL_QUESTIONS: usize = 30;

/// Countdown units (seconds) per question
pub const TIME_PER_QUESTION: u32 = 15;

/// Content-shape problems detected after a fetch succeeded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("Only {got} questions were generated, {TOTAL_QUESTIONS} are required")]
    NotEnoughQuestions { got: usize },

    #[error("Question {index} does not have exactly one option matching its answer")]
    MalformedQuestion { index: usize },
}

/// Shown when generation fails or returns unusable questions
pub const GENERATION_FAILED_MESSAGE: &str =
    "Đã có lỗi xảy ra khi tạo câu hỏi từ AI. Vui lòng thử lại.";

pub const NOT_ENOUGH_QUESTIONS_MESSAGE: &str = "Không đủ câu hỏi được tạo ra.";

impl ContentError {
    /// Text shown to the child on the error panel.
    pub fn user_message(&self) -> &'static str {
        match self {
            ContentError::NotEnoughQuestions { .. } => NOT_ENOUGH_QUESTIONS_MESSAGE,
            ContentError::MalformedQuestion { .. } => GENERATION_FAILED_MESSAGE,
        }
    }
}

/// Lifecycle of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Failed { message: String },
    InProgress,
    Complete { final_score: u32 },
}

/// Result of an accepted submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub question_index: usize,
    pub selected: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
    /// Score after this answer was counted
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing is counting down
    Ignored,
    Remaining(u32),
    /// The countdown hit zero and a null answer was locked in
    TimedOut(AnswerOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next { index: usize },
    Finished { final_score: u32 },
}

/// Read-only view of the session for presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub current_index: usize,
    pub total_questions: usize,
    pub score: u32,
    pub time_left: u32,
    pub selected_answer: Option<String>,
    pub is_answered: bool,
    pub question: Option<Question>,
}

/// The quiz session state machine.
///
/// Holds no clock and performs no I/O. The caller feeds it fetch results,
/// countdown ticks, answers and "reveal delay elapsed" signals, one at a time;
/// every mutation happens through one of those methods.
///
/// Invariant: once `is_answered` is set, nothing changes the score or the
/// selection until [`advance`](Self::advance) moves to the next question.
#[derive(Debug, Clone)]
pub struct QuizSession {
    subject: String,
    phase: SessionPhase,
    questions: Vec<Question>,
    current_index: usize,
    score: u32,
    selected_answer: Option<String>,
    is_answered: bool,
    time_left: u32,
}

impl QuizSession {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            phase: SessionPhase::Loading,
            questions: Vec::new(),
            current_index: 0,
            score: 0,
            selected_answer: None,
            is_answered: false,
            time_left: TIME_PER_QUESTION,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn is_answered(&self) -> bool {
        self.is_answered
    }

    pub fn selected_answer(&self) -> Option<&str> {
        self.selected_answer.as_deref()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            SessionPhase::InProgress => self.questions.get(self.current_index),
            _ => None,
        }
    }

    /// True while a question is shown and no answer is locked in.
    pub fn is_awaiting_answer(&self) -> bool {
        self.phase == SessionPhase::InProgress && !self.is_answered
    }

    /// Accept fetched questions.
    ///
    /// Fewer than [`TOTAL_QUESTIONS`] items, or a malformed question among the
    /// first [`TOTAL_QUESTIONS`], puts the session into `Failed`. Extra
    /// questions are dropped; order is kept.
    pub fn load_succeeded(&mut self, mut questions: Vec<Question>) -> Result<(), ContentError> {
        if self.phase != SessionPhase::Loading {
            tracing::warn!("Ignoring questions delivered outside the loading phase");
            return Ok(());
        }

        if questions.len() < TOTAL_QUESTIONS {
            let err = ContentError::NotEnoughQuestions {
                got: questions.len(),
            };
            self.load_failed(err.user_message());
            return Err(err);
        }

        questions.truncate(TOTAL_QUESTIONS);

        if let Some(index) = questions.iter().position(|q| !q.is_well_formed()) {
            let err = ContentError::MalformedQuestion { index };
            self.load_failed(err.user_message());
            return Err(err);
        }

        self.questions = questions;
        self.current_index = 0;
        self.score = 0;
        self.reset_question_state();
        self.phase = SessionPhase::InProgress;
        Ok(())
    }

    pub fn load_failed(&mut self, message: impl Into<String>) {
        if self.phase == SessionPhase::Loading {
            self.phase = SessionPhase::Failed {
                message: message.into(),
            };
        }
    }

    /// Go back to `Loading` from `Failed`, discarding everything.
    ///
    /// Returns false (and does nothing) in any other phase.
    pub fn retry(&mut self) -> bool {
        if !matches!(self.phase, SessionPhase::Failed { .. }) {
            return false;
        }

        *self = QuizSession::new(std::mem::take(&mut self.subject));
        true
    }

    /// Lock in an answer for the current question.
    ///
    /// This is the only place the score changes. `None` means no option was
    /// chosen (the countdown ran out). Returns `None` when no answer is
    /// currently being accepted, so duplicate or late submissions are no-ops.
    pub fn submit(&mut self, answer: Option<&str>) -> Option<AnswerOutcome> {
        if !self.is_awaiting_answer() {
            return None;
        }

        let question = self.questions.get(self.current_index)?;
        let is_correct = question.is_correct(answer);
        let correct_answer = question.correct_answer.clone();

        self.is_answered = true;
        self.selected_answer = answer.map(str::to_string);
        if is_correct {
            self.score += 1;
        }

        Some(AnswerOutcome {
            question_index: self.current_index,
            selected: self.selected_answer.clone(),
            correct_answer,
            is_correct,
            score: self.score,
        })
    }

    /// Consume one countdown unit.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_awaiting_answer() {
            return TickOutcome::Ignored;
        }

        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left > 0 {
            return TickOutcome::Remaining(self.time_left);
        }

        match self.submit(None) {
            Some(outcome) => TickOutcome::TimedOut(outcome),
            None => TickOutcome::Ignored,
        }
    }

    /// Leave the answered question once the reveal delay has elapsed.
    ///
    /// Returns `None` unless the current question has been answered.
    pub fn advance(&mut self) -> Option<Advance> {
        if self.phase != SessionPhase::InProgress || !self.is_answered {
            return None;
        }

        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            self.reset_question_state();
            Some(Advance::Next {
                index: self.current_index,
            })
        } else {
            self.phase = SessionPhase::Complete {
                final_score: self.score,
            };
            Some(Advance::Finished {
                final_score: self.score,
            })
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase.clone(),
            current_index: self.current_index,
            total_questions: TOTAL_QUESTIONS,
            score: self.score,
            time_left: self.time_left,
            selected_answer: self.selected_answer.clone(),
            is_answered: self.is_answered,
            question: self.current_question().cloned(),
        }
    }

    fn reset_question_state(&mut self) {
        self.selected_answer = None;
        self.is_answered = false;
        self.time_left = TIME_PER_QUESTION;
    }
}

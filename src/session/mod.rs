//! Quiz session: the pure [`QuizSession`] state machine and the tokio task
//! ([`SessionRunner`]) that drives it with a clock, the content provider and
//! the UI.

pub mod engine;
pub mod runner;

pub use engine::{
    Advance, AnswerOutcome, ContentError, GENERATION_FAILED_MESSAGE,
    NOT_ENOUGH_QUESTIONS_MESSAGE, QuizSession, SessionPhase, SessionSnapshot, TIME_PER_QUESTION,
    TOTAL_QUESTIONS, TickOutcome,
};
pub use runner::{
    LoadError, REVEAL_DELAY, SessionCommand, SessionEvent, SessionHandle, SessionRunner, TICK,
    WELCOME_AUDIO_FAILED_MESSAGE,
};

//! Async driver that runs one [`QuizSession`] on a tokio task.
//!
//! The task owns the engine outright. Everything that can change it (fetch
//! completion, countdown ticks, answer and retry commands, teardown) is
//! awaited in one `select!` at a time, so mutations never interleave. The UI
//! talks to the task through a [`SessionHandle`] and listens on a
//! [`SessionEvent`] channel.

use super::engine::{
    Advance, AnswerOutcome, ContentError, GENERATION_FAILED_MESSAGE, QuizSession, TickOutcome,
};
use crate::metrics::QuizMetrics;
use crate::models::Question;
use crate::services::{
    AudioError, AudioEvent, AudioSender, ContentProvider, PcmClip, ProviderError,
    decode_welcome_audio,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Countdown granularity
pub const TICK: Duration = Duration::from_secs(1);

/// How long the correct/incorrect highlighting stays before moving on
pub const REVEAL_DELAY: Duration = Duration::from_secs(2);

pub const WELCOME_AUDIO_FAILED_MESSAGE: &str = "Đã có lỗi xảy ra khi tạo âm thanh chào mừng.";

/// Why a session could not start
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Question generation failed: {0}")]
    Questions(#[source] ProviderError),

    #[error("Welcome audio generation failed: {0}")]
    WelcomeAudio(#[source] ProviderError),

    #[error("Welcome audio could not be decoded: {0}")]
    AudioDecode(#[from] AudioError),

    #[error(transparent)]
    Content(#[from] ContentError),
}

impl LoadError {
    pub fn user_message(&self) -> &'static str {
        match self {
            LoadError::Questions(_) => GENERATION_FAILED_MESSAGE,
            LoadError::WelcomeAudio(_) | LoadError::AudioDecode(_) => WELCOME_AUDIO_FAILED_MESSAGE,
            LoadError::Content(e) => e.user_message(),
        }
    }
}

/// Input from the quiz screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Answer(String),
    Retry,
}

/// Output for the quiz screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Loading,
    Failed {
        message: String,
    },
    QuestionShown {
        index: usize,
        total: usize,
        question: Question,
        time_left: u32,
        score: u32,
    },
    Tick {
        time_left: u32,
    },
    Answered {
        outcome: AnswerOutcome,
        timed_out: bool,
    },
    Completed {
        score: u32,
    },
}

/// UI-side handle to a running session.
///
/// Dropping the handle tears the session down.
#[derive(Debug)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    cancel: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Forward an option click. Returns false once the session has ended.
    pub fn answer(&self, option: impl Into<String>) -> bool {
        self.commands
            .send(SessionCommand::Answer(option.into()))
            .is_ok()
    }

    pub fn retry(&self) -> bool {
        self.commands.send(SessionCommand::Retry).is_ok()
    }

    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|t| t.is_finished())
    }

    /// Wait for the session task to end without cancelling it.
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("Quiz session task failed: {}", e);
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.cancel.send_replace(true);
    }
}

/// Builder for a session task.
pub struct SessionRunner {
    session: QuizSession,
    student_name: String,
    provider: Arc<dyn ContentProvider>,
    audio: Option<AudioSender>,
    metrics: Arc<QuizMetrics>,
}

impl SessionRunner {
    pub fn new(
        subject: impl Into<String>,
        student_name: impl Into<String>,
        provider: Arc<dyn ContentProvider>,
    ) -> Self {
        Self {
            session: QuizSession::new(subject),
            student_name: student_name.into(),
            provider,
            audio: None,
            metrics: Arc::new(QuizMetrics::new()),
        }
    }

    pub fn with_audio(mut self, audio: AudioSender) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<QuizMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Start the session on the current tokio runtime.
    ///
    /// `on_complete` receives the final score. It is not called if the session
    /// is torn down first.
    pub fn spawn<F>(self, on_complete: F) -> (SessionHandle, mpsc::UnboundedReceiver<SessionEvent>)
    where
        F: FnOnce(u32) + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let task = SessionTask {
            session: self.session,
            student_name: self.student_name,
            provider: self.provider,
            audio: self.audio,
            metrics: self.metrics,
            events: event_tx,
            commands: command_rx,
            cancel: cancel_rx,
        };

        let handle = SessionHandle {
            commands: command_tx,
            cancel: cancel_tx,
            task: Some(tokio::spawn(task.run(on_complete))),
        };

        (handle, event_rx)
    }
}

struct SessionTask {
    session: QuizSession,
    student_name: String,
    provider: Arc<dyn ContentProvider>,
    audio: Option<AudioSender>,
    metrics: Arc<QuizMetrics>,
    events: mpsc::UnboundedSender<SessionEvent>,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    cancel: watch::Receiver<bool>,
}

/// Resolves once teardown has been requested or the handle is gone.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let _ = cancel.wait_for(|cancelled| *cancelled).await;
}

async fn fetch_content(
    provider: Arc<dyn ContentProvider>,
    subject: String,
    student_name: String,
) -> Result<(Vec<Question>, PcmClip), LoadError> {
    let questions = async {
        provider
            .fetch_questions(&subject)
            .await
            .map_err(LoadError::Questions)
    };
    let audio = async {
        provider
            .fetch_welcome_audio(&student_name)
            .await
            .map_err(LoadError::WelcomeAudio)
    };

    let (questions, encoded) = tokio::try_join!(questions, audio)?;
    let clip = decode_welcome_audio(&encoded)?;
    Ok((questions, clip))
}

impl SessionTask {
    async fn run<F>(mut self, on_complete: F)
    where
        F: FnOnce(u32) + Send + 'static,
    {
        tracing::info!("Quiz session started for '{}'", self.session.subject());

        match self.drive().await {
            Some(score) if !*self.cancel.borrow() => {
                self.metrics.record_session_completed();
                tracing::info!(
                    "Quiz session for '{}' complete: {}/{}",
                    self.session.subject(),
                    score,
                    self.session.questions().len()
                );
                self.emit(SessionEvent::Completed { score });
                on_complete(score);
            }
            _ => {
                self.metrics.record_session_cancelled();
                tracing::info!("Quiz session for '{}' torn down", self.session.subject());
            }
        }
    }

    /// Returns the final score, or `None` on teardown.
    async fn drive(&mut self) -> Option<u32> {
        self.metrics.record_session_started();

        loop {
            self.emit(SessionEvent::Loading);
            match self.load().await? {
                Ok(clip) => {
                    self.play(AudioEvent::Welcome(clip));
                    break;
                }
                Err(err) => {
                    tracing::error!(
                        "Failed to prepare quiz for '{}': {}",
                        self.session.subject(),
                        err
                    );
                    self.metrics.record_fetch_failure();

                    let message = err.user_message();
                    self.session.load_failed(message);
                    self.emit(SessionEvent::Failed {
                        message: message.to_string(),
                    });

                    self.wait_for_retry().await?;
                    self.metrics.record_retry();
                    self.session.retry();
                }
            }
        }

        loop {
            match self.run_question().await? {
                Advance::Next { index } => tracing::debug!("Moving to question {}", index + 1),
                Advance::Finished { final_score } => return Some(final_score),
            }
        }
    }

    async fn load(&mut self) -> Option<Result<PcmClip, LoadError>> {
        let started = Instant::now();
        let fetch = fetch_content(
            Arc::clone(&self.provider),
            self.session.subject().to_string(),
            self.student_name.clone(),
        );
        tokio::pin!(fetch);

        let fetched = loop {
            tokio::select! {
                biased;
                _ = cancelled(&mut self.cancel) => return None,
                command = self.commands.recv() => match command {
                    Some(command) => tracing::debug!("Ignoring {:?} while loading", command),
                    None => return None,
                },
                result = &mut fetch => break result,
            }
        };
        self.metrics.record_fetch_time(started.elapsed());

        Some(fetched.and_then(|(questions, clip)| {
            self.session.load_succeeded(questions)?;
            Ok(clip)
        }))
    }

    async fn wait_for_retry(&mut self) -> Option<()> {
        loop {
            tokio::select! {
                biased;
                _ = cancelled(&mut self.cancel) => return None,
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Retry) => return Some(()),
                    Some(SessionCommand::Answer(answer)) => {
                        tracing::debug!("Ignoring answer '{}' while the error panel is shown", answer)
                    }
                    None => return None,
                },
            }
        }
    }

    /// Present the current question, collect its answer, then hold the reveal.
    async fn run_question(&mut self) -> Option<Advance> {
        let snapshot = self.session.snapshot();
        let question = snapshot.question?;
        self.emit(SessionEvent::QuestionShown {
            index: snapshot.current_index,
            total: snapshot.total_questions,
            question,
            time_left: snapshot.time_left,
            score: snapshot.score,
        });

        let (outcome, timed_out) = {
            let mut countdown = time::interval_at(Instant::now() + TICK, TICK);
            countdown.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled(&mut self.cancel) => return None,
                    command = self.commands.recv() => match command {
                        Some(SessionCommand::Answer(answer)) => {
                            if let Some(outcome) = self.session.submit(Some(&answer)) {
                                break (outcome, false);
                            }
                        }
                        Some(SessionCommand::Retry) => tracing::debug!("Ignoring retry during a question"),
                        None => return None,
                    },
                    _ = countdown.tick() => match self.session.tick() {
                        TickOutcome::Remaining(time_left) => self.emit(SessionEvent::Tick { time_left }),
                        TickOutcome::TimedOut(outcome) => {
                            self.emit(SessionEvent::Tick { time_left: 0 });
                            break (outcome, true);
                        }
                        TickOutcome::Ignored => {}
                    },
                }
            }
            // countdown dropped here, before the cue and reveal
        };

        self.metrics.record_answer(outcome.is_correct, timed_out);
        self.play(if outcome.is_correct {
            AudioEvent::CorrectCue
        } else {
            AudioEvent::IncorrectCue
        });
        tracing::debug!(
            "Question {} answered ({}): {:?}",
            outcome.question_index + 1,
            if outcome.is_correct { "correct" } else { "incorrect" },
            outcome.selected
        );
        self.emit(SessionEvent::Answered { outcome, timed_out });

        let reveal = time::sleep(REVEAL_DELAY);
        tokio::pin!(reveal);
        loop {
            tokio::select! {
                biased;
                _ = cancelled(&mut self.cancel) => return None,
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Answer(answer)) => {
                        if self.session.submit(Some(&answer)).is_some() {
                            tracing::warn!("Answer accepted during the reveal delay");
                        }
                    }
                    Some(SessionCommand::Retry) => {}
                    None => return None,
                },
                _ = &mut reveal => break,
            }
        }

        self.session.advance()
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("Session event receiver dropped");
        }
    }

    fn play(&self, event: AudioEvent) {
        if let Some(audio) = &self.audio {
            audio.play(event);
        }
    }
}

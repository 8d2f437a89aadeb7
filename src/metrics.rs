// Session metrics
//
// Lightweight counters describing how quizzes went during this run

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Application-wide quiz metrics
///
/// Atomic counters shared by every session task; no locking. A summary is
/// logged on shutdown.
#[derive(Debug)]
pub struct QuizMetrics {
    /// Sessions that reached the loading phase
    pub sessions_started: AtomicU64,

    /// Sessions that reported a final score
    pub sessions_completed: AtomicU64,

    /// Sessions torn down before completion
    pub sessions_cancelled: AtomicU64,

    /// Content loads that ended in the error panel
    pub fetch_failures: AtomicU64,

    /// Retries requested from the error panel
    pub retries: AtomicU64,

    /// Answers locked in, including timeouts
    pub answers: AtomicU64,

    pub correct_answers: AtomicU64,

    /// Answers locked in by the countdown
    pub timeouts: AtomicU64,

    /// Total time spent waiting on the content provider
    pub total_fetch_time_ms: AtomicU64,

    start_time: Instant,
}

impl QuizMetrics {
    pub fn new() -> Self {
        Self {
            sessions_started: AtomicU64::new(0),
            sessions_completed: AtomicU64::new(0),
            sessions_cancelled: AtomicU64::new(0),
            fetch_failures: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            answers: AtomicU64::new(0),
            correct_answers: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            total_fetch_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_session_started(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_completed(&self) {
        self.sessions_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_cancelled(&self) {
        self.sessions_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a locked-in answer
    pub fn record_answer(&self, is_correct: bool, timed_out: bool) {
        self.answers.fetch_add(1, Ordering::Relaxed);
        if is_correct {
            self.correct_answers.fetch_add(1, Ordering::Relaxed);
        }
        if timed_out {
            self.timeouts.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_fetch_time(&self, duration: Duration) {
        self.total_fetch_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Share of locked-in answers that were correct, in percent
    pub fn accuracy_percent(&self) -> f64 {
        let answers = self.answers.load(Ordering::Relaxed);
        if answers == 0 {
            return 0.0;
        }
        self.correct_answers.load(Ordering::Relaxed) as f64 * 100.0 / answers as f64
    }

    pub fn log_summary(&self) {
        tracing::info!("=== Quiz Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Sessions: {} started, {} completed, {} cancelled",
            self.sessions_started.load(Ordering::Relaxed),
            self.sessions_completed.load(Ordering::Relaxed),
            self.sessions_cancelled.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Content: {} fetch failures, {} retries, {:.2}s waiting on the provider",
            self.fetch_failures.load(Ordering::Relaxed),
            self.retries.load(Ordering::Relaxed),
            self.total_fetch_time_ms.load(Ordering::Relaxed) as f64 / 1000.0
        );
        tracing::info!(
            "Answers: {} total, {} correct ({:.1}%), {} timed out",
            self.answers.load(Ordering::Relaxed),
            self.correct_answers.load(Ordering::Relaxed),
            self.accuracy_percent(),
            self.timeouts.load(Ordering::Relaxed)
        );
    }
}

impl Default for QuizMetrics {
    fn default() -> Self {
        Self::new()
    }
}

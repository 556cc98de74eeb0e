use std::fmt;
use std::sync::Arc;

use quiz_core::model::{Markup, Question, QuizSession};
use quiz_core::results::QuizResults;
use storage::repository::SessionStore;

use super::countdown::{Countdown, CountdownTick};
use super::progress::{QuizProgress, QuizSnapshot};
use super::queries::SessionQueries;
use crate::Clock;
use crate::error::SessionError;

/// What a call to [`QuizSessionService::submit`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// This call completed the session.
    Accepted,
    /// The session was already complete; nothing changed.
    AlreadyCompleted,
}

//
// ─── SESSION CONTROLLER ────────────────────────────────────────────────────────
//

/// Owns the in-memory quiz session and mirrors every mutation to the store.
///
/// Each mutator works on a copy, persists it, and only then adopts it, so a
/// failed write never leaves memory and store disagreeing.
pub struct QuizSessionService {
    session: QuizSession,
    current: usize,
    countdown: Countdown,
    store: Arc<dyn SessionStore>,
    clock: Clock,
}

impl QuizSessionService {
    pub(crate) fn new(session: QuizSession, store: Arc<dyn SessionStore>, clock: Clock) -> Self {
        let countdown = Countdown::new(session.started_at(), clock.clone());
        Self {
            session,
            current: 0,
            countdown,
            store,
            clock,
        }
    }

    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.session.question(self.current)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.session.is_completed()
    }

    #[must_use]
    pub fn observe_countdown(&self) -> CountdownTick {
        self.countdown.observe()
    }

    #[must_use]
    pub fn snapshot(&self) -> QuizSnapshot {
        QuizSnapshot {
            session: self.session.clone(),
            current_index: self.current,
            countdown: self.observe_countdown(),
        }
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        self.snapshot().progress()
    }

    /// Results of the attempt, once it has been submitted.
    #[must_use]
    pub fn results(&self) -> Option<QuizResults> {
        self.session
            .is_completed()
            .then(|| self.session.results(self.clock.now()))
    }

    /// Record `answer` for the question on screen and persist the question set.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after submission, or `SessionError::Storage`
    /// if the write fails.
    pub async fn select_answer(&mut self, answer: Markup) -> Result<(), SessionError> {
        let mut next = self.session.clone();
        next.select_answer(self.current, answer)?;
        SessionQueries::persist_questions(self.store.as_ref(), &next).await?;
        self.session = next;
        tracing::debug!(index = self.current, "answer selected");
        Ok(())
    }

    /// Show the question at `index`, marking it visited.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidNavigationIndex` for an index outside the
    /// question set (state is left untouched), `SessionError::Completed` after
    /// submission, or `SessionError::Storage` if the write fails.
    pub async fn go_to(&mut self, index: usize) -> Result<(), SessionError> {
        let mut next = self.session.clone();
        next.visit(index)?;
        SessionQueries::persist_questions(self.store.as_ref(), &next).await?;
        self.session = next;
        self.current = index;
        tracing::debug!(index, "navigated");
        Ok(())
    }

    /// Move to the following question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidNavigationIndex` on the last question.
    pub async fn next(&mut self) -> Result<(), SessionError> {
        self.go_to(self.current.saturating_add(1)).await
    }

    /// Move to the preceding question, staying on the first one.
    ///
    /// # Errors
    ///
    /// Same as [`QuizSessionService::go_to`].
    pub async fn previous(&mut self) -> Result<(), SessionError> {
        self.go_to(self.current.saturating_sub(1)).await
    }

    /// Submission gate.
    ///
    /// The first call completes the session and persists the terminal snapshot.
    /// Every later call, whether from the timer or the taker, is a no-op that
    /// reports `Submission::AlreadyCompleted`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the terminal snapshot cannot be written;
    /// the session then stays open.
    pub async fn submit(&mut self) -> Result<Submission, SessionError> {
        if self.session.is_completed() {
            tracing::warn!("submission ignored: quiz session already completed");
            return Ok(Submission::AlreadyCompleted);
        }

        let mut next = self.session.clone();
        next.complete(self.clock.now());
        SessionQueries::persist_completion(self.store.as_ref(), &next).await?;
        self.session = next;

        tracing::info!(
            taker = %self.session.taker(),
            attempted = self.session.attempted_count(),
            total = self.session.question_count(),
            "quiz session submitted"
        );
        Ok(Submission::Accepted)
    }
}

impl fmt::Debug for QuizSessionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSessionService")
            .field("taker", self.session.taker())
            .field("questions_len", &self.session.question_count())
            .field("current", &self.current)
            .field("started_at", &self.session.started_at())
            .field("completed", &self.session.is_completed())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::countdown::{self, DURATION_LIMIT_SECS};
use crate::model::{Markup, Question, QuestionId};
use crate::results::{self, QuizResults};

/// Identity string of the person taking the quiz (typically an email address).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TakerIdentity(String);

impl TakerIdentity {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TakerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TakerIdentity({:?})", self.0)
    }
}

impl fmt::Display for TakerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizSessionError {
    #[error("quiz has no questions")]
    Empty,

    #[error("duplicate question id: {id}")]
    DuplicateQuestionId { id: QuestionId },

    #[error("submitted_at is before started_at")]
    InvalidTimeRange,

    #[error("submission time recorded for a session that is not completed")]
    SubmittedWhileOpen,

    #[error("question index {index} out of range for {len} questions")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("quiz session already completed")]
    Completed,
}

fn check_question_set(questions: &[Question]) -> Result<(), QuizSessionError> {
    if questions.is_empty() {
        return Err(QuizSessionError::Empty);
    }
    let mut seen = HashSet::with_capacity(questions.len());
    for question in questions {
        if !seen.insert(question.id()) {
            return Err(QuizSessionError::DuplicateQuestionId { id: question.id() });
        }
    }
    Ok(())
}

/// One taker's attempt at a quiz, from start to submission.
///
/// `started_at` is the anchor every countdown value derives from and never
/// changes. `completed` flips from false to true exactly once, through
/// [`QuizSession::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSession {
    taker: TakerIdentity,
    questions: Vec<Question>,
    started_at: DateTime<Utc>,
    completed: bool,
    submitted_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Start a fresh attempt over the given questions.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::Empty` if there are no questions.
    /// Returns `QuizSessionError::DuplicateQuestionId` if two questions share an id.
    pub fn begin(
        taker: TakerIdentity,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, QuizSessionError> {
        check_question_set(&questions)?;

        Ok(Self {
            taker,
            questions,
            started_at,
            completed: false,
            submitted_at: None,
        })
    }

    /// Rehydrate a session from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`QuizSession::begin`] for the question set,
    /// `QuizSessionError::SubmittedWhileOpen` if a submission time exists without the
    /// completion flag, and `QuizSessionError::InvalidTimeRange` if the submission
    /// predates the start.
    pub fn from_persisted(
        taker: TakerIdentity,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
        completed: bool,
        submitted_at: Option<DateTime<Utc>>,
    ) -> Result<Self, QuizSessionError> {
        check_question_set(&questions)?;
        if let Some(submitted_at) = submitted_at {
            if !completed {
                return Err(QuizSessionError::SubmittedWhileOpen);
            }
            if submitted_at < started_at {
                return Err(QuizSessionError::InvalidTimeRange);
            }
        }

        Ok(Self {
            taker,
            questions,
            started_at,
            completed,
            submitted_at,
        })
    }

    #[must_use]
    pub fn taker(&self) -> &TakerIdentity {
        &self.taker
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Instant at which the countdown reaches zero.
    #[must_use]
    pub fn deadline(&self) -> DateTime<Utc> {
        self.started_at + Duration::seconds(i64::from(DURATION_LIMIT_SECS))
    }

    /// Seconds left on the countdown at `now`, derived from the anchor timestamp.
    #[must_use]
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u32 {
        countdown::remaining_secs(self.started_at, now, DURATION_LIMIT_SECS)
    }

    #[must_use]
    pub fn visited_count(&self) -> usize {
        self.questions.iter().filter(|q| q.visited()).count()
    }

    #[must_use]
    pub fn attempted_count(&self) -> usize {
        self.questions.iter().filter(|q| q.attempted()).count()
    }

    /// Force the first question to be visited. Returns whether anything changed.
    pub fn ensure_first_visited(&mut self) -> bool {
        self.questions
            .first_mut()
            .is_some_and(Question::mark_visited)
    }

    /// Mark the question at `index` as visited. Returns whether the flag changed.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::Completed` once the session is completed and
    /// `QuizSessionError::IndexOutOfRange` for an invalid index. Neither touches state.
    pub fn visit(&mut self, index: usize) -> Result<bool, QuizSessionError> {
        let question = self.question_mut(index)?;
        Ok(question.mark_visited())
    }

    /// Record the taker's answer for the question at `index`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`QuizSession::visit`].
    pub fn select_answer(&mut self, index: usize, answer: Markup) -> Result<(), QuizSessionError> {
        let question = self.question_mut(index)?;
        question.select_answer(answer);
        Ok(())
    }

    /// Guarded transition to the completed state.
    ///
    /// Returns `true` only for the call that performed the transition; every
    /// later call leaves the session untouched and returns `false`.
    pub fn complete(&mut self, at: DateTime<Utc>) -> bool {
        if self.completed {
            return false;
        }
        self.completed = true;
        self.submitted_at = Some(at.max(self.started_at));
        true
    }

    /// Derive the results of this attempt.
    ///
    /// The completion time runs to the recorded submission instant, or to `now`
    /// for a session that has none.
    #[must_use]
    pub fn results(&self, now: DateTime<Utc>) -> QuizResults {
        let finished_at = self.submitted_at.unwrap_or(now);
        results::derive_results(&self.questions, self.started_at, finished_at)
    }

    fn question_mut(&mut self, index: usize) -> Result<&mut Question, QuizSessionError> {
        if self.completed {
            return Err(QuizSessionError::Completed);
        }
        let len = self.questions.len();
        self.questions
            .get_mut(index)
            .ok_or(QuizSessionError::IndexOutOfRange { index, len })
    }
}

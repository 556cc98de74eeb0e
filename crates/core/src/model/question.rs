use thiserror::Error;

use crate::model::{ids::QuestionId, markup::Markup};

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// A question as supplied by the question source, before any progress exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub prompt: Markup,
    pub choices: Vec<Markup>,
    pub correct_answer: Markup,
}

impl QuestionDraft {
    /// Check the draft against the question-source contract and produce a fresh question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::NoChoices` if `choices` is empty.
    /// Returns `QuestionError::CorrectAnswerNotAChoice` if `correct_answer` matches no choice.
    pub fn validate(self) -> Result<Question, QuestionError> {
        if self.choices.is_empty() {
            return Err(QuestionError::NoChoices { id: self.id });
        }
        if !self.choices.contains(&self.correct_answer) {
            return Err(QuestionError::CorrectAnswerNotAChoice { id: self.id });
        }

        Ok(Question {
            id: self.id,
            prompt: self.prompt,
            choices: self.choices,
            correct_answer: self.correct_answer,
            user_answer: None,
            visited: false,
            attempted: false,
        })
    }
}

/// One question of a quiz together with the taker's progress on it.
///
/// `visited` and `attempted` only ever move from false to true, and
/// `attempted` implies both a selected answer and `visited`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: Markup,
    choices: Vec<Markup>,
    correct_answer: Markup,
    user_answer: Option<Markup>,
    visited: bool,
    attempted: bool,
}

impl Question {
    /// Rehydrate a question from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::InconsistentProgress` if the progress flags break
    /// `attempted ⇔ user_answer` or `attempted ⇒ visited`.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: QuestionId,
        prompt: Markup,
        choices: Vec<Markup>,
        correct_answer: Markup,
        user_answer: Option<Markup>,
        visited: bool,
        attempted: bool,
    ) -> Result<Self, QuestionError> {
        if attempted != user_answer.is_some() || (attempted && !visited) {
            return Err(QuestionError::InconsistentProgress { id });
        }

        Ok(Self {
            id,
            prompt,
            choices,
            correct_answer,
            user_answer,
            visited,
            attempted,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &Markup {
        &self.prompt
    }

    #[must_use]
    pub fn choices(&self) -> &[Markup] {
        &self.choices
    }

    #[must_use]
    pub fn correct_answer(&self) -> &Markup {
        &self.correct_answer
    }

    #[must_use]
    pub fn user_answer(&self) -> Option<&Markup> {
        self.user_answer.as_ref()
    }

    #[must_use]
    pub fn visited(&self) -> bool {
        self.visited
    }

    #[must_use]
    pub fn attempted(&self) -> bool {
        self.attempted
    }

    /// True when the selected answer equals the correct answer.
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.user_answer.as_ref() == Some(&self.correct_answer)
    }

    /// Mark the question as displayed. Returns whether the flag changed.
    pub fn mark_visited(&mut self) -> bool {
        let changed = !self.visited;
        self.visited = true;
        changed
    }

    /// Record (or overwrite) the taker's answer.
    ///
    /// The answer is not checked against `choices`. Answering a question also
    /// marks it visited since it must have been on screen.
    pub fn select_answer(&mut self, answer: Markup) {
        self.visited = true;
        self.user_answer = Some(answer);
        self.attempted = true;
    }
}

//
// ─── QUESTION ERRORS ───────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id} has no choices")]
    NoChoices { id: QuestionId },

    #[error("correct answer of question {id} is not one of its choices")]
    CorrectAnswerNotAChoice { id: QuestionId },

    #[error("question {id} has inconsistent progress flags")]
    InconsistentProgress { id: QuestionId },
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

use std::sync::Arc;

use quiz_core::model::{Markup, QuestionDraft, QuestionId, QuizSession, TakerIdentity};
use serde::Deserialize;
use storage::repository::SessionStore;

use super::queries::SessionQueries;
use crate::Clock;
use crate::error::SetupError;

/// One entry of the question-source payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceQuestion {
    pub id: QuestionId,
    pub question: Markup,
    pub choices: Vec<Markup>,
    pub correct_answer: Markup,
}

impl From<SourceQuestion> for QuestionDraft {
    fn from(source: SourceQuestion) -> Self {
        QuestionDraft {
            id: source.id,
            prompt: source.question,
            choices: source.choices,
            correct_answer: source.correct_answer,
        }
    }
}

/// Parse a JSON array of `{id, question, choices, correctAnswer}` objects.
///
/// # Errors
///
/// Returns `SetupError::Source` if the payload does not have that shape.
pub fn parse_question_source(raw: &str) -> Result<Vec<QuestionDraft>, SetupError> {
    let source: Vec<SourceQuestion> = serde_json::from_str(raw)?;
    Ok(source.into_iter().map(QuestionDraft::from).collect())
}

/// Seeds the store with a brand-new attempt.
#[derive(Clone)]
pub struct SessionSetupService {
    clock: Clock,
    store: Arc<dyn SessionStore>,
}

impl SessionSetupService {
    #[must_use]
    pub fn new(clock: Clock, store: Arc<dyn SessionStore>) -> Self {
        Self { clock, store }
    }

    /// Validate the question set, wipe any previous attempt and persist the new one.
    ///
    /// The start timestamp is captured here and never rewritten afterwards.
    ///
    /// # Errors
    ///
    /// Returns `SetupError` for an empty taker, invalid questions, an empty or
    /// duplicate-id set, or storage failures.
    pub async fn begin(
        &self,
        taker: &str,
        drafts: Vec<QuestionDraft>,
    ) -> Result<QuizSession, SetupError> {
        let taker = taker.trim();
        if taker.is_empty() {
            return Err(SetupError::EmptyTaker);
        }

        let questions = drafts
            .into_iter()
            .map(QuestionDraft::validate)
            .collect::<Result<Vec<_>, _>>()?;
        let session = QuizSession::begin(TakerIdentity::new(taker), questions, self.clock.now())?;

        SessionQueries::persist_new(self.store.as_ref(), &session).await?;
        tracing::info!(
            taker = %session.taker(),
            questions = session.question_count(),
            "quiz session created"
        );
        Ok(session)
    }
}

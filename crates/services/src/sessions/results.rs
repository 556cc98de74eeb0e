use std::sync::Arc;

use chrono::{DateTime, Utc};
use quiz_core::model::{Question, TakerIdentity};
use quiz_core::results::QuizResults;
use storage::repository::SessionStore;

use super::queries::SessionQueries;
use crate::Clock;
use crate::error::SessionError;
use crate::route::Route;

/// What the results screen shows: who took the quiz, the final questions and the score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsReport {
    pub taker: TakerIdentity,
    pub submitted_at: Option<DateTime<Utc>>,
    pub questions: Vec<Question>,
    pub results: QuizResults,
}

/// Reads the terminal snapshot for the results screen and handles retakes.
#[derive(Clone)]
pub struct ResultsService {
    clock: Clock,
    store: Arc<dyn SessionStore>,
}

impl ResultsService {
    #[must_use]
    pub fn new(clock: Clock, store: Arc<dyn SessionStore>) -> Self {
        Self { clock, store }
    }

    /// Derive the report from the persisted terminal snapshot.
    ///
    /// Loading never writes, so the results screen can reload freely.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotCompleted` if the session has not been
    /// submitted, or the initializer's missing/malformed errors.
    pub async fn load(&self) -> Result<ResultsReport, SessionError> {
        let session = SessionQueries::load(self.store.as_ref()).await?;
        if !session.is_completed() {
            return Err(SessionError::NotCompleted);
        }

        let results = session.results(self.clock.now());
        Ok(ResultsReport {
            taker: session.taker().clone(),
            submitted_at: session.submitted_at(),
            questions: session.questions().to_vec(),
            results,
        })
    }

    /// Discard the whole session so a new attempt can be set up.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the store cannot be cleared.
    pub async fn retake(&self) -> Result<Route, SessionError> {
        self.store.clear().await?;
        tracing::info!("quiz session cleared for retake");
        Ok(Route::Setup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::{Markup, QuestionDraft, QuestionId, QuizSession};
    use quiz_core::results::GradeBand;
    use quiz_core::time::fixed_now;
    use storage::repository::{InMemorySessionStore, SessionKey};

    use crate::sessions::SessionInitializer;

    async fn submitted_store(answers: &[Option<&str>]) -> InMemorySessionStore {
        let questions = answers
            .iter()
            .enumerate()
            .map(|(i, _)| {
                QuestionDraft {
                    id: QuestionId::new(i as u64 + 1),
                    prompt: Markup::from("Q"),
                    choices: vec![Markup::from("A"), Markup::from("B")],
                    correct_answer: Markup::from("A"),
                }
                .validate()
                .unwrap()
            })
            .collect();
        let session =
            QuizSession::begin(TakerIdentity::new("t@example.com"), questions, fixed_now())
                .unwrap();
        let store = InMemorySessionStore::new();
        SessionQueries::persist_new(&store, &session).await.unwrap();

        let clock = Clock::fixed(fixed_now() + Duration::seconds(125));
        let mut service = SessionInitializer::new(clock, Arc::new(store.clone()))
            .initialize()
            .await
            .unwrap();
        for (index, answer) in answers.iter().enumerate() {
            service.go_to(index).await.unwrap();
            if let Some(answer) = answer {
                service.select_answer(Markup::from(*answer)).await.unwrap();
            }
        }
        service.submit().await.unwrap();
        store
    }

    #[tokio::test]
    async fn report_uses_submission_instant_not_load_time() {
        let store = submitted_store(&[Some("A"), Some("B"), None, Some("A")]).await;
        let late = Clock::fixed(fixed_now() + Duration::hours(3));

        let report = ResultsService::new(late, Arc::new(store))
            .load()
            .await
            .unwrap();

        assert_eq!(report.taker.as_str(), "t@example.com");
        assert_eq!(
            report.submitted_at,
            Some(fixed_now() + Duration::seconds(125))
        );
        assert_eq!(report.results.score, 2);
        assert_eq!(report.results.percentage, 50);
        assert_eq!(report.results.grade, GradeBand::Good);
        assert_eq!(report.results.completion_time.to_string(), "2m 5s");
    }

    #[tokio::test]
    async fn loading_twice_gives_the_same_report() {
        let store = submitted_store(&[Some("A"), None]).await;
        let service = ResultsService::new(Clock::default_clock(), Arc::new(store));

        let first = service.load().await.unwrap();
        let second = service.load().await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn empty_store_routes_to_setup() {
        let store = InMemorySessionStore::new();

        let err = ResultsService::new(Clock::fixed(fixed_now()), Arc::new(store))
            .load()
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::MissingSessionState(_)));
        assert_eq!(err.route(), Some(Route::Setup));
    }

    #[tokio::test]
    async fn unsubmitted_session_routes_to_quiz() {
        let questions = vec![
            QuestionDraft {
                id: QuestionId::new(1),
                prompt: Markup::from("Q"),
                choices: vec![Markup::from("A")],
                correct_answer: Markup::from("A"),
            }
            .validate()
            .unwrap(),
        ];
        let session =
            QuizSession::begin(TakerIdentity::new("t"), questions, fixed_now()).unwrap();
        let store = InMemorySessionStore::new();
        SessionQueries::persist_new(&store, &session).await.unwrap();

        let err = ResultsService::new(Clock::fixed(fixed_now()), Arc::new(store))
            .load()
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::NotCompleted));
        assert_eq!(err.route(), Some(Route::Quiz));
    }

    #[tokio::test]
    async fn retake_clears_every_key() {
        let store = submitted_store(&[Some("A")]).await;
        let service = ResultsService::new(Clock::fixed(fixed_now()), Arc::new(store.clone()));

        assert_eq!(service.retake().await.unwrap(), Route::Setup);

        for key in SessionKey::ALL {
            assert_eq!(store.get(key).await.unwrap(), None);
        }
    }
}

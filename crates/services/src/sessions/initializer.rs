use std::sync::Arc;

use storage::repository::SessionStore;

use super::queries::SessionQueries;
use super::service::QuizSessionService;
use crate::Clock;
use crate::error::SessionError;

/// Rebuilds the quiz session when the quiz screen is entered (or reloaded).
#[derive(Clone)]
pub struct SessionInitializer {
    clock: Clock,
    store: Arc<dyn SessionStore>,
}

impl SessionInitializer {
    #[must_use]
    pub fn new(clock: Clock, store: Arc<dyn SessionStore>) -> Self {
        Self { clock, store }
    }

    /// Load the session from the store and hand back its controller.
    ///
    /// The first question is forced visited and that change is persisted
    /// before returning.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::MissingSessionState` or
    /// `SessionError::MalformedPersistedData` when there is nothing usable to
    /// resume (route to setup), and `SessionError::Completed` when the session
    /// was already submitted (route to results).
    pub async fn initialize(&self) -> Result<QuizSessionService, SessionError> {
        let mut session = match SessionQueries::load(self.store.as_ref()).await {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(error = %err, "no resumable quiz session");
                return Err(err);
            }
        };

        if session.is_completed() {
            tracing::info!("quiz session already submitted");
            return Err(SessionError::Completed);
        }

        if session.ensure_first_visited() {
            SessionQueries::persist_questions(self.store.as_ref(), &session).await?;
        }

        tracing::info!(
            taker = %session.taker(),
            questions = session.question_count(),
            remaining_secs = session.remaining_secs(self.clock.now()),
            "quiz session initialized"
        );
        Ok(QuizSessionService::new(
            session,
            Arc::clone(&self.store),
            self.clock.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::{Markup, QuestionDraft, QuestionId, QuizSession, TakerIdentity};
    use quiz_core::time::fixed_now;
    use storage::codec::decode_questions;
    use storage::repository::{InMemorySessionStore, SessionKey};

    use crate::route::Route;

    async fn seeded_store() -> InMemorySessionStore {
        let questions = (1..=2)
            .map(|id| {
                QuestionDraft {
                    id: QuestionId::new(id),
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
        store
    }

    fn initializer(store: &InMemorySessionStore) -> SessionInitializer {
        SessionInitializer::new(Clock::fixed(fixed_now()), Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn first_question_is_visited_and_persisted() {
        let store = seeded_store().await;

        let service = initializer(&store).initialize().await.unwrap();

        assert!(service.session().questions()[0].visited());
        assert!(!service.session().questions()[1].visited());
        let raw = store.get(SessionKey::Questions).await.unwrap().unwrap();
        assert!(decode_questions(&raw).unwrap()[0].visited());
    }

    #[tokio::test]
    async fn each_required_key_is_checked() {
        for key in [
            SessionKey::TakerIdentity,
            SessionKey::Questions,
            SessionKey::StartedAt,
        ] {
            let store = seeded_store().await;
            let mut remaining = Vec::new();
            for other in [
                SessionKey::TakerIdentity,
                SessionKey::Questions,
                SessionKey::StartedAt,
            ] {
                if other != key {
                    remaining.push((other, store.get(other).await.unwrap().unwrap()));
                }
            }
            store.clear().await.unwrap();
            for (other, value) in remaining {
                store.set(other, value).await.unwrap();
            }

            let err = initializer(&store).initialize().await.unwrap_err();
            assert!(matches!(err, SessionError::MissingSessionState(k) if k == key));
            assert_eq!(err.route(), Some(Route::Setup));
        }
    }

    #[tokio::test]
    async fn corrupt_questions_fall_back_to_setup() {
        let store = seeded_store().await;
        store
            .set(SessionKey::Questions, "[{\"id\":".into())
            .await
            .unwrap();

        let err = initializer(&store).initialize().await.unwrap_err();

        assert!(matches!(err, SessionError::MalformedPersistedData(_)));
        assert_eq!(err.route(), Some(Route::Setup));
    }

    #[tokio::test]
    async fn empty_question_set_is_malformed() {
        let store = seeded_store().await;
        store.set(SessionKey::Questions, "[]".into()).await.unwrap();

        let err = initializer(&store).initialize().await.unwrap_err();
        assert!(matches!(err, SessionError::MalformedPersistedData(_)));
    }

    #[tokio::test]
    async fn non_numeric_start_is_malformed() {
        let store = seeded_store().await;
        store
            .set(SessionKey::StartedAt, "yesterday".into())
            .await
            .unwrap();

        let err = initializer(&store).initialize().await.unwrap_err();
        assert!(matches!(err, SessionError::MalformedPersistedData(_)));
    }

    #[tokio::test]
    async fn submitted_session_routes_to_results() {
        let store = seeded_store().await;
        let mut service = initializer(&store).initialize().await.unwrap();
        service.submit().await.unwrap();

        let err = initializer(&store).initialize().await.unwrap_err();

        assert!(matches!(err, SessionError::Completed));
        assert_eq!(err.route(), Some(Route::Results));
    }

    #[tokio::test]
    async fn reload_restores_progress_with_recomputed_time() {
        let store = seeded_store().await;
        let mut service = initializer(&store).initialize().await.unwrap();
        service.go_to(1).await.unwrap();
        service.select_answer(Markup::from("B")).await.unwrap();
        let before = service.session().clone();

        let later = Clock::fixed(fixed_now() + Duration::seconds(600));
        let reloaded = SessionInitializer::new(later, Arc::new(store.clone()))
            .initialize()
            .await
            .unwrap();

        assert_eq!(reloaded.session(), &before);
        assert_eq!(reloaded.observe_countdown().remaining_secs, 1200);
    }
}

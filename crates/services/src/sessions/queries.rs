use quiz_core::model::{QuizSession, TakerIdentity};
use storage::codec::{
    decode_flag, decode_questions, decode_timestamp, encode_flag, encode_questions,
    encode_timestamp,
};
use storage::repository::{SessionKey, SessionStore};

use crate::error::SessionError;

/// Read/write helpers between a `QuizSession` and its key-value mirror.
pub(crate) struct SessionQueries;

impl SessionQueries {
    async fn require(store: &dyn SessionStore, key: SessionKey) -> Result<String, SessionError> {
        store
            .get(key)
            .await?
            .ok_or(SessionError::MissingSessionState(key))
    }

    /// Rebuild the session from the store.
    ///
    /// Taker, questions and start timestamp are required. The completion flag
    /// and submission instant default to "not submitted". The completion flag
    /// is the commit point: a submission instant without it is left over from
    /// an interrupted submit and is ignored.
    pub(crate) async fn load(store: &dyn SessionStore) -> Result<QuizSession, SessionError> {
        let taker = Self::require(store, SessionKey::TakerIdentity).await?;
        let questions = Self::require(store, SessionKey::Questions).await?;
        let started_at = Self::require(store, SessionKey::StartedAt).await?;

        let questions = decode_questions(&questions).map_err(SessionError::from_load)?;
        let started_at = decode_timestamp(&started_at).map_err(SessionError::from_load)?;
        let completed = match store.get(SessionKey::Completed).await? {
            Some(raw) => decode_flag(&raw).map_err(SessionError::from_load)?,
            None => false,
        };
        let submitted_at = match store.get(SessionKey::SubmittedAt).await? {
            Some(raw) if completed => {
                Some(decode_timestamp(&raw).map_err(SessionError::from_load)?)
            }
            Some(_) => {
                tracing::warn!("ignoring submission time of an unfinished submit");
                None
            }
            None => None,
        };

        QuizSession::from_persisted(
            TakerIdentity::new(taker),
            questions,
            started_at,
            completed,
            submitted_at,
        )
        .map_err(|err| SessionError::MalformedPersistedData(err.to_string()))
    }

    /// Write the whole question sequence back.
    pub(crate) async fn persist_questions(
        store: &dyn SessionStore,
        session: &QuizSession,
    ) -> Result<(), SessionError> {
        let raw = encode_questions(session.questions())?;
        store.set(SessionKey::Questions, raw).await?;
        Ok(())
    }

    /// Write the terminal snapshot. The completion flag goes last so a reader
    /// that sees it also sees the final questions and submission instant.
    pub(crate) async fn persist_completion(
        store: &dyn SessionStore,
        session: &QuizSession,
    ) -> Result<(), SessionError> {
        Self::persist_questions(store, session).await?;
        if let Some(submitted_at) = session.submitted_at() {
            store
                .set(SessionKey::SubmittedAt, encode_timestamp(submitted_at))
                .await?;
        }
        store
            .set(SessionKey::Completed, encode_flag(session.is_completed()))
            .await?;
        Ok(())
    }

    /// Replace whatever the store holds with a freshly started session.
    pub(crate) async fn persist_new(
        store: &dyn SessionStore,
        session: &QuizSession,
    ) -> Result<(), SessionError> {
        store.clear().await?;
        store
            .set(SessionKey::TakerIdentity, session.taker().as_str().to_owned())
            .await?;
        Self::persist_questions(store, session).await?;
        store
            .set(SessionKey::StartedAt, encode_timestamp(session.started_at()))
            .await?;
        Ok(())
    }
}

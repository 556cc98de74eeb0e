//! Text encodings of session values.
//!
//! Questions are stored as a JSON array using the question-source field names,
//! timestamps as decimal epoch milliseconds, and flags as `true` / `false`.

use chrono::{DateTime, Utc};
use quiz_core::model::{Markup, Question, QuestionId};
use serde::{Deserialize, Serialize};

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Persisted shape of a question, including progress.
///
/// This mirrors the domain `Question` so the store can serialize/deserialize
/// without leaking storage concerns into the domain layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub id: QuestionId,
    pub question: Markup,
    pub choices: Vec<Markup>,
    pub correct_answer: Markup,
    #[serde(default)]
    pub user_answer: Option<Markup>,
    #[serde(default)]
    pub visited: bool,
    #[serde(default)]
    pub attempted: bool,
}

impl QuestionRecord {
    #[must_use]
    pub fn from_question(question: &Question) -> Self {
        Self {
            id: question.id(),
            question: question.prompt().clone(),
            choices: question.choices().to_vec(),
            correct_answer: question.correct_answer().clone(),
            user_answer: question.user_answer().cloned(),
            visited: question.visited(),
            attempted: question.attempted(),
        }
    }

    /// Convert the record back into a domain `Question`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the progress flags are inconsistent.
    pub fn into_question(self) -> Result<Question, StorageError> {
        Question::from_persisted(
            self.id,
            self.question,
            self.choices,
            self.correct_answer,
            self.user_answer,
            self.visited,
            self.attempted,
        )
        .map_err(ser)
    }
}

/// # Errors
///
/// Returns `StorageError::Serialization` if JSON encoding fails.
pub fn encode_questions(questions: &[Question]) -> Result<String, StorageError> {
    let records: Vec<QuestionRecord> = questions.iter().map(QuestionRecord::from_question).collect();
    serde_json::to_string(&records).map_err(ser)
}

/// # Errors
///
/// Returns `StorageError::Serialization` if the JSON does not match the record
/// shape or a record breaks the question invariants.
pub fn decode_questions(raw: &str) -> Result<Vec<Question>, StorageError> {
    let records: Vec<QuestionRecord> = serde_json::from_str(raw).map_err(ser)?;
    records
        .into_iter()
        .map(QuestionRecord::into_question)
        .collect()
}

#[must_use]
pub fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.timestamp_millis().to_string()
}

/// # Errors
///
/// Returns `StorageError::Serialization` for anything but an in-range integer.
pub fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    let millis: i64 = raw.trim().parse().map_err(ser)?;
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| StorageError::Serialization(format!("timestamp out of range: {millis}")))
}

#[must_use]
pub fn encode_flag(value: bool) -> String {
    value.to_string()
}

/// # Errors
///
/// Returns `StorageError::Serialization` for anything but `true` or `false`.
pub fn decode_flag(raw: &str) -> Result<bool, StorageError> {
    match raw.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(StorageError::Serialization(format!("invalid flag: {other}"))),
    }
}

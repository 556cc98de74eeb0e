//! Scoring of a finished attempt.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::countdown::elapsed_secs;
use crate::model::{Question, QuestionId};

/// Per-question classification shown on the results view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionOutcome {
    Correct,
    Incorrect,
    NotAnswered,
}

impl QuestionOutcome {
    #[must_use]
    pub fn classify(question: &Question) -> Self {
        if question.is_correct() {
            Self::Correct
        } else if question.attempted() {
            Self::Incorrect
        } else {
            Self::NotAnswered
        }
    }
}

/// Coarse verdict on a percentage score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeBand {
    Excellent,
    Good,
    KeepLearning,
}

impl GradeBand {
    #[must_use]
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            70.. => Self::Excellent,
            50..=69 => Self::Good,
            _ => Self::KeepLearning,
        }
    }
}

/// Time from session start to submission, truncated to whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionTime {
    pub minutes: u64,
    pub seconds: u64,
}

impl CompletionTime {
    #[must_use]
    pub fn from_secs(total: u64) -> Self {
        Self {
            minutes: total / 60,
            seconds: total % 60,
        }
    }

    #[must_use]
    pub fn between(started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> Self {
        Self::from_secs(elapsed_secs(started_at, finished_at))
    }
}

impl fmt::Display for CompletionTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m {}s", self.minutes, self.seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionResult {
    pub id: QuestionId,
    pub outcome: QuestionOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResults {
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub grade: GradeBand,
    pub outcomes: Vec<QuestionResult>,
    pub completion_time: CompletionTime,
}

/// `round(100 × score / total)`, with halves rounded up. Zero when `total` is zero.
#[must_use]
pub fn percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let score = u64::from(score);
    let total = u64::from(total);
    u32::try_from((200 * score + total) / (2 * total)).unwrap_or(100)
}

/// Compute score, percentage and per-question outcomes for a final question set.
#[must_use]
pub fn derive_results(
    questions: &[Question],
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
) -> QuizResults {
    let outcomes: Vec<QuestionResult> = questions
        .iter()
        .map(|question| QuestionResult {
            id: question.id(),
            outcome: QuestionOutcome::classify(question),
        })
        .collect();

    let score = outcomes
        .iter()
        .filter(|result| result.outcome == QuestionOutcome::Correct)
        .count();
    let score = u32::try_from(score).unwrap_or(u32::MAX);
    let total = u32::try_from(questions.len()).unwrap_or(u32::MAX);
    let percentage = percentage(score, total);

    QuizResults {
        score,
        total,
        percentage,
        grade: GradeBand::from_percentage(percentage),
        outcomes,
        completion_time: CompletionTime::between(started_at, finished_at),
    }
}

use quiz_core::model::{Question, QuizSession};

use super::countdown::CountdownTick;

/// Aggregated view of quiz progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizProgress {
    pub total: usize,
    pub visited: usize,
    pub attempted: usize,
    pub current_index: usize,
    pub remaining_secs: u32,
    pub is_complete: bool,
}

/// Everything a view needs to draw the quiz screen at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSnapshot {
    pub session: QuizSession,
    pub current_index: usize,
    pub countdown: CountdownTick,
}

impl QuizSnapshot {
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.session.question(self.current_index)
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        QuizProgress {
            total: self.session.question_count(),
            visited: self.session.visited_count(),
            attempted: self.session.attempted_count(),
            current_index: self.current_index,
            remaining_secs: self.countdown.remaining_secs,
            is_complete: self.session.is_completed(),
        }
    }
}

use services::QuizSnapshot;

use crate::vm::markup_vm::markup_to_text;
use crate::vm::time_fmt::format_countdown;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimaryAction {
    Next,
    Submit,
}

impl PrimaryAction {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            PrimaryAction::Next => "Next",
            PrimaryAction::Submit => "Submit Quiz",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChoiceVm {
    /// 1-based, as typed by the taker.
    pub number: usize,
    pub text: String,
    pub selected: bool,
}

/// One cell of the question overview grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaletteItemVm {
    pub number: usize,
    pub active: bool,
    pub visited: bool,
    pub attempted: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizScreenVm {
    pub taker: String,
    pub clock_text: String,
    pub low_time: bool,
    pub position_text: String,
    pub progress_text: String,
    pub status_badge: &'static str,
    pub prompt: String,
    pub choices: Vec<ChoiceVm>,
    pub palette: Vec<PaletteItemVm>,
    pub can_go_previous: bool,
    pub primary_action: PrimaryAction,
}

impl From<&QuizSnapshot> for QuizScreenVm {
    fn from(snapshot: &QuizSnapshot) -> Self {
        let session = &snapshot.session;
        let total = session.question_count();
        let current = snapshot.current_index;
        let question = snapshot.current_question();

        let choices = question
            .map(|question| {
                question
                    .choices()
                    .iter()
                    .enumerate()
                    .map(|(i, choice)| ChoiceVm {
                        number: i + 1,
                        text: markup_to_text(choice),
                        selected: question.user_answer() == Some(choice),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let palette = session
            .questions()
            .iter()
            .enumerate()
            .map(|(i, q)| PaletteItemVm {
                number: i + 1,
                active: i == current,
                visited: q.visited(),
                attempted: q.attempted(),
            })
            .collect();

        let attempted = question.is_some_and(|q| q.attempted());

        Self {
            taker: session.taker().to_string(),
            clock_text: format_countdown(snapshot.countdown.remaining_secs),
            low_time: snapshot.countdown.is_low_time,
            position_text: format!("Question {} of {}", current + 1, total),
            progress_text: format!(
                "{} visited, {} answered",
                session.visited_count(),
                session.attempted_count()
            ),
            status_badge: if attempted { "Answered" } else { "Not Answered" },
            prompt: question
                .map(|q| markup_to_text(q.prompt()))
                .unwrap_or_default(),
            choices,
            palette,
            can_go_previous: current > 0,
            primary_action: if current + 1 >= total {
                PrimaryAction::Submit
            } else {
                PrimaryAction::Next
            },
        }
    }
}

use quiz_core::results::{GradeBand, QuestionOutcome};
use services::ResultsReport;

use crate::vm::markup_vm::markup_to_text;
use crate::vm::time_fmt::format_datetime;

fn grade_label(grade: GradeBand) -> &'static str {
    match grade {
        GradeBand::Excellent => "Excellent!",
        GradeBand::Good => "Good Job!",
        GradeBand::KeepLearning => "Keep Learning!",
    }
}

fn outcome_label(outcome: QuestionOutcome) -> &'static str {
    match outcome {
        QuestionOutcome::Correct => "Correct",
        QuestionOutcome::Incorrect => "Incorrect",
        QuestionOutcome::NotAnswered => "Not Answered",
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultRowVm {
    pub number: usize,
    pub prompt: String,
    pub outcome: QuestionOutcome,
    pub outcome_label: &'static str,
    pub your_answer: String,
    pub correct_answer: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultsScreenVm {
    pub taker: String,
    pub submitted_at_str: Option<String>,
    pub score_text: String,
    pub percentage_text: String,
    pub grade_label: &'static str,
    pub completion_text: String,
    pub rows: Vec<ResultRowVm>,
}

impl From<&ResultsReport> for ResultsScreenVm {
    fn from(report: &ResultsReport) -> Self {
        let results = &report.results;
        let rows = report
            .questions
            .iter()
            .zip(&results.outcomes)
            .enumerate()
            .map(|(i, (question, result))| ResultRowVm {
                number: i + 1,
                prompt: markup_to_text(question.prompt()),
                outcome: result.outcome,
                outcome_label: outcome_label(result.outcome),
                your_answer: question
                    .user_answer()
                    .map_or_else(|| "No answer provided".to_owned(), markup_to_text),
                correct_answer: markup_to_text(question.correct_answer()),
            })
            .collect();

        Self {
            taker: report.taker.to_string(),
            submitted_at_str: report.submitted_at.map(format_datetime),
            score_text: format!("{}/{}", results.score, results.total),
            percentage_text: format!("{}%", results.percentage),
            grade_label: grade_label(results.grade),
            completion_text: format!("Completed in {}", results.completion_time),
            rows,
        }
    }
}

use std::fmt::Write as _;

use services::{QuizSnapshot, SessionEvent};
use ui::vm::{PrimaryAction, QuizScreenVm, ResultsScreenVm};

pub const HELP: &str = "\
Commands:
  n            next question
  p            previous question
  g <number>   jump to question <number>
  a <number>   choose answer <number>
  t            show remaining time
  s            submit the quiz
  q            leave (the clock keeps running)
  h            this help";

/// One line of taker input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Event(SessionEvent),
    /// Choice number as typed; resolved against the question on screen.
    Answer(usize),
    Time,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Unknown(String),
    MissingNumber(&'static str),
    InvalidNumber(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Unknown(raw) => write!(f, "unknown command: {raw} (h for help)"),
            ParseError::MissingNumber(cmd) => write!(f, "{cmd} needs a number"),
            ParseError::InvalidNumber(raw) => write!(f, "not a positive number: {raw}"),
        }
    }
}

fn parse_number(raw: Option<&str>, cmd: &'static str) -> Result<usize, ParseError> {
    let raw = raw.ok_or(ParseError::MissingNumber(cmd))?;
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ParseError::InvalidNumber(raw.to_owned())),
    }
}

/// Parse a line typed by the taker. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Option<Result<ConsoleCommand, ParseError>> {
    let mut words = line.split_whitespace();
    let cmd = words.next()?;
    let arg = words.next();

    let parsed = match cmd {
        "n" | "next" => Ok(ConsoleCommand::Event(SessionEvent::Next)),
        "p" | "prev" | "previous" => Ok(ConsoleCommand::Event(SessionEvent::Previous)),
        "s" | "submit" => Ok(ConsoleCommand::Event(SessionEvent::Submit)),
        "g" | "go" => parse_number(arg, "g")
            .map(|n| ConsoleCommand::Event(SessionEvent::GoTo(n - 1))),
        "a" | "answer" => parse_number(arg, "a").map(ConsoleCommand::Answer),
        "t" | "time" => Ok(ConsoleCommand::Time),
        "h" | "help" | "?" => Ok(ConsoleCommand::Help),
        "q" | "quit" | "exit" => Ok(ConsoleCommand::Quit),
        other => Err(ParseError::Unknown(other.to_owned())),
    };
    Some(parsed)
}

/// Turn a typed choice number into an answer for the question on screen.
pub fn resolve_answer(snapshot: &QuizSnapshot, number: usize) -> Option<SessionEvent> {
    let question = snapshot.current_question()?;
    let choice = question.choices().get(number.checked_sub(1)?)?;
    Some(SessionEvent::SelectAnswer(choice.clone()))
}

#[must_use]
pub fn render_quiz(vm: &QuizScreenVm) -> String {
    let mut out = String::new();
    let warning = if vm.low_time { "  (less than 5 minutes left)" } else { "" };
    let _ = writeln!(out, "{}  |  {}{}", vm.taker, vm.clock_text, warning);

    let palette: Vec<String> = vm
        .palette
        .iter()
        .map(|item| {
            let mark = if item.attempted {
                '*'
            } else if item.visited {
                '.'
            } else {
                ' '
            };
            if item.active {
                format!("[{}{}]", item.number, mark)
            } else {
                format!(" {}{} ", item.number, mark)
            }
        })
        .collect();
    let _ = writeln!(out, "{}", palette.join(""));
    let _ = writeln!(out, "{} ({})", vm.position_text, vm.progress_text);
    let _ = writeln!(out);
    let _ = writeln!(out, "{}  [{}]", vm.prompt, vm.status_badge);
    for choice in &vm.choices {
        let marker = if choice.selected { '>' } else { ' ' };
        let _ = writeln!(out, " {marker} {}. {}", choice.number, choice.text);
    }
    let _ = writeln!(out);

    let mut actions = Vec::new();
    if vm.can_go_previous {
        actions.push("p: Previous");
    }
    actions.push(match vm.primary_action {
        PrimaryAction::Next => "n: Next",
        PrimaryAction::Submit => "s: Submit Quiz",
    });
    let _ = write!(out, "{}", actions.join("   "));
    out
}

#[must_use]
pub fn render_results(vm: &ResultsScreenVm) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Results for {}", vm.taker);
    if let Some(submitted) = &vm.submitted_at_str {
        let _ = writeln!(out, "Submitted {submitted}");
    }
    let _ = writeln!(
        out,
        "{}  Score {} ({})  {}",
        vm.grade_label, vm.score_text, vm.percentage_text, vm.completion_text
    );
    for row in &vm.rows {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}. {}  [{}]", row.number, row.prompt, row.outcome_label);
        let _ = writeln!(out, "   Your answer:    {}", row.your_answer);
        let _ = writeln!(out, "   Correct answer: {}", row.correct_answer);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_navigation_and_answers() {
        assert_eq!(
            parse_command("g 3"),
            Some(Ok(ConsoleCommand::Event(SessionEvent::GoTo(2))))
        );
        assert_eq!(parse_command(" a 2 "), Some(Ok(ConsoleCommand::Answer(2))));
        assert_eq!(
            parse_command("submit"),
            Some(Ok(ConsoleCommand::Event(SessionEvent::Submit)))
        );
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn rejects_bad_numbers() {
        assert_eq!(
            parse_command("g"),
            Some(Err(ParseError::MissingNumber("g")))
        );
        assert_eq!(
            parse_command("a 0"),
            Some(Err(ParseError::InvalidNumber("0".into())))
        );
        assert_eq!(
            parse_command("jump"),
            Some(Err(ParseError::Unknown("jump".into())))
        );
    }
}

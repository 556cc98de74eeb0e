mod countdown;
mod initializer;
mod progress;
mod queries;
mod results;
mod service;
mod setup;
mod workflow;

// Public API of the quiz session subsystem.
pub use crate::error::SessionError;
pub use countdown::{Countdown, CountdownTick};
pub use initializer::SessionInitializer;
pub use progress::{QuizProgress, QuizSnapshot};
pub use results::{ResultsReport, ResultsService};
pub use service::{QuizSessionService, Submission};
pub use setup::{SessionSetupService, SourceQuestion, parse_question_source};
pub use workflow::{LoopExit, LoopOutcome, SessionEvent, SessionHandle, SessionLoop, SubmitTrigger};

#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod route;
pub mod sessions;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, SessionError, SetupError};
pub use route::Route;

pub use sessions::{
    Countdown, CountdownTick, LoopExit, LoopOutcome, QuizProgress, QuizSessionService,
    QuizSnapshot, ResultsReport, ResultsService, SessionEvent, SessionHandle, SessionInitializer,
    SessionLoop, SessionSetupService, SourceQuestion, Submission, SubmitTrigger,
    parse_question_source,
};

mod ids;
mod markup;
mod question;
mod session;

pub use ids::QuestionId;
pub use markup::Markup;

pub use question::{Question, QuestionDraft, QuestionError};
pub use session::{QuizSession, QuizSessionError, TakerIdentity};

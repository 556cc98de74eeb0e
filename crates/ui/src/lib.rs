pub mod vm;

pub use vm::{QuizScreenVm, ResultsScreenVm};

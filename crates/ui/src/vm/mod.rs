mod markup_vm;
mod quiz_vm;
mod results_vm;
mod time_fmt;

pub use markup_vm::{markup_to_text, sanitize_markup};
pub use quiz_vm::{ChoiceVm, PaletteItemVm, PrimaryAction, QuizScreenVm};
pub use results_vm::{ResultRowVm, ResultsScreenVm};
pub use time_fmt::{format_countdown, format_datetime};

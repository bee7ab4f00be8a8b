mod credential;
mod error;
pub mod prompt;
mod questions;
mod session;

pub use credential::Credential;
pub use error::WizardError;
pub use prompt::LetterFraming;
pub use questions::QuestionSet;
pub use session::{Letter, LetterRequest, LetterState, SessionState};

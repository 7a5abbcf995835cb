//! Baseline questionnaire, its persistence, and the value model it drives.

pub mod questions;
pub mod store;
pub mod value;
pub mod wizard;

pub use questions::{Answers, QuestionId, QUESTIONS};
pub use store::{AnswerStore, OnboardingOutcome, StoredOnboarding};
pub use value::{calculate_value, ValueEstimate};
pub use wizard::{Wizard, WizardState};

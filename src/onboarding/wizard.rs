use super::questions::{Answers, Question, QUESTIONS};
use super::store::{AnswerStore, OnboardingOutcome, StoredOnboarding};
use crate::error::{DeployLensError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    NotStarted,
    InProgress { step: usize },
    Completed,
    Skipped,
}

/// Step-by-step questionnaire. Answers persist only on skip or completion.
pub struct Wizard {
    store: AnswerStore,
    state: WizardState,
    answers: Answers,
}

impl Wizard {
    /// Start from whatever answers were stored before, if any.
    pub fn new(store: AnswerStore) -> Result<Self> {
        let answers = store.answers()?;
        Ok(Self {
            store,
            state: WizardState::NotStarted,
            answers,
        })
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    pub fn current_question(&self) -> Option<&'static Question> {
        match self.state {
            WizardState::InProgress { step } => QUESTIONS.get(step),
            _ => None,
        }
    }

    pub fn start(&mut self) {
        self.state = WizardState::InProgress { step: 0 };
    }

    /// Answer the current question and advance; the last answer completes
    /// the wizard and saves.
    pub fn select(&mut self, option_id: &str) -> Result<WizardState> {
        let WizardState::InProgress { step } = self.state else {
            return Err(DeployLensError::Onboarding(
                "no question is being asked".to_string(),
            ));
        };
        let question = &QUESTIONS[step];
        if question.option(option_id).is_none() {
            return Err(DeployLensError::Onboarding(format!(
                "'{option_id}' is not an option for {}",
                question.id.as_str()
            )));
        }

        self.answers.set(question.id, option_id);

        if step + 1 < QUESTIONS.len() {
            self.state = WizardState::InProgress { step: step + 1 };
        } else {
            self.store.save(&StoredOnboarding::new(
                OnboardingOutcome::Completed,
                self.answers.clone(),
            ))?;
            self.state = WizardState::Completed;
        }
        Ok(self.state)
    }

    pub fn back(&mut self) {
        if let WizardState::InProgress { step } = self.state {
            self.state = WizardState::InProgress {
                step: step.saturating_sub(1),
            };
        }
    }

    /// Save the answers given so far, possibly none, and leave.
    pub fn skip(&mut self) -> Result<()> {
        self.store.save(&StoredOnboarding::new(
            OnboardingOutcome::Skipped,
            self.answers.clone(),
        ))?;
        self.state = WizardState::Skipped;
        Ok(())
    }
}

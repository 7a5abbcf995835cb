use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::questions::{Answers, QUESTIONNAIRE_VERSION};
use crate::error::{DeployLensError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingOutcome {
    Completed,
    Skipped,
}

/// Persisted questionnaire state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredOnboarding {
    pub version: u32,
    #[serde(rename = "status")]
    pub outcome: OnboardingOutcome,
    pub answers: Answers,
}

impl StoredOnboarding {
    pub fn new(outcome: OnboardingOutcome, answers: Answers) -> Self {
        Self {
            version: QUESTIONNAIRE_VERSION,
            outcome,
            answers,
        }
    }
}

/// JSON file holding the onboarding answers (`~/.deploylens/onboarding.json`).
#[derive(Debug, Clone)]
pub struct AnswerStore {
    path: PathBuf,
}

impl AnswerStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn user_default() -> Option<Self> {
        dirs::home_dir().map(|home| Self::new(home.join(".deploylens").join("onboarding.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<StoredOnboarding>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let stored: StoredOnboarding = serde_json::from_str(&content).map_err(|e| {
            DeployLensError::Store(format!("Unreadable {}: {e}", self.path.display()))
        })?;

        if stored.version != QUESTIONNAIRE_VERSION {
            debug!(
                "Onboarding answers were saved with questionnaire v{} (current v{QUESTIONNAIRE_VERSION})",
                stored.version
            );
        }

        Ok(Some(stored))
    }

    /// Stored answers, or an empty set when nothing was saved yet.
    pub fn answers(&self) -> Result<Answers> {
        Ok(self.load()?.map(|s| s.answers).unwrap_or_default())
    }

    pub fn save(&self, stored: &StoredOnboarding) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(stored)?)?;
        info!(
            "Saved {} onboarding answers to {}",
            stored.answers.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Delete stored answers. Returns whether anything was removed.
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

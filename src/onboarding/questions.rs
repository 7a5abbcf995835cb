//! Baseline questionnaire and the coefficients behind each answer.
//!
//! The table is the financial model's input surface: every option carries the
//! number the value calculator uses. Bump [`QUESTIONNAIRE_VERSION`] whenever
//! an id or coefficient changes.

use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};

pub const QUESTIONNAIRE_VERSION: u32 = 1;

/// Discriminants are positions in [`QUESTIONS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QuestionId {
    DeployEffort = 0,
    PeopleInvolved = 1,
    RecoveryTime = 2,
    DeployFrequency = 3,
    DeployConfidence = 4,
    AfterHours = 5,
    ApprovalWait = 6,
}

impl QuestionId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DeployEffort => "deployEffort",
            Self::PeopleInvolved => "peopleInvolved",
            Self::RecoveryTime => "recoveryTime",
            Self::DeployFrequency => "deployFrequency",
            Self::DeployConfidence => "deployConfidence",
            Self::AfterHours => "afterHours",
            Self::ApprovalWait => "approvalWait",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Minutes,
    People,
    Hours,
    DeploysPerMonth,
    ConfidenceScore,
    Fraction,
    WaitHours,
}

#[derive(Debug)]
pub struct QuestionOption {
    pub id: &'static str,
    pub label: &'static str,
    pub value: f64,
}

#[derive(Debug)]
pub struct Question {
    pub id: QuestionId,
    pub prompt: &'static str,
    pub unit: Unit,
    pub options: &'static [QuestionOption],
}

impl Question {
    pub fn option(&self, option_id: &str) -> Option<&'static QuestionOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

const fn opt(id: &'static str, label: &'static str, value: f64) -> QuestionOption {
    QuestionOption { id, label, value }
}

pub static QUESTIONS: [Question; 7] = [
    Question {
        id: QuestionId::DeployEffort,
        prompt: "Before automation, how much hands-on effort did one production deployment take?",
        unit: Unit::Minutes,
        options: &[
            opt("under15min", "Under 15 minutes", 10.0),
            opt("15to60min", "15 to 60 minutes", 30.0),
            opt("1to3hr", "1 to 3 hours", 120.0),
            opt("3to8hr", "3 to 8 hours", 300.0),
            opt("fullDay", "A full day or more", 480.0),
        ],
    },
    Question {
        id: QuestionId::PeopleInvolved,
        prompt: "How many people were involved in a typical deployment?",
        unit: Unit::People,
        options: &[
            opt("1", "Just one person", 1.0),
            opt("2", "Two people", 2.0),
            opt("3to5", "Three to five people", 4.0),
            opt("6plus", "Six or more", 7.0),
        ],
    },
    Question {
        id: QuestionId::RecoveryTime,
        prompt: "When a deployment failed, how long did recovery usually take?",
        unit: Unit::Hours,
        options: &[
            opt("under1hr", "Under an hour", 0.5),
            opt("1to4hr", "1 to 4 hours", 2.5),
            opt("4to24hr", "4 to 24 hours", 12.0),
            opt("days", "Days", 48.0),
        ],
    },
    Question {
        id: QuestionId::DeployFrequency,
        prompt: "How often did you deploy to production?",
        unit: Unit::DeploysPerMonth,
        options: &[
            opt("daily", "Daily", 20.0),
            opt("weekly", "Weekly", 4.0),
            opt("biweekly", "Every two weeks", 2.0),
            opt("monthly", "Monthly", 1.0),
            opt("quarterly", "Quarterly or less", 0.33),
        ],
    },
    Question {
        id: QuestionId::DeployConfidence,
        prompt: "How confident were you that a deployment would succeed?",
        unit: Unit::ConfidenceScore,
        options: &[
            opt("veryLow", "Very low", 20.0),
            opt("low", "Low", 40.0),
            opt("medium", "Medium", 60.0),
            opt("high", "High", 80.0),
            opt("veryHigh", "Very high", 95.0),
        ],
    },
    Question {
        id: QuestionId::AfterHours,
        prompt: "How often did deployments happen outside working hours?",
        unit: Unit::Fraction,
        options: &[
            opt("never", "Never", 0.0),
            opt("sometimes", "Sometimes", 0.25),
            opt("often", "Often", 0.5),
            opt("always", "Almost always", 0.9),
        ],
    },
    Question {
        id: QuestionId::ApprovalWait,
        prompt: "How long did a release wait for approval before it could ship?",
        unit: Unit::WaitHours,
        options: &[
            opt("none", "No approval step", 0.0),
            opt("hours", "A few hours", 4.0),
            opt("day", "About a day", 24.0),
            opt("days", "Several days", 72.0),
            opt("week", "A week or more", 168.0),
        ],
    },
];

pub fn question(id: QuestionId) -> &'static Question {
    &QUESTIONS[id as usize]
}

/// Selected option id per question id, exactly as persisted.
///
/// Any subset of questions may be answered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answers(BTreeMap<String, String>);

impl Answers {
    pub fn set(&mut self, question: QuestionId, option_id: &str) {
        self.0
            .insert(question.as_str().to_string(), option_id.to_string());
    }

    pub fn get(&self, question: QuestionId) -> Option<&str> {
        self.0.get(question.as_str()).map(String::as_str)
    }

    /// Coefficient of the selected option. Answers the current table does not
    /// know are ignored.
    pub fn value(&self, id: QuestionId) -> Option<f64> {
        let option_id = self.get(id)?;
        let option = question(id).option(option_id);
        if option.is_none() {
            warn!(
                "Ignoring unknown answer '{option_id}' for {}",
                id.as_str()
            );
        }
        option.map(|o| o.value)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

//! Value model: baseline answers x current activity -> estimated savings.
//!
//! Each facet is computed only when its own answers are present, so any
//! subset of answers yields a (possibly partial) estimate.

use serde::Serialize;

use super::questions::{Answers, QuestionId};
use crate::insights::Summary;

pub const HOURLY_RATE: f64 = 85.0;
pub const AUTOMATED_EFFORT_MINUTES: f64 = 2.0;
pub const AUTOMATED_RECOVERY_HOURS: f64 = 0.17;
pub const AUTOMATED_APPROVAL_HOURS: f64 = 0.083;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineeringTime {
    pub minutes_saved_per_deploy: f64,
    pub hours_saved: f64,
    pub cost_saved: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentReduction {
    pub hours_saved: f64,
    pub cost_saved: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Throughput {
    pub baseline_per_month: f64,
    pub current_per_month: f64,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Confidence {
    pub baseline: f64,
    pub current: f64,
    pub improvement: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AfterHours {
    pub hours_removed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadTime {
    pub baseline_hours: f64,
    pub hours_saved: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueEstimate {
    pub engineering_time: Option<EngineeringTime>,
    pub incident_reduction: Option<IncidentReduction>,
    pub throughput: Option<Throughput>,
    pub confidence: Option<Confidence>,
    pub after_hours: Option<AfterHours>,
    pub lead_time: Option<LeadTime>,
    pub total_cost_saved: f64,
    pub has_data: bool,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Project `answers` onto `summary`. `None` when nothing has been answered.
#[allow(clippy::cast_precision_loss)]
pub fn calculate_value(summary: &Summary, answers: &Answers) -> Option<ValueEstimate> {
    if answers.is_empty() {
        return None;
    }

    let deployments = summary.kpis.deployments as f64;
    let failed = summary.totals.failed as f64;
    let effort = answers.value(QuestionId::DeployEffort);
    let people = answers.value(QuestionId::PeopleInvolved);

    let engineering_time = effort.zip(people).map(|(effort, people)| {
        let per_deploy = (effort - AUTOMATED_EFFORT_MINUTES).max(0.0);
        let hours = per_deploy * people * deployments / 60.0;
        EngineeringTime {
            minutes_saved_per_deploy: per_deploy,
            hours_saved: hours.round(),
            cost_saved: (hours * HOURLY_RATE).round(),
        }
    });

    let incident_reduction = answers.value(QuestionId::RecoveryTime).map(|recovery| {
        let hours = ((recovery - AUTOMATED_RECOVERY_HOURS) * failed).max(0.0);
        IncidentReduction {
            hours_saved: round1(hours),
            cost_saved: (hours * HOURLY_RATE * people.unwrap_or(1.0)).round(),
        }
    });

    let throughput = answers.value(QuestionId::DeployFrequency).map(|baseline| {
        let current = summary.kpis.deploys_last_30_days as f64;
        let multiplier = if baseline > 0.0 && current > 0.0 {
            round1(current / baseline)
        } else {
            0.0
        };
        Throughput {
            baseline_per_month: baseline,
            current_per_month: current,
            multiplier,
        }
    });

    let confidence = answers.value(QuestionId::DeployConfidence).map(|baseline| {
        let current = f64::from(summary.kpis.success_rate);
        Confidence {
            baseline,
            current,
            improvement: (current - baseline).max(0.0),
        }
    });

    let after_hours = answers
        .value(QuestionId::AfterHours)
        .zip(effort)
        .map(|(fraction, effort)| AfterHours {
            hours_removed: (deployments * fraction * effort / 60.0).round(),
        });

    let lead_time = answers.value(QuestionId::ApprovalWait).map(|baseline| LeadTime {
        baseline_hours: baseline,
        hours_saved: round1((baseline - AUTOMATED_APPROVAL_HOURS).max(0.0)),
    });

    let total_cost_saved = engineering_time.as_ref().map_or(0.0, |e| e.cost_saved)
        + incident_reduction.as_ref().map_or(0.0, |i| i.cost_saved);

    let has_data = engineering_time.is_some()
        || incident_reduction.is_some()
        || throughput.is_some()
        || confidence.is_some()
        || after_hours.is_some()
        || lead_time.is_some();

    Some(ValueEstimate {
        engineering_time,
        incident_reduction,
        throughput,
        confidence,
        after_hours,
        lead_time,
        total_cost_saved,
        has_data,
    })
}

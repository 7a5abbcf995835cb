use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::server::types::TaskState;

/// One fetch cycle's aggregated report; the sole input to every view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub server_version: Option<String>,
    pub collected_at: DateTime<Utc>,
    pub kpis: Kpis,
    pub totals: OutcomeTotals,
    pub spaces: Vec<SpaceBreakdown>,
    pub environments: Vec<EnvironmentHealth>,
    pub projects: Vec<ProjectActivity>,
    pub recent_deployments: Vec<EnrichedDeployment>,
    pub weekly_trend: Vec<WeeklyBucket>,
    pub license: Option<LicenseSummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Kpis {
    pub total_spaces: usize,
    pub active_spaces: usize,
    pub projects: usize,
    pub environments: usize,
    pub machines: u64,
    pub healthy_machines: u64,
    pub releases: u64,
    pub runbooks: u64,
    pub deployments: usize,
    pub success_rate: u32,
    pub mttr_minutes: Option<f64>,
    pub avg_duration_minutes: Option<f64>,
    pub deploys_last_30_days: usize,
    pub deploy_frequency_per_day: f64,
    pub time_saved_hours: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutcomeTotals {
    pub success: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl OutcomeTotals {
    pub fn counted(&self) -> usize {
        self.success + self.failed + self.cancelled
    }

    pub fn success_rate(&self) -> u32 {
        percent(self.success, self.counted())
    }
}

impl std::ops::AddAssign for OutcomeTotals {
    fn add_assign(&mut self, other: Self) {
        self.success += other.success;
        self.failed += other.failed;
        self.cancelled += other.cancelled;
    }
}

/// `part / whole` as a whole percentage; 0 when `whole` is 0.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpaceBreakdown {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub projects: usize,
    pub environments: usize,
    pub machines: u64,
    pub healthy_machines: u64,
    pub releases: u64,
    pub runbooks: u64,
    pub deployments: usize,
    pub outcomes: OutcomeTotals,
    pub success_rate: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentTier {
    Production,
    Staging,
    Dev,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthBadge {
    Healthy,
    Warning,
    Critical,
    #[serde(rename = "No data")]
    NoData,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentHealth {
    pub name: String,
    pub tier: EnvironmentTier,
    pub success: usize,
    pub failed: usize,
    pub total: usize,
    pub success_rate: u32,
    pub badge: HealthBadge,
    pub spaces: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectActivity {
    pub space_name: String,
    pub project_id: String,
    pub project_name: String,
    pub deployments: usize,
    pub success: usize,
    pub failed: usize,
    pub last_deployed: Option<DateTime<Utc>>,
}

/// Raw deployment merged with its dashboard status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedDeployment {
    pub id: String,
    pub space_id: String,
    pub space_name: String,
    pub project_id: String,
    pub project_name: String,
    pub environment_id: String,
    pub environment_name: String,
    pub release_version: Option<String>,
    pub state: TaskState,
    pub duration: String,
    pub created: Option<DateTime<Utc>>,
    pub completed_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeeklyBucket {
    pub year: i32,
    pub week: u32,
    pub label: String,
    pub success: usize,
    pub failed: usize,
    pub total: usize,
    pub show_year: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonthlyBucket {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub success: usize,
    pub failed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LicenseSummary {
    pub is_compliant: Option<bool>,
    pub edition: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub days_to_expiry: Option<i64>,
}

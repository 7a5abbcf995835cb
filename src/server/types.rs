use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Paged collection envelope shared by every list endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceCollection<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total_results: Option<u64>,
}

impl<T> Default for ResourceCollection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total_results: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct ServerInfo {
    pub version: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Space {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LicenseUsage {
    pub spaces_usage: Vec<SpaceUsage>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct SpaceUsage {
    pub space_id: String,
    pub projects_count: u64,
    pub machines_count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct LicenseStatus {
    pub is_compliant: Option<bool>,
    pub effective_edition: Option<String>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub effective_expiry_date: Option<DateTime<Utc>>,
    pub days_to_effective_expiry_date: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Project {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Environment {
    pub id: String,
    pub name: String,
}

/// Machine health histogram for one space.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EnvironmentsSummary {
    pub machine_health_status_summaries: BTreeMap<String, u64>,
    pub total_machines: Option<u64>,
}

impl EnvironmentsSummary {
    pub fn total(&self) -> u64 {
        self.total_machines
            .unwrap_or_else(|| self.machine_health_status_summaries.values().sum())
    }

    pub fn healthy(&self) -> u64 {
        self.machine_health_status_summaries
            .get("Healthy")
            .copied()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Dashboard {
    pub items: Vec<DashboardItem>,
}

/// Latest deployment for one project x environment pair.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DashboardItem {
    pub deployment_id: String,
    pub project_id: String,
    pub environment_id: String,
    pub release_version: Option<String>,
    pub state: Option<TaskState>,
    pub duration: Option<String>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub completed_time: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub queue_time: Option<DateTime<Utc>>,
}

/// Raw deployment list entry; state is rarely reliable here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Deployment {
    pub id: String,
    pub project_id: String,
    pub environment_id: String,
    pub release_version: Option<String>,
    pub state: Option<TaskState>,
    pub duration: Option<String>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub created: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub queue_time: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub completed_time: Option<DateTime<Utc>>,
}

impl Deployment {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.created.or(self.queue_time)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Machine {
    pub health_status: Option<String>,
}

/// Cross-space deployment task with timing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Task {
    pub id: String,
    pub space_id: Option<String>,
    pub name: String,
    pub state: Option<TaskState>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub completed_time: Option<DateTime<Utc>>,
}

impl Task {
    /// Wall-clock execution time, when both ends are known.
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.start_time, self.completed_time) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum TaskState {
    Success,
    Failed,
    Canceled,
    TimedOut,
    Executing,
    Cancelling,
    Queued,
    Unknown,
}

impl From<String> for TaskState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Success" => Self::Success,
            "Failed" => Self::Failed,
            "Canceled" | "Cancelled" => Self::Canceled,
            "TimedOut" => Self::TimedOut,
            "Executing" => Self::Executing,
            "Cancelling" => Self::Cancelling,
            "Queued" => Self::Queued,
            _ => Self::Unknown,
        }
    }
}

/// Timestamps that fail to parse are treated as absent rather than failing
/// the whole payload.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| {
        DateTime::parse_from_rfc3339(&value)
            .ok()
            .map(|parsed| parsed.with_timezone(&Utc))
    }))
}

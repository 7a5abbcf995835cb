use std::collections::HashMap;

use futures::{stream, StreamExt};
use log::{info, warn};

use super::client::ApiClient;
use super::types::{
    Dashboard, DashboardItem, Deployment, Environment, EnvironmentsSummary, Machine, Project,
    ResourceCollection, Space,
};
use crate::error::Result;

/// Everything fetched for one active space in a cycle.
#[derive(Debug, Clone)]
pub struct SpaceData {
    pub space: Space,
    pub projects: Vec<Project>,
    pub environments: Vec<Environment>,
    pub environments_summary: Option<EnvironmentsSummary>,
    pub dashboard: Option<Dashboard>,
    pub deployments: Vec<Deployment>,
    pub machines: Vec<Machine>,
    pub release_count: Option<u64>,
    pub runbook_count: Option<u64>,
    project_names: HashMap<String, String>,
    environment_names: HashMap<String, String>,
}

impl SpaceData {
    pub fn new(
        space: Space,
        projects: Vec<Project>,
        environments: Vec<Environment>,
        deployments: Vec<Deployment>,
    ) -> Self {
        let project_names = projects
            .iter()
            .map(|p| (p.id.clone(), p.name.clone()))
            .collect();
        let environment_names = environments
            .iter()
            .map(|e| (e.id.clone(), e.name.clone()))
            .collect();

        Self {
            space,
            projects,
            environments,
            environments_summary: None,
            dashboard: None,
            deployments,
            machines: Vec::new(),
            release_count: None,
            runbook_count: None,
            project_names,
            environment_names,
        }
    }

    /// Project name, or the id when the project is unknown.
    pub fn project_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.project_names.get(id).map_or(id, String::as_str)
    }

    /// Environment name, or the id when the environment is unknown.
    pub fn environment_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.environment_names.get(id).map_or(id, String::as_str)
    }

    pub fn dashboard_items(&self) -> &[DashboardItem] {
        self.dashboard
            .as_ref()
            .map(|dashboard| dashboard.items.as_slice())
            .unwrap_or_default()
    }

    /// `(total, healthy)` machines, preferring the health histogram.
    pub fn machine_health(&self) -> (u64, u64) {
        if let Some(summary) = &self.environments_summary {
            return (summary.total(), summary.healthy());
        }

        let healthy = self
            .machines
            .iter()
            .filter(|m| m.health_status.as_deref() == Some("Healthy"))
            .count();
        (self.machines.len() as u64, healthy as u64)
    }
}

/// Fetch one space. Sub-fetch failures degrade to empty data for that piece.
pub async fn fetch_space(client: &ApiClient, space: Space) -> SpaceData {
    let id = space.id.as_str();

    let endpoints = [
        format!("/api/{id}/projects?take=1000"),
        format!("/api/{id}/environments?take=100"),
        format!("/api/{id}/environments/summary"),
        format!("/api/{id}/dashboard"),
        format!("/api/{id}/deployments?take=200"),
        format!("/api/{id}/machines?take=200"),
        format!("/api/{id}/releases?take=0"),
        format!("/api/{id}/runbooks?take=0"),
    ];

    let (projects, environments, summary, dashboard, deployments, machines, releases, runbooks) = tokio::join!(
        client.safe_get::<ResourceCollection<Project>>(&endpoints[0]),
        client.safe_get::<ResourceCollection<Environment>>(&endpoints[1]),
        client.safe_get::<EnvironmentsSummary>(&endpoints[2]),
        client.safe_get::<Dashboard>(&endpoints[3]),
        client.safe_get::<ResourceCollection<Deployment>>(&endpoints[4]),
        client.safe_get::<ResourceCollection<Machine>>(&endpoints[5]),
        client.safe_get::<ResourceCollection<serde_json::Value>>(&endpoints[6]),
        client.safe_get::<ResourceCollection<serde_json::Value>>(&endpoints[7]),
    );

    let name = space.name.as_str();
    let projects = degrade(name, "projects", projects).unwrap_or_default().items;
    let environments = degrade(name, "environments", environments)
        .unwrap_or_default()
        .items;
    let deployments = degrade(name, "deployments", deployments)
        .unwrap_or_default()
        .items;

    let mut data = SpaceData::new(space.clone(), projects, environments, deployments);
    data.environments_summary = degrade(name, "environment summary", summary);
    data.dashboard = degrade(name, "dashboard", dashboard);
    data.machines = degrade(name, "machines", machines).unwrap_or_default().items;
    data.release_count = degrade(name, "releases", releases).and_then(|r| r.total_results);
    data.runbook_count = degrade(name, "runbooks", runbooks).and_then(|r| r.total_results);
    data
}

fn degrade<T>(space: &str, what: &str, result: Result<Option<T>>) -> Option<T> {
    result.unwrap_or_else(|e| {
        warn!("Space '{space}': {what} unavailable: {e}");
        None
    })
}

/// Fetch every space, at most `concurrency` at a time, preserving input order.
pub async fn fetch_all(client: &ApiClient, spaces: &[Space], concurrency: usize) -> Vec<SpaceData> {
    info!(
        "Fetching data for {} spaces (up to {concurrency} in parallel)...",
        spaces.len()
    );

    let data: Vec<SpaceData> = stream::iter(spaces.iter().cloned())
        .map(|space| fetch_space(client, space))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    info!(
        "Fetched {} deployments across {} spaces",
        data.iter().map(|d| d.deployments.len()).sum::<usize>(),
        data.len()
    );

    data
}

use indexmap::IndexMap;

use crate::insights::{EnrichedDeployment, OutcomeTotals, ProjectActivity, SpaceBreakdown};
use crate::server::space_data::SpaceData;
use crate::server::types::{Task, TaskState};

/// Success/failed/cancelled counts for one space.
///
/// Task history is the primary source. Only when no task belongs to the space
/// do the dashboard's latest-status items stand in, and that fallback never
/// reports cancellations.
pub fn space_outcomes(data: &SpaceData, tasks: &[Task]) -> OutcomeTotals {
    let space_tasks: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.space_id.as_deref() == Some(data.space.id.as_str()))
        .collect();

    if space_tasks.is_empty() {
        let items = data.dashboard_items();
        return OutcomeTotals {
            success: items
                .iter()
                .filter(|i| i.state == Some(TaskState::Success))
                .count(),
            failed: items
                .iter()
                .filter(|i| i.state == Some(TaskState::Failed))
                .count(),
            cancelled: 0,
        };
    }

    space_tasks
        .iter()
        .fold(OutcomeTotals::default(), |mut totals, task| {
            match task.state {
                Some(TaskState::Success) => totals.success += 1,
                Some(TaskState::Failed) => totals.failed += 1,
                Some(TaskState::Canceled) => totals.cancelled += 1,
                _ => {}
            }
            totals
        })
}

/// Per-space rows, busiest space first.
pub fn space_breakdown(spaces: &[SpaceData], tasks: &[Task]) -> Vec<SpaceBreakdown> {
    let mut rows: Vec<SpaceBreakdown> = spaces
        .iter()
        .map(|data| {
            let outcomes = space_outcomes(data, tasks);
            let (machines, healthy_machines) = data.machine_health();

            SpaceBreakdown {
                id: data.space.id.clone(),
                name: data.space.name.clone(),
                description: data.space.description.clone(),
                projects: data.projects.len(),
                environments: data.environments.len(),
                machines,
                healthy_machines,
                releases: data.release_count.unwrap_or(0),
                runbooks: data.runbook_count.unwrap_or(0),
                deployments: data.deployments.len(),
                outcomes,
                success_rate: outcomes.success_rate(),
            }
        })
        .collect();

    rows.sort_by(|a, b| b.deployments.cmp(&a.deployments));
    rows
}

/// Per-project activity from the enriched deployment list, busiest first.
pub fn project_activity(deployments: &[EnrichedDeployment]) -> Vec<ProjectActivity> {
    let mut projects: IndexMap<(&str, &str), ProjectActivity> = IndexMap::new();

    for deployment in deployments {
        let entry = projects
            .entry((deployment.space_id.as_str(), deployment.project_id.as_str()))
            .or_insert_with(|| ProjectActivity {
                space_name: deployment.space_name.clone(),
                project_id: deployment.project_id.clone(),
                project_name: deployment.project_name.clone(),
                deployments: 0,
                success: 0,
                failed: 0,
                last_deployed: None,
            });

        entry.deployments += 1;
        match deployment.state {
            TaskState::Success => entry.success += 1,
            TaskState::Failed => entry.failed += 1,
            _ => {}
        }
        entry.last_deployed = entry.last_deployed.max(deployment.created);
    }

    let mut projects: Vec<ProjectActivity> = projects.into_values().collect();
    projects.sort_by(|a, b| {
        b.deployments
            .cmp(&a.deployments)
            .then_with(|| a.project_name.cmp(&b.project_name))
    });
    projects
}

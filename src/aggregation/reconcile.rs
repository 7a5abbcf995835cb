use std::collections::HashMap;

use crate::insights::EnrichedDeployment;
use crate::server::space_data::SpaceData;
use crate::server::types::{DashboardItem, TaskState};

const NO_DURATION: &str = "--";

/// Merge every raw deployment with its dashboard status, newest first.
///
/// Dashboard state, duration, release version and completion time win when
/// the dashboard knows the deployment; otherwise raw values are kept and the
/// state defaults to `Unknown`.
pub fn enrich_deployments(spaces: &[SpaceData]) -> Vec<EnrichedDeployment> {
    let latest: HashMap<&str, &DashboardItem> = spaces
        .iter()
        .flat_map(SpaceData::dashboard_items)
        .filter(|item| !item.deployment_id.is_empty())
        .map(|item| (item.deployment_id.as_str(), item))
        .collect();

    let mut enriched: Vec<EnrichedDeployment> = spaces
        .iter()
        .flat_map(|data| {
            let latest = &latest;
            data.deployments.iter().map(move |deployment| {
                let item = latest.get(deployment.id.as_str()).copied();

                EnrichedDeployment {
                    id: deployment.id.clone(),
                    space_id: data.space.id.clone(),
                    space_name: data.space.name.clone(),
                    project_id: deployment.project_id.clone(),
                    project_name: data.project_name(&deployment.project_id).to_string(),
                    environment_id: deployment.environment_id.clone(),
                    environment_name: data
                        .environment_name(&deployment.environment_id)
                        .to_string(),
                    release_version: item
                        .and_then(|i| i.release_version.clone())
                        .or_else(|| deployment.release_version.clone()),
                    state: item
                        .and_then(|i| i.state)
                        .or(deployment.state)
                        .unwrap_or(TaskState::Unknown),
                    duration: item
                        .and_then(|i| i.duration.clone())
                        .or_else(|| deployment.duration.clone())
                        .unwrap_or_else(|| NO_DURATION.to_string()),
                    created: deployment.timestamp(),
                    completed_time: item
                        .and_then(|i| i.completed_time)
                        .or(deployment.completed_time),
                }
            })
        })
        .collect();

    enriched.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| a.id.cmp(&b.id)));
    enriched
}

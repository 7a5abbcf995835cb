use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::insights::{percent, EnvironmentHealth, EnvironmentTier, HealthBadge};
use crate::server::space_data::SpaceData;
use crate::server::types::TaskState;

/// Classify an environment by name.
///
/// Anything mentioning "prod" is production unless it is a pre-prod or
/// non-prod variant; staging covers stag/uat/pre-prod/test; the rest is dev.
pub fn classify(name: &str) -> EnvironmentTier {
    let name = name.to_lowercase();
    let pre_prod = ["pre-prod", "preprod", "pre prod"]
        .iter()
        .any(|v| name.contains(v));
    let non_prod = ["non-prod", "nonprod", "non prod"]
        .iter()
        .any(|v| name.contains(v));

    if name.contains("prod") && !pre_prod && !non_prod {
        EnvironmentTier::Production
    } else if pre_prod || ["stag", "uat", "test"].iter().any(|v| name.contains(v)) {
        EnvironmentTier::Staging
    } else {
        EnvironmentTier::Dev
    }
}

pub fn badge(success_rate: u32, total: usize) -> HealthBadge {
    match (total, success_rate) {
        (0, _) => HealthBadge::NoData,
        (_, 90..) => HealthBadge::Healthy,
        (_, 70..) => HealthBadge::Warning,
        _ => HealthBadge::Critical,
    }
}

#[derive(Default)]
struct Tally<'a> {
    success: usize,
    failed: usize,
    total: usize,
    spaces: BTreeSet<&'a str>,
}

/// Roll dashboard items up per environment name across all spaces.
///
/// Names, not ids, are the key: the same environment name recurs in many
/// spaces. Rows come back production first, then staging, then dev.
pub fn environment_health(spaces: &[SpaceData]) -> Vec<EnvironmentHealth> {
    let mut tallies: IndexMap<&str, Tally> = IndexMap::new();

    for data in spaces {
        for item in data.dashboard_items() {
            let tally = tallies
                .entry(data.environment_name(&item.environment_id))
                .or_default();
            tally.total += 1;
            match item.state {
                Some(TaskState::Success) => tally.success += 1,
                Some(TaskState::Failed) => tally.failed += 1,
                _ => {}
            }
            tally.spaces.insert(data.space.name.as_str());
        }
    }

    // Environments without any dashboard entry still get a "No data" row.
    // Only spaces with dashboard items count as contributors.
    for data in spaces {
        for environment in &data.environments {
            tallies.entry(environment.name.as_str()).or_default();
        }
    }

    let mut rows: Vec<EnvironmentHealth> = tallies
        .into_iter()
        .map(|(name, tally)| {
            let success_rate = percent(tally.success, tally.total);
            EnvironmentHealth {
                name: name.to_string(),
                tier: classify(name),
                success: tally.success,
                failed: tally.failed,
                total: tally.total,
                success_rate,
                badge: badge(success_rate, tally.total),
                spaces: tally.spaces.into_iter().map(str::to_string).collect(),
            }
        })
        .collect();

    rows.sort_by(|a, b| a.tier.cmp(&b.tier).then_with(|| a.name.cmp(&b.name)));
    rows
}

//! Folds one fetch cycle into a [`Summary`].
//!
//! Everything here is pure: the same cycle and the same `now` always give the
//! same summary, and nothing is carried over between cycles.

pub mod counts;
pub mod environments;
pub mod reconcile;
pub mod timing;
pub mod trends;

use chrono::{DateTime, Utc};

use crate::insights::{Kpis, LicenseSummary, OutcomeTotals, Summary};
use crate::server::FetchCycle;

pub const RECENT_DEPLOYMENTS: usize = 20;

/// Builds the summary for one fetch cycle. Construct a fresh one per cycle.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    now: DateTime<Utc>,
}

impl Aggregator {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn summarize(&self, cycle: &FetchCycle) -> Summary {
        let spaces = &cycle.spaces;
        let tasks = &cycle.tasks;

        let enriched = reconcile::enrich_deployments(spaces);
        let breakdown = counts::space_breakdown(spaces, tasks);

        let mut totals = OutcomeTotals::default();
        for row in &breakdown {
            totals += row.outcomes;
        }

        let deploys_last_30_days = timing::deploys_in_window(&enriched, self.now);

        let kpis = Kpis {
            total_spaces: cycle.discovery.spaces.len(),
            active_spaces: cycle.discovery.active.len(),
            projects: spaces.iter().map(|s| s.projects.len()).sum(),
            environments: spaces.iter().map(|s| s.environments.len()).sum(),
            machines: breakdown.iter().map(|r| r.machines).sum(),
            healthy_machines: breakdown.iter().map(|r| r.healthy_machines).sum(),
            releases: breakdown.iter().map(|r| r.releases).sum(),
            runbooks: breakdown.iter().map(|r| r.runbooks).sum(),
            deployments: enriched.len(),
            success_rate: totals.success_rate(),
            mttr_minutes: timing::mttr_minutes(tasks),
            avg_duration_minutes: timing::average_duration_minutes(tasks),
            deploys_last_30_days,
            deploy_frequency_per_day: timing::deploy_frequency_per_day(deploys_last_30_days),
            time_saved_hours: timing::time_saved_hours(enriched.len()),
        };

        let license = cycle.discovery.license.as_ref().map(|status| LicenseSummary {
            is_compliant: status.is_compliant,
            edition: status.effective_edition.clone(),
            expires_at: status.effective_expiry_date,
            days_to_expiry: status.days_to_effective_expiry_date,
        });

        Summary {
            server_version: cycle.discovery.server.version.clone(),
            collected_at: self.now,
            kpis,
            totals,
            spaces: breakdown,
            environments: environments::environment_health(spaces),
            projects: counts::project_activity(&enriched),
            weekly_trend: trends::weekly_trend(&enriched),
            recent_deployments: enriched.into_iter().take(RECENT_DEPLOYMENTS).collect(),
            license,
        }
    }
}

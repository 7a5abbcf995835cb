use clap::ValueEnum;
use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::aggregation::timing::format_minutes;
use crate::aggregation::trends::monthly_trend;
use crate::insights::{EnvironmentHealth, EnvironmentTier, Summary};
use crate::onboarding::{calculate_value, Answers};

/// Projections of one [`Summary`] that can be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum View {
    #[default]
    Overview,
    Trends,
    Velocity,
    Reliability,
    Spaces,
    Projects,
    Environments,
    Value,
}

impl View {
    pub fn name(self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Trends => "trends",
            Self::Velocity => "velocity",
            Self::Reliability => "reliability",
            Self::Spaces => "spaces",
            Self::Projects => "projects",
            Self::Environments => "environments",
            Self::Value => "value",
        }
    }

    pub fn render(self, summary: &Summary, answers: &Answers) -> Value {
        let body = match self {
            Self::Overview => overview(summary),
            Self::Trends => trends(summary),
            Self::Velocity => velocity(summary),
            Self::Reliability => reliability(summary),
            Self::Spaces => json!({ "spaces": summary.spaces }),
            Self::Projects => json!({ "projects": summary.projects }),
            Self::Environments => environments(&summary.environments),
            Self::Value => value(summary, answers),
        };

        json!({
            "view": self.name(),
            "server_version": summary.server_version,
            "collected_at": summary.collected_at,
            "data": body,
        })
    }
}

fn overview(summary: &Summary) -> Value {
    let kpis = &summary.kpis;
    json!({
        "kpis": kpis,
        "totals": summary.totals,
        "mttr": format_minutes(kpis.mttr_minutes),
        "avg_duration": format_minutes(kpis.avg_duration_minutes),
        "license": summary.license,
        "recent_deployments": summary.recent_deployments,
    })
}

fn trends(summary: &Summary) -> Value {
    json!({
        "weekly": summary.weekly_trend,
        "monthly": monthly_trend(&summary.weekly_trend),
    })
}

fn velocity(summary: &Summary) -> Value {
    let kpis = &summary.kpis;
    json!({
        "deployments": kpis.deployments,
        "deploys_last_30_days": kpis.deploys_last_30_days,
        "deploy_frequency_per_day": kpis.deploy_frequency_per_day,
        "avg_duration": format_minutes(kpis.avg_duration_minutes),
        "time_saved_hours": kpis.time_saved_hours,
        "monthly": monthly_trend(&summary.weekly_trend),
    })
}

fn reliability(summary: &Summary) -> Value {
    let kpis = &summary.kpis;
    json!({
        "success_rate": kpis.success_rate,
        "totals": summary.totals,
        "mttr": format_minutes(kpis.mttr_minutes),
        "machines": kpis.machines,
        "healthy_machines": kpis.healthy_machines,
        "environments": summary.environments,
    })
}

fn environments(rows: &[EnvironmentHealth]) -> Value {
    let mut tiers: IndexMap<EnvironmentTier, Vec<&EnvironmentHealth>> = [
        EnvironmentTier::Production,
        EnvironmentTier::Staging,
        EnvironmentTier::Dev,
    ]
    .into_iter()
    .map(|tier| (tier, Vec::new()))
    .collect();
    for row in rows {
        tiers.entry(row.tier).or_default().push(row);
    }

    let tiers: Vec<Value> = tiers
        .into_iter()
        .map(|(tier, environments)| json!({ "tier": tier, "environments": environments }))
        .collect();

    json!({ "tiers": tiers })
}

fn value(summary: &Summary, answers: &Answers) -> Value {
    json!({
        "answered": answers.len(),
        "estimate": calculate_value(summary, answers),
        "kpis": {
            "deployments": summary.kpis.deployments,
            "failed": summary.totals.failed,
            "success_rate": summary.kpis.success_rate,
            "deploys_last_30_days": summary.kpis.deploys_last_30_days,
        },
    })
}

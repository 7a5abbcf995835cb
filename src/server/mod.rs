pub mod client;
pub mod space_data;
pub mod spaces;
pub mod tasks;
pub mod types;

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::aggregation::Aggregator;
use crate::error::Result;
use crate::insights::Summary;
use client::ApiClient;
use space_data::SpaceData;
use spaces::Discovery;
use types::Task;

/// Raw data from one complete fetch cycle.
#[derive(Debug, Clone)]
pub struct FetchCycle {
    pub discovery: Discovery,
    pub spaces: Vec<SpaceData>,
    pub tasks: Vec<Task>,
}

pub struct DeployServer {
    pub client: ApiClient,
    pub max_concurrency: usize,
}

impl DeployServer {
    pub fn new(client: ApiClient, max_concurrency: usize) -> Self {
        Self {
            client,
            max_concurrency,
        }
    }

    /// Run discovery, per-space fetches and the task fetch, in that order.
    ///
    /// Only discovery failures abort the cycle.
    pub async fn fetch_cycle(&self) -> Result<FetchCycle> {
        let discovery = spaces::discover(&self.client).await?;

        if discovery.active.is_empty() {
            warn!("No active spaces found on {}", self.client.server_url());
        }

        let spaces =
            space_data::fetch_all(&self.client, &discovery.active, self.max_concurrency).await;
        let tasks = tasks::fetch_tasks(&self.client, &discovery.active).await;

        Ok(FetchCycle {
            discovery,
            spaces,
            tasks,
        })
    }

    pub async fn collect_summary(&self, now: DateTime<Utc>) -> Result<Summary> {
        info!(
            "Starting summary collection for {}",
            self.client.server_url()
        );

        let cycle = self.fetch_cycle().await?;
        Ok(Aggregator::new(now).summarize(&cycle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::client::tests::test_client;
    use crate::server::types::TaskState;
    use chrono::TimeZone;
    use mockito::{Matcher, Server, ServerGuard};

    async fn mock_json(server: &mut ServerGuard, path: &str, body: &str) {
        server
            .mock("GET", path)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect_at_least(1)
            .create_async()
            .await;
    }

    async fn seeded_server() -> ServerGuard {
        let mut server = Server::new_async().await;
        mock_json(&mut server, "/api", r#"{"Version": "2024.2.1"}"#).await;
        mock_json(
            &mut server,
            "/api/spaces",
            r#"{"Items": [
                {"Id": "Spaces-1", "Name": "Default"},
                {"Id": "Spaces-2", "Name": "Empty"}
            ]}"#,
        )
        .await;
        mock_json(
            &mut server,
            "/api/licenses/licenses-current-usage",
            r#"{"SpacesUsage": [
                {"SpaceId": "Spaces-1", "ProjectsCount": 1, "MachinesCount": 0},
                {"SpaceId": "Spaces-2", "ProjectsCount": 0, "MachinesCount": 0}
            ]}"#,
        )
        .await;
        mock_json(
            &mut server,
            "/api/licenses/licenses-current-status",
            r#"{"IsCompliant": true, "EffectiveEdition": "Enterprise", "DaysToEffectiveExpiryDate": 90}"#,
        )
        .await;
        mock_json(
            &mut server,
            "/api/Spaces-1/projects",
            r#"{"Items": [{"Id": "Projects-1", "Name": "Web"}]}"#,
        )
        .await;
        mock_json(
            &mut server,
            "/api/Spaces-1/environments",
            r#"{"Items": [{"Id": "Environments-1", "Name": "Production"}]}"#,
        )
        .await;
        mock_json(
            &mut server,
            "/api/Spaces-1/dashboard",
            r#"{"Items": [{"DeploymentId": "Deployments-2", "ProjectId": "Projects-1",
                "EnvironmentId": "Environments-1", "State": "Success", "Duration": "1 minute",
                "ReleaseVersion": "1.2.0"}]}"#,
        )
        .await;
        mock_json(
            &mut server,
            "/api/Spaces-1/deployments",
            r#"{"Items": [
                {"Id": "Deployments-1", "ProjectId": "Projects-1", "EnvironmentId": "Environments-1",
                 "Created": "2024-06-20T09:00:00Z"},
                {"Id": "Deployments-2", "ProjectId": "Projects-1", "EnvironmentId": "Environments-1",
                 "Created": "2024-06-27T09:00:00Z"}
            ]}"#,
        )
        .await;
        mock_json(
            &mut server,
            "/api/tasks",
            r#"{"Items": [
                {"Id": "ServerTasks-1", "SpaceId": "Spaces-1", "Name": "Deploy", "State": "Success",
                 "StartTime": "2024-06-27T09:00:00Z", "CompletedTime": "2024-06-27T09:02:00Z"}
            ]}"#,
        )
        .await;
        server
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_collect_summary_end_to_end() {
        let server = seeded_server().await;
        let deploy_server = DeployServer::new(test_client(&server.url()), 4);

        let summary = deploy_server.collect_summary(now()).await.unwrap();

        assert_eq!(summary.kpis.total_spaces, 2);
        assert_eq!(summary.kpis.active_spaces, 1);
        assert_eq!(summary.kpis.deployments, 2);
        assert_eq!(summary.totals.success, 1);
        assert_eq!(summary.kpis.avg_duration_minutes, Some(2.0));
        assert_eq!(summary.recent_deployments[0].id, "Deployments-2");
        assert_eq!(summary.recent_deployments[0].state, TaskState::Success);
        assert_eq!(
            summary.recent_deployments[0].release_version.as_deref(),
            Some("1.2.0")
        );
        assert_eq!(summary.recent_deployments[1].state, TaskState::Unknown);
        assert_eq!(summary.environments[0].name, "Production");
        assert_eq!(
            summary.license.as_ref().and_then(|l| l.edition.as_deref()),
            Some("Enterprise")
        );
    }

    #[tokio::test]
    async fn test_repeated_cycles_produce_identical_summaries() {
        let server = seeded_server().await;
        let deploy_server = DeployServer::new(test_client(&server.url()), 4);

        let first = deploy_server.collect_summary(now()).await.unwrap();
        let second = deploy_server.collect_summary(now()).await.unwrap();

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_unreachable_space_list_is_fatal() {
        let mut server = Server::new_async().await;
        mock_json(&mut server, "/api", "{}").await;
        server
            .mock("GET", "/api/spaces")
            .match_query(Matcher::Any)
            .with_status(401)
            .create_async()
            .await;

        let deploy_server = DeployServer::new(test_client(&server.url()), 4);

        assert!(deploy_server.collect_summary(now()).await.is_err());
    }
}

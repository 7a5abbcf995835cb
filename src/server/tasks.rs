use log::{info, warn};

use super::client::ApiClient;
use super::types::{ResourceCollection, Space, Task};

const TASK_PAGE_SIZE: usize = 200;

pub fn tasks_endpoint(space_ids: &[&str]) -> String {
    format!(
        "/api/tasks?spaces={}&name=Deploy&states=Success,Failed&take={TASK_PAGE_SIZE}",
        space_ids.join(",")
    )
}

/// Fetch recent finished deploy tasks across all active spaces.
///
/// Never fails: any error leaves the timing metrics without data.
pub async fn fetch_tasks(client: &ApiClient, spaces: &[Space]) -> Vec<Task> {
    if spaces.is_empty() {
        return Vec::new();
    }

    let ids: Vec<&str> = spaces.iter().map(|s| s.id.as_str()).collect();
    match client
        .safe_get::<ResourceCollection<Task>>(&tasks_endpoint(&ids))
        .await
    {
        Ok(tasks) => {
            let tasks = tasks.unwrap_or_default().items;
            info!("Fetched {} deployment tasks", tasks.len());
            tasks
        }
        Err(e) => {
            warn!("Deployment task history unavailable: {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::client::tests::test_client;
    use crate::server::types::TaskState;
    use mockito::{Matcher, Server};

    fn space(id: &str) -> Space {
        Space {
            id: id.to_string(),
            name: id.to_string(),
            description: None,
        }
    }

    #[test]
    fn test_endpoint_joins_space_ids() {
        assert_eq!(
            tasks_endpoint(&["Spaces-1", "Spaces-2"]),
            "/api/tasks?spaces=Spaces-1,Spaces-2&name=Deploy&states=Success,Failed&take=200"
        );
    }

    #[tokio::test]
    async fn test_no_spaces_issues_no_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let tasks = fetch_tasks(&client, &[]).await;

        assert!(tasks.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_tasks_queries_deploy_tasks() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/tasks")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("spaces".into(), "Spaces-1,Spaces-2".into()),
                Matcher::UrlEncoded("name".into(), "Deploy".into()),
                Matcher::UrlEncoded("states".into(), "Success,Failed".into()),
                Matcher::UrlEncoded("take".into(), "200".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"Items": [{"Id": "ServerTasks-1", "SpaceId": "Spaces-1", "Name": "Deploy",
                    "State": "Failed", "StartTime": "2024-05-01T10:00:00Z",
                    "CompletedTime": "2024-05-01T10:05:00Z"}]}"#,
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let tasks = fetch_tasks(&client, &[space("Spaces-1"), space("Spaces-2")]).await;

        mock.assert_async().await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].state, Some(TaskState::Failed));
        assert_eq!(tasks[0].duration_ms(), Some(300_000));
    }

    #[tokio::test]
    async fn test_task_failure_degrades_to_empty() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/tasks")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let client = test_client(&server.url());

        assert!(fetch_tasks(&client, &[space("Spaces-1")]).await.is_empty());
    }
}

use std::collections::HashMap;

use log::{info, warn};

use super::client::ApiClient;
use super::types::{LicenseStatus, LicenseUsage, ResourceCollection, ServerInfo, Space, SpaceUsage};
use crate::error::Result;

/// Result of the discovery phase.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub server: ServerInfo,
    pub spaces: Vec<Space>,
    pub active: Vec<Space>,
    pub usage: Option<LicenseUsage>,
    pub license: Option<LicenseStatus>,
}

/// Fetch server info, the space list and best-effort license data concurrently.
///
/// Server info and the space list are required; license usage and status
/// degrade to `None` on any failure.
pub async fn discover(client: &ApiClient) -> Result<Discovery> {
    info!("Discovering spaces...");

    let (server, spaces, usage, license) = tokio::join!(
        client.get::<ServerInfo>("/api"),
        client.get::<ResourceCollection<Space>>("/api/spaces?take=100&partialName="),
        client.safe_get::<LicenseUsage>("/api/licenses/licenses-current-usage"),
        client.safe_get::<LicenseStatus>("/api/licenses/licenses-current-status"),
    );

    let server = server?.unwrap_or_default();
    let spaces = spaces?.unwrap_or_default().items;
    let usage = usage.unwrap_or_else(|e| {
        warn!("License usage unavailable: {e}");
        None
    });
    let license = license.unwrap_or_else(|e| {
        warn!("License status unavailable: {e}");
        None
    });

    let active = filter_active(&spaces, usage.as_ref());
    info!(
        "Found {} spaces ({} active)",
        spaces.len(),
        active.len()
    );

    Ok(Discovery {
        server,
        spaces,
        active,
        usage,
        license,
    })
}

/// A space is active when its usage record shows any projects or machines.
/// Without usage data every space counts as active.
pub fn filter_active(spaces: &[Space], usage: Option<&LicenseUsage>) -> Vec<Space> {
    let Some(usage) = usage else {
        return spaces.to_vec();
    };

    let by_space: HashMap<&str, &SpaceUsage> = usage
        .spaces_usage
        .iter()
        .map(|u| (u.space_id.as_str(), u))
        .collect();

    spaces
        .iter()
        .filter(|space| {
            by_space
                .get(space.id.as_str())
                .is_some_and(|u| u.projects_count > 0 || u.machines_count > 0)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::client::tests::test_client;
    use mockito::{Matcher, Server};

    fn space(id: &str, name: &str) -> Space {
        Space {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
        }
    }

    fn usage(id: &str, projects: u64, machines: u64) -> SpaceUsage {
        SpaceUsage {
            space_id: id.to_string(),
            projects_count: projects,
            machines_count: machines,
        }
    }

    #[test]
    fn test_filter_keeps_spaces_with_projects_or_machines() {
        let spaces = vec![space("A", "Alpha"), space("B", "Beta"), space("C", "Gamma")];
        let usage = LicenseUsage {
            spaces_usage: vec![usage("A", 5, 0), usage("B", 0, 0), usage("C", 0, 2)],
        };

        let active = filter_active(&spaces, Some(&usage));
        let ids: Vec<_> = active.iter().map(|s| s.id.as_str()).collect();

        assert_eq!(ids, vec!["A", "C"]);
    }

    #[test]
    fn test_filter_drops_spaces_without_usage_record() {
        let spaces = vec![space("A", "Alpha"), space("Z", "Unlisted")];
        let usage = LicenseUsage {
            spaces_usage: vec![usage("A", 1, 0)],
        };

        assert_eq!(filter_active(&spaces, Some(&usage)).len(), 1);
    }

    #[test]
    fn test_filter_fails_open_without_usage() {
        let spaces = vec![space("A", "Alpha"), space("B", "Beta")];

        assert_eq!(filter_active(&spaces, None), spaces);
    }

    #[tokio::test]
    async fn test_discover_treats_forbidden_usage_as_all_active() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api")
            .with_status(200)
            .with_body(r#"{"Application": "Deploy Server", "Version": "2024.2.1"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/spaces")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("take".into(), "100".into()),
                Matcher::UrlEncoded("partialName".into(), String::new()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"Items": [
                    {"Id": "Spaces-1", "Name": "Default"},
                    {"Id": "Spaces-2", "Name": "Platform", "Description": "Infra"}
                ]}"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/api/licenses/licenses-current-usage")
            .with_status(403)
            .create_async()
            .await;
        server
            .mock("GET", "/api/licenses/licenses-current-status")
            .with_status(404)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let discovery = discover(&client).await.unwrap();

        assert_eq!(discovery.server.version.as_deref(), Some("2024.2.1"));
        assert_eq!(discovery.spaces.len(), 2);
        assert_eq!(discovery.active.len(), 2);
        assert!(discovery.usage.is_none());
        assert!(discovery.license.is_none());
    }

    #[tokio::test]
    async fn test_discover_fails_when_space_list_fails() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        server
            .mock("GET", "/api/spaces")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let client = test_client(&server.url());

        assert!(discover(&client).await.is_err());
    }
}

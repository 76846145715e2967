// ABOUTME: Client for resolving project titles from the core project service
// ABOUTME: Used to label jobs whose metadata references a production project

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::LookupCache;

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectRecord {
    pub id: Option<i64>,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ProjectResponse {
    status: String,
    result: Option<ProjectRecord>,
}

pub struct ProjectClient {
    client: Client,
    api_base_url: String,
    titles: Arc<LookupCache<i64, String>>,
}

impl ProjectClient {
    /// `titles` is shared with the caller so lookups outlive this client.
    pub fn new(
        api_base_url: String,
        timeout: Duration,
        titles: Arc<LookupCache<i64, String>>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            titles,
        })
    }

    pub fn project_url(&self, project_id: i64) -> String {
        format!("{}/api/project/{}", self.api_base_url, project_id)
    }

    pub async fn get_project(&self, project_id: i64) -> Result<ProjectRecord> {
        let url = self.project_url(project_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach the project service")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Project lookup failed with status {}: {}", status, body);
        }

        let body: ProjectResponse = response
            .json()
            .await
            .context("Failed to parse project response")?;

        parse_project_response(body, project_id)
    }

    /// Title of the project, served from the cache after the first lookup.
    pub async fn project_title(&self, project_id: i64) -> Result<String> {
        self.titles
            .get_or_fetch(project_id, || async {
                Ok::<_, anyhow::Error>(self.get_project(project_id).await?.title)
            })
            .await
    }
}

fn parse_project_response(body: ProjectResponse, project_id: i64) -> Result<ProjectRecord> {
    if body.status != "ok" {
        anyhow::bail!(
            "Project service returned status '{}' for project {}",
            body.status,
            project_id
        );
    }
    body.result
        .with_context(|| format!("Project {} has no result body", project_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_url() {
        let client = ProjectClient::new(
            "https://pluto.example.com/".to_string(),
            Duration::from_secs(5),
            Arc::new(LookupCache::new()),
        )
        .unwrap();
        assert_eq!(
            client.project_url(4412),
            "https://pluto.example.com/api/project/4412"
        );
    }

    #[test]
    fn test_parse_project_response() {
        let body: ProjectResponse = serde_json::from_str(
            r#"{"status":"ok","result":{"id":4412,"title":"Wind Farm Special","commissionId":9}}"#,
        )
        .unwrap();
        let record = parse_project_response(body, 4412).unwrap();
        assert_eq!(record.title, "Wind Farm Special");
        assert_eq!(record.id, Some(4412));

        let body: ProjectResponse =
            serde_json::from_str(r#"{"status":"error","detail":"not found"}"#).unwrap();
        assert!(parse_project_response(body, 1).is_err());
    }

    #[tokio::test]
    async fn test_cached_title_skips_network() {
        let titles: Arc<LookupCache<i64, String>> = Arc::new(LookupCache::new());
        titles
            .get_or_fetch(12, || async { Ok::<_, anyhow::Error>("Budget".to_string()) })
            .await
            .unwrap();

        let client = ProjectClient::new(
            "http://127.0.0.1:9".to_string(),
            Duration::from_secs(1),
            Arc::clone(&titles),
        )
        .unwrap();
        assert_eq!(client.project_title(12).await.unwrap(), "Budget");
    }

    #[tokio::test]
    async fn test_clients_share_injected_cache() {
        let titles: Arc<LookupCache<i64, String>> = Arc::new(LookupCache::new());
        titles
            .get_or_fetch(40, || async { Ok::<_, anyhow::Error>("Election Night".to_string()) })
            .await
            .unwrap();

        let first = ProjectClient::new(
            "http://127.0.0.1:9".to_string(),
            Duration::from_secs(1),
            Arc::clone(&titles),
        )
        .unwrap();
        let second = ProjectClient::new(
            "http://127.0.0.1:9".to_string(),
            Duration::from_secs(1),
            Arc::clone(&titles),
        )
        .unwrap();

        assert_eq!(first.project_title(40).await.unwrap(), "Election Night");
        assert_eq!(second.project_title(40).await.unwrap(), "Election Night");
        // Misses fall through to the unreachable service and are not cached.
        assert!(second.project_title(41).await.is_err());
        assert_eq!(titles.entry_count().await, 1);
    }
}

// ABOUTME: HTTP client for the media service job-status API
// ABOUTME: Maps transport, HTTP and payload failures onto distinct error variants

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use std::time::Duration;

use super::models::JobSnapshot;
use crate::error::PollerError;
use crate::poller::JobSource;

pub struct JobStatusClient {
    client: Client,
    api_base_url: String,
}

impl JobStatusClient {
    pub fn new(api_base_url: String, timeout: Duration) -> Result<Self, PollerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PollerError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn job_url(&self, job_id: &str) -> String {
        format!("{}/API/job/{}", self.api_base_url, job_id)
    }

    pub async fn get_job_status(&self, job_id: &str) -> Result<JobSnapshot, PollerError> {
        let url = self.job_url(job_id);
        tracing::debug!(%url, "Fetching job status");

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| PollerError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PollerError::Http { status, body });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| PollerError::Transport(e.to_string()))?;

        JobSnapshot::from_slice(&body)
    }
}

#[async_trait]
impl JobSource for JobStatusClient {
    async fn fetch_job(&self, job_id: &str) -> Result<JobSnapshot, PollerError> {
        self.get_job_status(job_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response on a loopback port and returns its base URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{}", addr)
    }

    fn client_for(base_url: String) -> JobStatusClient {
        JobStatusClient::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_ok_response_decodes_job() {
        let base_url = serve_once(
            "200 OK",
            r#"{"jobId":"VX-4411","status":"STARTED","priority":"MEDIUM","totalSteps":4}"#,
        )
        .await;

        let snapshot = client_for(base_url).get_job_status("VX-4411").await.unwrap();
        assert_eq!(snapshot.job_id, "VX-4411");
        assert!(!snapshot.did_finish());
        assert_eq!(snapshot.total_steps, 4);
    }

    #[tokio::test]
    async fn test_ok_response_with_bad_body_is_validation_error() {
        let base_url = serve_once("200 OK", "<html>Bad gateway</html>").await;

        let err = client_for(base_url).get_job_status("VX-4411").await.unwrap_err();
        assert!(err.is_validation(), "unexpected error: {:?}", err);
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_ok_response_with_unknown_status_is_validation_error() {
        let base_url = serve_once(
            "200 OK",
            r#"{"jobId":"VX-4411","status":"EXPLODED","priority":"MEDIUM"}"#,
        )
        .await;

        let err = client_for(base_url).get_job_status("VX-4411").await.unwrap_err();
        assert!(err.is_validation(), "unexpected error: {:?}", err);
    }

    #[tokio::test]
    async fn test_server_error_is_transient_http_error() {
        let base_url = serve_once("503 Service Unavailable", "down for maintenance").await;

        let err = client_for(base_url).get_job_status("VX-4411").await.unwrap_err();
        assert_eq!(
            err,
            PollerError::Http {
                status: 503,
                body: "down for maintenance".to_string()
            }
        );
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_bad_gateway_with_job_body_is_still_http_error() {
        let base_url = serve_once(
            "502 Bad Gateway",
            r#"{"jobId":"VX-4411","status":"FINISHED","priority":"MEDIUM"}"#,
        )
        .await;

        let err = client_for(base_url).get_job_status("VX-4411").await.unwrap_err();
        assert!(matches!(err, PollerError::Http { status: 502, .. }));
        assert!(err.is_transient());
    }

    #[test]
    fn test_client_creation() {
        let client =
            JobStatusClient::new("https://vidispine.example.com".to_string(), Duration::from_secs(30));
        assert!(client.is_ok());
    }

    #[test]
    fn test_job_url_strips_trailing_slash() {
        let client =
            JobStatusClient::new("https://vidispine.example.com/".to_string(), Duration::from_secs(30))
                .unwrap();
        assert_eq!(
            client.job_url("VX-4411"),
            "https://vidispine.example.com/API/job/VX-4411"
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transient() {
        // Loopback port 9 (discard) refuses connections on a normal host.
        let client =
            JobStatusClient::new("http://127.0.0.1:9".to_string(), Duration::from_secs(2)).unwrap();
        let err = client.get_job_status("VX-1").await.unwrap_err();
        assert!(err.is_transient(), "unexpected error: {:?}", err);
    }
}

//! Readiness probe for the externally-started storefront server
//!
//! The server is not spawned here; a CI harness (or a developer terminal)
//! starts it. The probe only distinguishes "not up yet" from "up but
//! erroring" before flows run.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

/// Configuration for the readiness probe
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Path requested on each attempt; the storefront has no dedicated
    /// health route, so the homepage stands in.
    pub probe_path: String,

    /// Timeout for a single attempt
    pub attempt_timeout: Duration,

    /// Delay between attempts
    pub poll_interval: Duration,

    /// Total time allowed before giving up
    pub deadline: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            probe_path: "/".to_string(),
            attempt_timeout: Duration::from_secs(2),
            poll_interval: Duration::from_millis(100),
            deadline: Duration::from_secs(30),
        }
    }
}

/// Poll the server until it answers with a success status or the deadline
/// passes. Connection errors are expected while the server is starting.
pub async fn wait_for_ready(base_url: &str, config: &ProbeConfig) -> E2eResult<()> {
    let probe_url = format!("{}{}", base_url.trim_end_matches('/'), config.probe_path);
    let client = reqwest::Client::builder()
        .timeout(config.attempt_timeout)
        .build()?;

    let start = std::time::Instant::now();
    let mut attempts = 0;

    while start.elapsed() < config.deadline {
        attempts += 1;

        match client.get(&probe_url).send().await {
            Ok(resp) if resp.status().is_success() || resp.status().is_redirection() => {
                info!("Server ready at {} after {} attempt(s)", base_url, attempts);
                return Ok(());
            }
            Ok(resp) => {
                // Reachable but erroring: a different situation than "not
                // up yet", so say so.
                warn!("Readiness probe returned {}", resp.status());
            }
            Err(e) => {
                if attempts == 1 {
                    info!("Waiting for server at {}...", base_url);
                }
                if !e.is_connect() && !e.is_timeout() {
                    warn!("Readiness probe error: {}", e);
                }
            }
        }

        sleep(config.poll_interval).await;
    }

    Err(E2eError::ServerUnreachable(attempts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    fn serve_one_response(response: &'static str) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        port
    }

    #[tokio::test]
    async fn test_probe_succeeds_against_live_server() {
        let port = serve_one_response(
            "HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok",
        );
        let config = ProbeConfig {
            deadline: Duration::from_secs(5),
            ..Default::default()
        };
        let result = wait_for_ready(&format!("http://127.0.0.1:{port}"), &config).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_probe_reports_attempts_when_unreachable() {
        // Bind then drop to get a port with nothing listening.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = ProbeConfig {
            deadline: Duration::from_millis(400),
            poll_interval: Duration::from_millis(50),
            ..Default::default()
        };
        let err = wait_for_ready(&format!("http://127.0.0.1:{port}"), &config)
            .await
            .unwrap_err();
        match err {
            E2eError::ServerUnreachable(attempts) => assert!(attempts >= 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_probe_config_default() {
        let config = ProbeConfig::default();
        assert_eq!(config.probe_path, "/");
        assert_eq!(config.deadline, Duration::from_secs(30));
    }
}

//! CelesTrak element feed
//!
//! Retrieves element sets for a named group from the CelesTrak GP query
//! endpoint in plain TLE format, and checks whether the feed host is
//! reachable before a refresh is attempted.

use std::time::Duration;

use tracing::debug;

use crate::scheduler::RefreshConfig;
use crate::{NearsatError, Result};

/// CelesTrak GP query endpoint
pub const CELESTRAK_GP_URL: &str = "https://celestrak.org/NORAD/elements/gp.php";

/// Host probed for connectivity
pub const CELESTRAK_PROBE_URL: &str = "https://celestrak.org";

/// Source of raw element text.
///
/// Every call must return within its timeout.
pub trait ElementFeed: Send + Sync {
    /// Fetch the raw TLE text for `group`.
    fn fetch_group(&self, group: &str, timeout: Duration) -> Result<String>;

    /// Check that the feed host answers at all.
    fn probe(&self, timeout: Duration) -> Result<()>;
}

/// [`ElementFeed`] backed by CelesTrak over HTTPS.
#[derive(Debug, Clone)]
pub struct CelestrakFeed {
    client: reqwest::blocking::Client,
    gp_url: String,
    probe_url: String,
}

impl CelestrakFeed {
    /// Feed against the public CelesTrak endpoints.
    pub fn new() -> Result<Self> {
        Self::with_urls(CELESTRAK_GP_URL, CELESTRAK_PROBE_URL)
    }

    /// Feed against custom endpoints (mirrors, test servers).
    pub fn with_urls(gp_url: impl Into<String>, probe_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("nearsat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NearsatError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(CelestrakFeed {
            client,
            gp_url: gp_url.into(),
            probe_url: probe_url.into(),
        })
    }

    /// Feed against the endpoints named in a refresh configuration.
    pub fn from_config(config: &RefreshConfig) -> Result<Self> {
        Self::with_urls(config.feed_url.clone(), config.probe_url.clone())
    }

    /// The GP query endpoint in use
    pub fn gp_url(&self) -> &str {
        &self.gp_url
    }
}

impl ElementFeed for CelestrakFeed {
    fn fetch_group(&self, group: &str, timeout: Duration) -> Result<String> {
        debug!(group, url = %self.gp_url, "requesting element group");

        let response = self
            .client
            .get(&self.gp_url)
            .query(&[("GROUP", group), ("FORMAT", "tle")])
            .timeout(timeout)
            .send()?;

        if !response.status().is_success() {
            return Err(NearsatError::Network(format!(
                "Fetching group {} failed, status: {}",
                group,
                response.status()
            )));
        }

        Ok(response.text()?)
    }

    fn probe(&self, timeout: Duration) -> Result<()> {
        self.client
            .get(&self.probe_url)
            .timeout(timeout)
            .send()
            .map(|_| ())
            .map_err(|e| NearsatError::Network(format!("{} unreachable: {}", self.probe_url, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::time::Instant;

    /// Answer a single HTTP request with `response`, returning the base URL.
    fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            stream.write_all(response.as_bytes()).unwrap();
        });

        url
    }

    #[test]
    fn test_default_endpoints() {
        let feed = CelestrakFeed::new().unwrap();
        assert_eq!(feed.gp_url(), "https://celestrak.org/NORAD/elements/gp.php");
    }

    #[test]
    fn test_endpoints_from_config() {
        let config = RefreshConfig {
            feed_url: "http://mirror.invalid/gp.php".into(),
            ..RefreshConfig::default()
        };
        let feed = CelestrakFeed::from_config(&config).unwrap();
        assert_eq!(feed.gp_url(), "http://mirror.invalid/gp.php");
    }

    #[test]
    fn test_unreachable_probe_is_network_error() {
        // Port 9 on loopback refuses connections immediately
        let feed = CelestrakFeed::with_urls("http://127.0.0.1:9/gp.php", "http://127.0.0.1:9/").unwrap();
        let err = feed.probe(Duration::from_secs(2)).unwrap_err();
        assert!(matches!(err, NearsatError::Network(_)), "got {:?}", err);
    }

    #[test]
    fn test_unreachable_fetch_is_network_error() {
        let feed = CelestrakFeed::with_urls("http://127.0.0.1:9/gp.php", "http://127.0.0.1:9/").unwrap();
        let err = feed.fetch_group("amateur", Duration::from_secs(2)).unwrap_err();
        assert!(matches!(err, NearsatError::Network(_)), "got {:?}", err);
    }

    #[test]
    fn test_fetch_returns_body() {
        let base = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 22\r\nConnection: close\r\n\r\nISS\n1 25544U\n2 25544 \n",
        );
        let feed = CelestrakFeed::with_urls(format!("{}/gp.php", base), base.clone()).unwrap();
        let text = feed.fetch_group("stations", Duration::from_secs(5)).unwrap();
        assert_eq!(text, "ISS\n1 25544U\n2 25544 \n");
    }

    #[test]
    fn test_error_status_is_network_error() {
        let base = serve_once(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let feed = CelestrakFeed::with_urls(format!("{}/gp.php", base), base.clone()).unwrap();

        match feed.fetch_group("amateur", Duration::from_secs(5)) {
            Err(NearsatError::Network(msg)) => {
                assert!(msg.contains("503"), "message was {:?}", msg);
                assert!(msg.contains("amateur"), "message was {:?}", msg);
            }
            other => panic!("expected network error, got {:?}", other),
        }
    }

    #[test]
    fn test_silent_host_probe_times_out() {
        // Connections complete in the backlog but nothing ever answers
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let feed = CelestrakFeed::with_urls(format!("{}/gp.php", base), base.clone()).unwrap();

        let start = Instant::now();
        let err = feed.probe(Duration::from_millis(300)).unwrap_err();
        let waited = start.elapsed();

        assert!(matches!(err, NearsatError::Network(_)), "got {:?}", err);
        assert!(waited >= Duration::from_millis(200), "returned after {:?}", waited);
        assert!(waited < Duration::from_secs(5), "returned after {:?}", waited);
        drop(listener);
    }
}

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, StatusCode};
use std::ops::RangeInclusive;
use std::time::Duration;
use tracing::{debug, warn};

/// Small fixed pool of realistic browser user agents, rotated per request.
const USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64; rv:122.0) Gecko/20100101 Firefox/122.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

/// Page-fetching collaborator. `None` uniformly means "no content, move on";
/// the crawl loop never distinguishes failure modes.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Option<String>;
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Randomized sleep before every request, in seconds.
    pub delay_secs: RangeInclusive<u64>,
    /// Cooldown after a 429 response, in seconds.
    pub rate_limit_cooldown_secs: u64,
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            delay_secs: 2..=5,
            rate_limit_cooldown_secs: 30,
            timeout_secs: 30,
        }
    }
}

/// HTTP transport for the crawl loop: throttled, browser-like, and
/// deliberately lossy — every failure mode collapses to `None`.
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("da-DK,da;q=0.9,en;q=0.8"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(true)
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    fn pick_user_agent() -> &'static str {
        USER_AGENTS[rand::thread_rng().gen_range(0..USER_AGENTS.len())]
    }

    async fn throttle(&self) {
        let secs = rand::thread_rng().gen_range(self.config.delay_secs.clone());
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Option<String> {
        self.throttle().await;

        debug!("Fetching {}", url);
        let response = match self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, Self::pick_user_agent())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Error fetching {}: {}", url, e);
                return None;
            }
        };

        match response.status() {
            status if status.is_success() => match response.text().await {
                Ok(body) => Some(body),
                Err(e) => {
                    warn!("Failed to read body from {}: {}", url, e);
                    None
                }
            },
            StatusCode::TOO_MANY_REQUESTS => {
                warn!(
                    "Rate limited on {}, cooling down for {}s",
                    url, self.config.rate_limit_cooldown_secs
                );
                tokio::time::sleep(Duration::from_secs(self.config.rate_limit_cooldown_secs))
                    .await;
                None
            }
            status => {
                warn!("Failed to fetch {}, status: {}", url, status);
                None
            }
        }
    }
}

use crate::models::StoredListing;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

const LISTINGS_TABLE: &str = "listings";

/// Persistence collaborator. The `url` column is the unique key; the crawl
/// loop's flush checks existence before inserting.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn exists(&self, url: &str) -> Result<bool>;
    async fn insert(&self, listing: &StoredListing) -> Result<()>;
}

/// Supabase-backed store, talking to the PostgREST endpoints directly.
pub struct SupabaseStore {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl SupabaseStore {
    pub fn new(endpoint: &str, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create Supabase HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.endpoint, LISTINGS_TABLE)
    }
}

#[async_trait]
impl ListingStore for SupabaseStore {
    async fn exists(&self, url: &str) -> Result<bool> {
        let filter = format!("eq.{url}");
        let response = self
            .client
            .get(self.table_url())
            .query(&[("select", "url"), ("url", filter.as_str())])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .context("Listing lookup request failed")?
            .error_for_status()
            .context("Listing lookup returned an error status")?;

        let rows: Vec<serde_json::Value> = response
            .json()
            .await
            .context("Failed to decode listing lookup response")?;

        debug!("Lookup for {} matched {} rows", url, rows.len());
        Ok(!rows.is_empty())
    }

    async fn insert(&self, listing: &StoredListing) -> Result<()> {
        self.client
            .post(self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(listing)
            .send()
            .await
            .context("Listing insert request failed")?
            .error_for_status()
            .context("Listing insert returned an error status")?;

        debug!("Inserted listing {}", listing.url);
        Ok(())
    }
}

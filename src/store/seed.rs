//! Bulk seed read against a PostgREST-style table endpoint.

use crate::{
    placement::client::HTTP_CLIENT, store::cell::Cell, traits::SeedSource, MapError, Result,
};
use async_trait::async_trait;

/// Reads the most recent placements from `{base_url}` (a table endpoint such
/// as `https://<project>/rest/v1/pixel_placements`), newest first.
#[derive(Debug, Clone)]
pub struct RestSeedSource {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl RestSeedSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            client: HTTP_CLIENT.clone(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Query string selecting the newest `limit` rows
    pub fn query(limit: usize) -> [(&'static str, String); 3] {
        [
            ("select", "lat,lng,color".to_string()),
            ("order", "placed_at.desc".to_string()),
            ("limit", limit.to_string()),
        ]
    }
}

#[async_trait]
impl SeedSource for RestSeedSource {
    async fn load_recent(&self, limit: usize) -> Result<Vec<Cell>> {
        let mut request = self.client.get(&self.base_url).query(&Self::query(limit));
        if let Some(key) = &self.api_key {
            request = request
                .header("apikey", key)
                .bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(MapError::Network(format!("seed read returned HTTP {status}")));
        }

        let cells: Vec<Cell> = serde_json::from_str(&body)
            .map_err(|e| MapError::ParseError(format!("seed rows: {e}")))?;
        log::debug!("seed read returned {} rows (limit {})", cells.len(), limit);
        Ok(cells)
    }
}

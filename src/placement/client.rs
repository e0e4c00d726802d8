use crate::{
    core::config::MapixConfig,
    placement::protocol::{decode_response, PlaceResponse, PlacementRequest},
    store::{cell::Cell, live::LiveCellStore},
    MapError, PlacementError,
};
use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Shared async HTTP client. Building the client once avoids TLS and
/// connection pool setup for every placement.
pub(crate) static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(concat!("mapix/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|e| {
            log::warn!("falling back to default HTTP client: {}", e);
            Client::new()
        })
});

/// Bearer credential of an authenticated identity.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken(..)")
    }
}

/// Successful placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementReceipt {
    /// Cell as echoed by the endpoint, already merged into the store
    pub cell: Cell,
    /// Tokens left in the identity's pool after this placement
    pub pool_size: u32,
}

/// Sends placement requests and feeds accepted cells back into the store.
///
/// The caller is responsible for holding an authenticated identity, for the
/// "painting enabled" gate and for quantizing coordinates; this client
/// transmits what it is given.
#[derive(Debug, Clone)]
pub struct PlacementClient {
    endpoint: String,
    api_key: String,
    timeout: Option<Duration>,
    client: Client,
    store: LiveCellStore,
}

impl PlacementClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, store: LiveCellStore) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            timeout: None,
            client: HTTP_CLIENT.clone(),
            store,
        }
    }

    pub fn from_config(config: &MapixConfig, store: LiveCellStore) -> crate::Result<Self> {
        let endpoint = config
            .placement_url
            .clone()
            .ok_or_else(|| MapError::Config("placement endpoint is not configured".to_string()))?;

        let mut client = Self::new(endpoint, config.api_key.clone().unwrap_or_default(), store);
        client.timeout = config.request_timeout;
        Ok(client)
    }

    /// Bounds the whole request; without it the transport default applies
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Places one cell.
    ///
    /// Non-finite coordinates are refused before anything is sent.
    /// Transport failures, malformed bodies and rejections all return an
    /// error and leave the store untouched. On acceptance the server-echoed
    /// cell is merged through the regular store path.
    pub async fn place(
        &self,
        request: &PlacementRequest,
        auth: &AuthToken,
    ) -> Result<PlacementReceipt, PlacementError> {
        request.validate()?;

        let mut builder = self
            .client
            .post(&self.endpoint)
            .bearer_auth(auth.as_str())
            .header("apikey", &self.api_key)
            .json(request);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            log::warn!("placement request failed: {}", e);
            PlacementError::Network(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PlacementError::Network(e.to_string()))?;
        log::debug!("placement response HTTP {} ({} bytes)", status, body.len());

        self.apply_status_response(status, &body)
    }

    /// Interprets a response together with its HTTP status.
    ///
    /// A non-2xx status is always a failure, whatever the body claims; the
    /// body only supplies `reason` and `refill_in` when it has them.
    pub fn apply_status_response(&self, status: StatusCode, body: &str) -> Result<PlacementReceipt, PlacementError> {
        if status.is_success() {
            return self.apply_response(body);
        }

        let err = match decode_response(body) {
            Ok(PlaceResponse::Rejected { reason, refill_in }) => PlacementError::Rejected { reason, refill_in },
            Ok(PlaceResponse::Accepted { .. }) => PlacementError::Rejected {
                reason: Some(format!("http_{}", status.as_u16())),
                refill_in: None,
            },
            Err(e) => e,
        };
        log::warn!("placement failed with HTTP {}: {}", status, err);
        Err(err)
    }

    /// Interprets a 2xx response body and, on acceptance, merges the echoed
    /// cell.
    pub fn apply_response(&self, body: &str) -> Result<PlacementReceipt, PlacementError> {
        match decode_response(body) {
            Ok(PlaceResponse::Accepted { cell, pool_size }) => {
                self.store.merge(cell);
                log::info!(
                    "placed color {} at ({:.6}, {:.6}); {} tokens left",
                    cell.color,
                    cell.lat,
                    cell.lng,
                    pool_size
                );
                Ok(PlacementReceipt { cell, pool_size })
            }
            Ok(PlaceResponse::Rejected { reason, refill_in }) => {
                log::info!(
                    "placement rejected: {} (refill in {:?}s)",
                    reason.as_deref().unwrap_or("no reason given"),
                    refill_in
                );
                Err(PlacementError::Rejected { reason, refill_in })
            }
            Err(e) => {
                log::error!("could not parse placement response: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with_store() -> (PlacementClient, LiveCellStore) {
        let store = LiveCellStore::new(100);
        let client = PlacementClient::new("http://127.0.0.1:9/place", "anon", store.clone());
        (client, store)
    }

    #[test]
    fn acceptance_merges_echoed_cell() {
        let (client, store) = client_with_store();
        store.seed(vec![Cell::new(1.0, 1.0, 1)]);

        let receipt = client
            .apply_response(r#"{"ok": true, "lat": 10.0, "lng": 20.0, "color": 5, "pool_size": 3}"#)
            .unwrap();

        assert_eq!(receipt.pool_size, 3);
        assert_eq!(store.len(), 2);
        assert_eq!(store.snapshot().first(), Some(&Cell::new(10.0, 20.0, 5)));
    }

    #[test]
    fn rate_limit_surfaces_metadata_without_mutation() {
        let (client, store) = client_with_store();
        let version = store.version();

        let err = client
            .apply_response(r#"{"ok": false, "reason": "rate_limited", "refill_in": 7}"#)
            .unwrap_err();

        assert!(err.is_rate_limited());
        assert_eq!(err.refill_in(), Some(7.0));
        assert_eq!(store.version(), version);
    }

    #[test]
    fn garbage_body_is_a_parse_error() {
        let (client, store) = client_with_store();
        let err = client.apply_response("<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, PlacementError::Parse(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn error_status_never_merges_an_acceptance_body() {
        let (client, store) = client_with_store();
        let err = client
            .apply_status_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                r#"{"ok": true, "lat": 10.0, "lng": 20.0, "color": 5, "pool_size": 3}"#,
            )
            .unwrap_err();

        assert_eq!(
            err,
            PlacementError::Rejected {
                reason: Some("http_500".to_string()),
                refill_in: None,
            }
        );
        assert!(store.is_empty());
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn error_status_keeps_rejection_details() {
        let (client, store) = client_with_store();
        let err = client
            .apply_status_response(
                StatusCode::TOO_MANY_REQUESTS,
                r#"{"ok": false, "reason": "rate_limited", "refill_in": 4.5}"#,
            )
            .unwrap_err();

        assert!(err.is_rate_limited());
        assert_eq!(err.refill_in(), Some(4.5));
        assert!(store.is_empty());
    }

    #[test]
    fn auth_token_debug_is_redacted() {
        let token = AuthToken::new("secret-jwt");
        assert!(!format!("{token:?}").contains("secret"));
    }

    #[test]
    fn from_config_requires_endpoint() {
        let config = MapixConfig::default();
        let result = PlacementClient::from_config(&config, LiveCellStore::default());
        assert!(matches!(result, Err(MapError::Config(_))));
    }
}

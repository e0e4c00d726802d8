use mapix::prelude::*;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve exactly one HTTP response with `body`, returning the endpoint URL
/// and a handle yielding the raw request that was received.
async fn serve_once(status: &'static str, body: String) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/place", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        // Read headers and the (small) JSON body
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request);
            if let Some(split) = text.find("\r\n\r\n") {
                let length = text
                    .lines()
                    .find_map(|l| {
                        l.to_ascii_lowercase()
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                    })
                    .unwrap_or(0);
                if request.len() >= split + 4 + length {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }

        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&request).into_owned()
    });

    (url, handle)
}

#[tokio::test]
async fn accepted_placement_merges_server_echo() {
    let (url, server) = serve_once(
        "200 OK",
        r#"{"ok": true, "lat": 10.0, "lng": 20.0, "color": 5, "pool_size": 3}"#.to_string(),
    )
    .await;
    let store = LiveCellStore::new(5000);
    let client = PlacementClient::new(url, "anon-key", store.clone());

    // Local values differ from the echo; the echo wins
    let request = PlacementRequest::at(&LatLng::new(10.00003, 19.99997), 4);
    let receipt = client.place(&request, &AuthToken::new("jwt")).await.unwrap();

    assert_eq!(receipt.pool_size, 3);
    assert_eq!(store.len(), 1);
    assert_eq!(store.snapshot().first(), Some(&Cell::new(10.0, 20.0, 5)));

    let raw = server.await.unwrap().to_ascii_lowercase();
    assert!(raw.starts_with("post /place"));
    assert!(raw.contains("authorization: bearer jwt"));
    assert!(raw.contains("apikey: anon-key"));
    assert!(raw.contains(r#""color":4"#));
}

#[tokio::test]
async fn rate_limited_placement_leaves_store_untouched() {
    let (url, _server) = serve_once(
        "429 Too Many Requests",
        r#"{"ok": false, "reason": "rate_limited", "refill_in": 7}"#.to_string(),
    )
    .await;
    let store = LiveCellStore::new(5000);
    store.seed(vec![Cell::new(1.0, 1.0, 1)]);
    let version = store.version();
    let client = PlacementClient::new(url, "anon-key", store.clone());

    let err = client
        .place(&PlacementRequest::new(10.0, 20.0, 5), &AuthToken::new("jwt"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        PlacementError::Rejected {
            reason: Some("rate_limited".to_string()),
            refill_in: Some(7.0),
        }
    );
    assert!(err.is_rate_limited());
    assert_eq!(store.version(), version);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn malformed_body_is_a_parse_error() {
    let (url, _server) = serve_once("502 Bad Gateway", "upstream exploded".to_string()).await;
    let store = LiveCellStore::new(5000);
    let client = PlacementClient::new(url, "anon-key", store.clone());

    let err = client
        .place(&PlacementRequest::new(10.0, 20.0, 5), &AuthToken::new("jwt"))
        .await
        .unwrap_err();

    assert!(matches!(err, PlacementError::Parse(_)));
    assert!(store.is_empty());
}

#[tokio::test]
async fn server_error_with_acceptance_body_is_not_merged() {
    let (url, _server) = serve_once(
        "500 Internal Server Error",
        r#"{"ok": true, "lat": 10.0, "lng": 20.0, "color": 5, "pool_size": 3}"#.to_string(),
    )
    .await;
    let store = LiveCellStore::new(5000);
    let client = PlacementClient::new(url, "anon-key", store.clone());

    let result = client
        .place(&PlacementRequest::new(10.0, 20.0, 5), &AuthToken::new("jwt"))
        .await;

    assert!(matches!(result, Err(PlacementError::Rejected { .. })));
    assert!(store.is_empty());
}

#[tokio::test]
async fn unreachable_endpoint_is_a_network_error() {
    let store = LiveCellStore::new(5000);
    let client = PlacementClient::new("http://127.0.0.1:9/place", "anon-key", store.clone())
        .with_timeout(Duration::from_secs(2));

    let err = client
        .place(&PlacementRequest::new(10.0, 20.0, 5), &AuthToken::new("jwt"))
        .await
        .unwrap_err();

    assert!(matches!(err, PlacementError::Network(_)));
    assert!(store.is_empty());
}

#[tokio::test]
async fn non_finite_request_is_refused_before_sending() {
    let store = LiveCellStore::new(5000);
    // Nothing listens here; reaching the network would be a Network error
    let client = PlacementClient::new("http://127.0.0.1:9/place", "anon-key", store.clone());

    let err = client
        .place(&PlacementRequest::at(&LatLng::new(f64::NAN, 20.0), 5), &AuthToken::new("jwt"))
        .await
        .unwrap_err();

    assert!(matches!(err, PlacementError::InvalidRequest(_)));
    assert!(matches!(MapError::from(err), MapError::InvalidInput(_)));
    assert!(store.is_empty());
}

#[tokio::test]
async fn placement_error_converts_to_map_error() {
    let err: MapError = PlacementError::Rejected {
        reason: Some("invalid_slot".to_string()),
        refill_in: None,
    }
    .into();
    assert!(matches!(err, MapError::Rejected { refill_in: None, .. }));
    assert_eq!(err.to_string(), "Placement rejected: invalid_slot");
}

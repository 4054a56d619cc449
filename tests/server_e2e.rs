//! End-to-end tests over a real socket, driven by the typed client.

use std::net::SocketAddr;
use std::time::Duration;

use igs_api::client::{ApiClient, ClientError};
use igs_api::lifecycle::{build_state, Shutdown};
use igs_api::ApiServer;

mod common;
use common::{test_config, PASSWORD, USERNAME};

async fn start_server(shutdown: &Shutdown) -> (SocketAddr, tokio::task::JoinHandle<std::io::Result<()>>) {
    let config = test_config();
    let state = build_state(&config).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = ApiServer::new(&config, state);
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));
    (addr, handle)
}

#[tokio::test]
async fn test_client_round_trip() {
    let shutdown = Shutdown::new();
    let (addr, _handle) = start_server(&shutdown).await;
    let client = ApiClient::new(&format!("http://{addr}/"));

    let token = client.login(USERNAME, PASSWORD).await.unwrap();
    assert_eq!(token.token_type, "bearer");

    let tracts = client.list_tracts(&token.access_token, None).await.unwrap();
    assert_eq!(tracts.len(), 10);

    let high = client
        .list_tracts(&token.access_token, Some(70.0))
        .await
        .unwrap();
    assert_eq!(high.len(), 5);

    let first = &tracts[0];
    let fetched = client
        .get_tract(&token.access_token, &first.census_tract)
        .await
        .unwrap();
    assert_eq!(&fetched, first);

    let me = client.whoami(&token.access_token).await.unwrap();
    assert_eq!(me.username, USERNAME);

    let summary = client.income_summary(&token.access_token).await.unwrap();
    assert_eq!(summary.iter().map(|s| s.tract_count).sum::<u64>(), 10);

    shutdown.trigger();
}

#[tokio::test]
async fn test_client_error_mapping() {
    let shutdown = Shutdown::new();
    let (addr, _handle) = start_server(&shutdown).await;
    let client = ApiClient::new(&format!("http://{addr}"));

    let err = client.login(USERNAME, "nope").await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized));

    let err = client.list_tracts("not-a-token", None).await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized));

    let token = client.login(USERNAME, PASSWORD).await.unwrap();
    let err = client
        .get_tract(&token.access_token, "06037123456")
        .await
        .unwrap_err();
    match err {
        ClientError::NotFound(body) => assert!(body.contains("06037123456")),
        other => panic!("expected NotFound, got {other:?}"),
    }

    shutdown.trigger();
}

#[tokio::test]
async fn test_graceful_shutdown() {
    let shutdown = Shutdown::new();
    let (addr, handle) = start_server(&shutdown).await;

    let response = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    drop(response);

    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}

use bookstore::app::{self, Config, StartupError};
use bookstore_proto::pb::{EchoMessage, GetBooksRequest};
use bookstore_proto::{EchoClient, InventoryClient};
use serde_json::{Value, json};
use std::net::SocketAddr;

fn local_config() -> Config {
    Config {
        rpc_addr: "127.0.0.1:0".parse().unwrap(),
        gateway_addr: "127.0.0.1:0".parse().unwrap(),
    }
}

fn gateway_url(addr: SocketAddr, path: &str) -> String {
    format!("http://{addr}{path}")
}

#[tokio::test]
async fn test_http_echo_end_to_end() {
    let bookstore = app::start(&local_config()).await.unwrap();

    let response = reqwest::Client::new()
        .post(gateway_url(bookstore.gateway_addr(), "/v1/echo"))
        .header("content-type", "application/json")
        .body(r#"{"value":"hello"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.json::<Value>().await.unwrap(), json!({"value": "hello"}));

    bookstore.shutdown();
}

#[tokio::test]
async fn test_rpc_listener_serves_both_services() {
    let bookstore = app::start(&local_config()).await.unwrap();
    let url = format!("http://{}", bookstore.rpc_addr());

    let mut echo = EchoClient::connect(url.clone()).await.unwrap();
    let reply = echo
        .echo(EchoMessage {
            value: "arrakis".to_string(),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(reply.value, "arrakis");

    let mut inventory = InventoryClient::connect(url).await.unwrap();
    let books = inventory
        .get_books(GetBooksRequest {})
        .await
        .unwrap()
        .into_inner()
        .books;
    assert_eq!(books.len(), 3);

    bookstore.shutdown();
}

#[tokio::test]
async fn test_http_echo_path_route() {
    let bookstore = app::start(&local_config()).await.unwrap();

    let response = reqwest::get(gateway_url(bookstore.gateway_addr(), "/v1/echo/fremen"))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.json::<Value>().await.unwrap(), json!({"value": "fremen"}));

    bookstore.shutdown();
}

#[tokio::test]
async fn test_http_malformed_json_is_client_error() {
    let bookstore = app::start(&local_config()).await.unwrap();
    let client = reqwest::Client::new();
    let url = gateway_url(bookstore.gateway_addr(), "/v1/echo");

    let response = client.post(&url).body("{not json").send().await.unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], 3);

    // The gateway keeps serving after a bad request.
    let response = client
        .post(&url)
        .body(r#"{"value":"still here"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);

    bookstore.shutdown();
}

#[tokio::test]
async fn test_get_books_is_not_exposed_over_http() {
    let bookstore = app::start(&local_config()).await.unwrap();
    let client = reqwest::Client::new();

    for path in ["/v1/books", "/bookstore.Inventory/GetBooks"] {
        let response = client
            .post(gateway_url(bookstore.gateway_addr(), path))
            .body("{}")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 404, "{path}");
    }

    bookstore.shutdown();
}

#[tokio::test]
async fn test_concurrent_http_echoes_keep_their_values() {
    let bookstore = app::start(&local_config()).await.unwrap();
    let client = reqwest::Client::new();
    let url = gateway_url(bookstore.gateway_addr(), "/v1/echo");

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let client = client.clone();
            let url = url.clone();
            tokio::spawn(async move {
                let value = format!("request-{i}");
                let body: Value = client
                    .post(url)
                    .json(&json!({ "value": value }))
                    .send()
                    .await
                    .unwrap()
                    .json()
                    .await
                    .unwrap();
                (value, body)
            })
        })
        .collect();

    for (value, body) in futures_util::future::try_join_all(handles).await.unwrap() {
        assert_eq!(body["value"], value);
    }

    bookstore.shutdown();
}

#[tokio::test]
async fn test_rpc_bind_failure_stops_before_gateway() {
    let occupied = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let rpc_addr = occupied.local_addr().unwrap();

    let probe = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let gateway_addr = probe.local_addr().unwrap();
    drop(probe);

    let err = app::start(&Config {
        rpc_addr,
        gateway_addr,
    })
    .await
    .unwrap_err();

    assert!(matches!(err, StartupError::RpcBind { addr, .. } if addr == rpc_addr));

    // The gateway port was never taken.
    tokio::net::TcpListener::bind(gateway_addr).await.unwrap();
}

#[tokio::test]
async fn test_wait_blocks_while_both_servers_run() {
    let bookstore = app::start(&local_config()).await.unwrap();
    let gateway_addr = bookstore.gateway_addr();

    let supervisor = tokio::spawn(bookstore.wait());

    // Serving normally: the supervisor has nothing to report yet.
    let response = reqwest::Client::new()
        .post(gateway_url(gateway_addr, "/v1/echo"))
        .body(r#"{"value":"ping"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(!supervisor.is_finished());

    supervisor.abort();
}

//! HTTP server tests: start the real server on a free port and talk to it
//! with reqwest.

use serde_json::{json, Value};

use docqa::config::Config;
use docqa::server::run_server;

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn test_config(port: u16, extra_server: &str) -> Config {
    let config_content = format!(
        r#"
[embedding]
provider = "hash"

[sanitizer]
blocked_terms = ["damn"]

[server]
bind = "127.0.0.1:{}"
{}
"#,
        port, extra_server
    );
    toml::from_str(&config_content).unwrap()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

async fn start_server() -> (u16, tokio::task::JoinHandle<()>) {
    start_server_with("").await
}

async fn start_server_with(extra_server: &str) -> (u16, tokio::task::JoinHandle<()>) {
    let port = find_free_port();
    let cfg = test_config(port, extra_server);
    let handle = tokio::spawn(async move {
        run_server(&cfg).await.ok();
    });
    wait_for_server(port).await;
    (port, handle)
}

const PETS: &str = "The cat sat on the mat. The dog ran in the park.";

#[tokio::test]
async fn test_health_and_stateless_ask() {
    let (port, handle) = start_server().await;
    let client = reqwest::Client::new();
    let base = format!("http://127.0.0.1:{}", port);

    let body: Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");

    let resp = client
        .post(format!("{}/ask", base))
        .json(&json!({ "document": PETS, "question": "Where did the cat sit?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["reply"]["status"], "answer");
    assert_eq!(body["message"], "The cat sat on the mat.");

    let body: Value = client
        .post(format!("{}/ask", base))
        .json(&json!({ "document": "", "question": "Where did the cat sit?" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["reply"]["status"], "document_empty");

    let resp = client
        .post(format!("{}/ask", base))
        .json(&json!({ "document": PETS, "question": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    handle.abort();
}

#[tokio::test]
async fn test_summarize_and_keywords() {
    let (port, handle) = start_server().await;
    let client = reqwest::Client::new();
    let base = format!("http://127.0.0.1:{}", port);
    let text = "Rust is a systems language. Rust gives memory safety without garbage \
                collection. Many teams adopt Rust for safety. The weather was nice.";

    let body: Value = client
        .post(format!("{}/summarize", base))
        .json(&json!({ "text": text, "sentences": 1 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        body["summary"],
        "Rust gives memory safety without garbage collection."
    );

    let body: Value = client
        .post(format!("{}/keywords", base))
        .json(&json!({ "text": text, "top": 1 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["keywords"][0]["term"], "rust");

    handle.abort();
}

#[tokio::test]
async fn test_session_lifecycle() {
    let (port, handle) = start_server().await;
    let client = reqwest::Client::new();
    let base = format!("http://127.0.0.1:{}", port);

    let resp = client
        .post(format!("{}/sessions", base))
        .json(&json!({ "document": PETS, "name": "pets.txt" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    let id = body["id"].as_str().unwrap().to_string();
    assert_eq!(body["words"], 12);

    let body: Value = client
        .post(format!("{}/sessions/{}/ask", base, id))
        .json(&json!({ "question": "Where did the damn dog run?" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["message"], "The dog ran in the park.");

    let body: Value = client
        .get(format!("{}/sessions/{}/history", base, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        body["turns"][0]["question"],
        "Where did the [CENSORED] dog run?"
    );

    let resp = client
        .delete(format!("{}/sessions/{}", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let resp = client
        .post(format!("{}/sessions/{}/ask", base, id))
        .json(&json!({ "question": "Where did the cat sit?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "not_found");

    handle.abort();
}

async fn open_session(client: &reqwest::Client, base: &str, document: &str) -> String {
    let body: Value = client
        .post(format!("{}/sessions", base))
        .json(&json!({ "document": document }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_least_recently_used_session_is_closed_at_limit() {
    let (port, handle) = start_server_with("max_sessions = 2").await;
    let client = reqwest::Client::new();
    let base = format!("http://127.0.0.1:{}", port);

    let first = open_session(&client, &base, PETS).await;
    let second = open_session(&client, &base, PETS).await;

    // touch the first session so the second becomes least recently used
    let resp = client
        .get(format!("{}/sessions/{}/history", base, first))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let third = open_session(&client, &base, PETS).await;

    for (id, expected) in [(&first, 200), (&second, 404), (&third, 200)] {
        let resp = client
            .get(format!("{}/sessions/{}/history", base, id))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), expected, "session {}", id);
    }

    handle.abort();
}

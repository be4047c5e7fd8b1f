//! The reqwest transport against loopback sockets

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use iglu_client::config::HttpSettings;
use iglu_client::{HttpRegistry, RegistryError, RegistryRefConfig, SchemaKey};

fn key() -> SchemaKey {
    SchemaKey::parse("iglu:com.acme/event/jsonschema/1-0-0").unwrap()
}

fn settings(timeout_ms: u64, max_retries: u32) -> HttpSettings {
    HttpSettings {
        timeout_ms,
        max_retries,
        ..HttpSettings::default()
    }
}

fn registry(uri: String, settings: &HttpSettings) -> HttpRegistry {
    HttpRegistry::new(RegistryRefConfig::new("Loopback", 0, vec![]), uri, settings).unwrap()
}

/// Answer `connections` requests with the given status and body
fn serve(listener: TcpListener, connections: usize, status: &'static str, body: &'static str) -> thread::JoinHandle<Vec<String>> {
    thread::spawn(move || {
        let mut requests = Vec::new();
        for stream in listener.incoming().take(connections) {
            let mut stream = stream.unwrap();
            let mut buf = [0u8; 4096];
            let mut request = Vec::new();
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            requests.push(String::from_utf8_lossy(&request).into_owned());
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
        }
        requests
    })
}

#[test]
fn test_ok_response_returns_schema() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    let server = serve(listener, 1, "200 OK", r#"{"type":"object"}"#);

    let registry = registry(uri, &settings(2_000, 0)).with_api_key(Some("secret".to_string()));
    let schema = registry.lookup_schema(&key()).unwrap();
    assert_eq!(schema, Some(serde_json::json!({"type": "object"})));

    let requests = server.join().unwrap();
    assert!(requests[0].starts_with("GET /schemas/com.acme/event/jsonschema/1-0-0 "));
    assert!(requests[0].to_lowercase().contains("apikey: secret"));
}

#[test]
fn test_not_found_is_absent() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    let server = serve(listener, 1, "404 Not Found", "");

    let registry = registry(uri, &settings(2_000, 0));
    assert_eq!(registry.lookup_schema(&key()).unwrap(), None);
    server.join().unwrap();
}

#[test]
fn test_refused_connection_is_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let registry = registry(uri, &settings(2_000, 3));
    assert!(matches!(
        registry.lookup_schema(&key()),
        Err(RegistryError::Unavailable { .. })
    ));
}

#[test]
fn test_silent_server_times_out_after_retries() {
    // Connections queue in the backlog but are never answered
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());

    let registry = registry(uri, &settings(200, 1));
    assert_eq!(registry.timeout(), Duration::from_millis(200));
    match registry.lookup_schema(&key()) {
        Err(RegistryError::Timeout { attempts, .. }) => assert_eq!(attempts, 2),
        other => panic!("expected timeout, got {:?}", other),
    }
    drop(listener);
}

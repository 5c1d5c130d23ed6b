use httpmock::{Method::POST, MockServer};
use sanbase_client::{Client, Config, HttpTransport, QueryParams, SanError, Transport};

fn transport_for(server: &MockServer, api_key: Option<&str>) -> HttpTransport {
    let mut cfg = Config {
        graphql_url: format!("{}/graphql", server.base_url()),
        ..Config::default()
    };
    if let Some(k) = api_key {
        cfg = cfg.with_api_key(k);
    }
    HttpTransport::new(cfg).unwrap()
}

#[test]
fn get_posts_query_with_api_key() {
    let server = MockServer::start();
    let m = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .header("authorization", "Apikey secret")
            .body_contains("dailyActiveAddresses");
        then.status(200).json_body(serde_json::json!({
            "data": {"query_0": [
                {"datetime": "2020-01-01T00:00:00Z", "activeAddresses": 700000}
            ]}
        }));
    });
    let client = Client::with_transport(transport_for(&server, Some("secret")));
    let frame = client
        .get(
            "daily_active_addresses/bitcoin",
            &QueryParams::new().from_date("2020-01-01").to_date("2020-01-02"),
        )
        .unwrap();
    m.assert();
    assert_eq!(frame.len(), 1);
    assert_eq!(
        frame.get(0, "activeAddresses"),
        Some(&serde_json::json!(700000))
    );
}

#[test]
fn rate_limited_response_is_sniffable() {
    let server = MockServer::start();
    let _m = server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(429)
            .body("API Rate Limit Reached. Try again in 30 seconds (30 seconds)");
    });
    let client = Client::with_transport(transport_for(&server, None));
    let err = client
        .get("prices/bitcoin", &QueryParams::new().from_date("utc_now-7d"))
        .unwrap_err();
    assert!(sanbase_client::is_rate_limit_exception(&err));
    assert_eq!(sanbase_client::rate_limit_time_left(&err), Some(30));
}

#[test]
fn calls_remaining_reads_headers() {
    let server = MockServer::start();
    let _m = server.mock(|when, then| {
        when.method(POST).path("/graphql").body_contains("apiCallsHistory");
        then.status(200)
            .header("x-ratelimit-remaining-month", "100")
            .header("x-ratelimit-remaining-hour", "10")
            .header("x-ratelimit-remaining-minute", "2")
            .json_body(serde_json::json!({"data": {"currentUser": null}}));
    });
    let client = Client::with_transport(transport_for(&server, Some("k")));
    let r = client.api_calls_remaining().unwrap();
    assert_eq!(r.month_remaining, "100");
    assert_eq!(r.hour_remaining, "10");
    assert_eq!(r.minute_remaining, "2");
}

#[test]
fn calls_made_without_key_is_no_credential() {
    let server = MockServer::start();
    let _m = server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(200)
            .json_body(serde_json::json!({"data": {"currentUser": null}}));
    });
    let client = Client::with_transport(transport_for(&server, None));
    assert_eq!(client.api_calls_made(), Err(SanError::NoCredential));
}

#[test]
fn calls_made_parses_history() {
    let server = MockServer::start();
    let _m = server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(200).json_body(serde_json::json!({"data": {"currentUser": {
            "apiCallsHistory": [
                {"datetime": "2024-01-01T00:00:00Z", "apiCallsCount": 5},
                {"datetime": "2024-01-02T00:00:00Z", "apiCallsCount": 0}
            ]
        }}}));
    });
    let client = Client::with_transport(transport_for(&server, Some("k")));
    let calls = client.api_calls_made().unwrap();
    assert_eq!(
        calls,
        vec![
            ("2024-01-01T00:00:00Z".to_string(), 5),
            ("2024-01-02T00:00:00Z".to_string(), 0)
        ]
    );
}

#[test]
fn graphql_errors_surface_as_transport_errors() {
    let server = MockServer::start();
    let _m = server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(200).json_body(serde_json::json!({
            "data": null,
            "errors": [{"message": "The metric 'nope' is not supported"}]
        }));
    });
    let transport = transport_for(&server, None);
    let err = transport.execute("{ query_0: x }").unwrap_err();
    assert!(err.to_string().contains("is not supported"));
}

#[test]
fn calls_remaining_surfaces_rate_limit_status() {
    let server = MockServer::start();
    let _m = server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(429)
            .header("x-ratelimit-remaining-month", "0")
            .body("API Rate Limit Reached. Try again in 30 seconds (30 seconds)");
    });
    let client = Client::with_transport(transport_for(&server, Some("k")));
    let err = client.api_calls_remaining().unwrap_err();
    assert!(matches!(err, SanError::Transport(_)), "{:?}", err);
    assert!(sanbase_client::is_rate_limit_exception(&err));
    assert_eq!(sanbase_client::rate_limit_time_left(&err), Some(30));
}

#[test]
fn calls_remaining_surfaces_server_errors() {
    let server = MockServer::start();
    let _m = server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(500).body("upstream down");
    });
    let transport = transport_for(&server, Some("k"));
    let err = transport
        .response_headers("{ currentUser { id } }")
        .unwrap_err();
    assert!(err.to_string().contains("Status code: 500."));
    assert!(err.to_string().contains("upstream down"));
}

// Serves one response that promises more body than it sends, then hangs up.
fn truncated_body_server() -> String {
    use std::io::{Read, Write};
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let body_len = text[..end]
                    .lines()
                    .find_map(|l| {
                        let (k, v) = l.split_once(':')?;
                        k.eq_ignore_ascii_case("content-length")
                            .then(|| v.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    break;
                }
            }
        }
        let _ = stream.write_all(
            b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 500\r\n\r\n{\"data\"",
        );
        let _ = stream.flush();
    });
    format!("http://{}/graphql", addr)
}

#[test]
fn body_read_failure_is_reported() {
    let cfg = Config {
        graphql_url: truncated_body_server(),
        ..Config::default()
    };
    let transport = HttpTransport::new(cfg).unwrap();
    let err = transport.execute("{ query_0: x }").unwrap_err();
    assert!(
        err.to_string().contains("failed to read response"),
        "{}",
        err
    );
}

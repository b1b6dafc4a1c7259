use netbridge::{Bridge, BridgeConfig, ProxyRequest};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serves `respond(request_text)` for every connection and records each
/// request it saw.
async fn spawn_server<F>(respond: F) -> (String, Arc<Mutex<Vec<String>>>)
where
    F: Fn(&str) -> Vec<u8> + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    let respond = Arc::new(respond);

    tokio::spawn(async move {
        loop {
            if let Ok((mut socket, _)) = listener.accept().await {
                let seen = seen_clone.clone();
                let respond = respond.clone();
                tokio::spawn(async move {
                    let request = read_request(&mut socket).await;
                    seen.lock().unwrap().push(request.clone());
                    let _ = socket.write_all(&respond(&request)).await;
                });
            }
        }
    });

    (format!("http://{}", addr), seen)
}

/// Reads the head and, when announced, a `Content-Length` body.
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(&data).to_string();
        if let Some(head_end) = text.find("\r\n\r\n") {
            let body_len = header_line(&text[..head_end], "content-length")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(0);
            if data.len() >= head_end + 4 + body_len {
                break;
            }
        }
    }
    String::from_utf8_lossy(&data).to_string()
}

fn response(status_line: &str, extra_headers: &str, body: &[u8]) -> Vec<u8> {
    let mut out = format!(
        "HTTP/1.1 {}\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n",
        status_line,
        extra_headers,
        body.len()
    )
    .into_bytes();
    out.extend_from_slice(body);
    out
}

fn header_line<'a>(request: &'a str, name: &str) -> Option<&'a str> {
    request.lines().find_map(|line| {
        let (k, v) = line.split_once(':')?;
        k.eq_ignore_ascii_case(name).then(|| v.trim())
    })
}

#[tokio::test]
async fn test_cookie_flows_into_next_request() {
    let (base, seen) = spawn_server(|req| {
        if req.starts_with("GET /a/b") {
            response("200 OK", "", b"second")
        } else {
            response("200 OK", "Set-Cookie: session=abc; Path=/; Max-Age=60\r\n", b"first")
        }
    })
    .await;

    let bridge = Bridge::builder().build();

    let first = bridge.http_request(ProxyRequest::get(format!("{}/a", base))).await;
    assert!(first.success);
    assert_eq!(first.body_bytes().unwrap(), b"first");
    assert_eq!(bridge.cookie_jar().total_cookie_count(), 1);

    let second = bridge.http_request(ProxyRequest::get(format!("{}/a/b", base))).await;
    assert!(second.success);

    let requests = seen.lock().unwrap();
    assert_eq!(header_line(&requests[0], "cookie"), None);
    assert_eq!(header_line(&requests[1], "cookie"), Some("session=abc"));
}

#[tokio::test]
async fn test_jar_cookie_replaces_caller_cookie() {
    let (base, seen) = spawn_server(|req| {
        if req.starts_with("GET /login") {
            response("200 OK", "Set-Cookie: sid=jar\r\n", b"")
        } else {
            response("200 OK", "", b"")
        }
    })
    .await;

    let bridge = Bridge::builder().build();
    bridge.http_request(ProxyRequest::get(format!("{}/login", base))).await;
    bridge
        .http_request(ProxyRequest::get(format!("{}/me", base)).header("Cookie", "sid=caller"))
        .await;

    let requests = seen.lock().unwrap();
    assert_eq!(header_line(&requests[1], "cookie"), Some("sid=jar"));
}

#[tokio::test]
async fn test_non_2xx_is_success() {
    let (base, _) = spawn_server(|_| response("404 Not Found", "Content-Type: text/plain\r\n", b"nope")).await;

    let bridge = Bridge::builder().build();
    let result = bridge.http_request(ProxyRequest::get(format!("{}/missing", base))).await;

    assert!(result.success);
    assert_eq!(result.status, 404);
    assert_eq!(result.status_text, "Not Found");
    assert_eq!(result.content_type, "text/plain");
    assert_eq!(result.body_bytes().unwrap(), b"nope");
    assert!(result.error.is_none());
}

#[tokio::test]
async fn test_binary_body_round_trips() {
    let all_bytes: Vec<u8> = (0..=255u8).collect();
    let body = all_bytes.clone();
    let (base, _) = spawn_server(move |_| response("200 OK", "", &body)).await;

    let bridge = Bridge::builder().build();
    let result = bridge.http_request(ProxyRequest::get(format!("{}/bin", base))).await;

    assert!(result.success);
    assert_eq!(result.content_type, "application/octet-stream");
    assert_eq!(result.body_bytes().unwrap(), all_bytes);
}

#[tokio::test]
async fn test_host_and_origin_are_not_forwarded() {
    let (base, seen) = spawn_server(|_| response("200 OK", "", b"")).await;

    let bridge = Bridge::builder().build();
    bridge
        .http_request(
            ProxyRequest::get(format!("{}/", base))
                .header("Host", "evil.test")
                .header("Origin", "https://evil.test")
                .header("X-Custom", "kept"),
        )
        .await;

    let requests = seen.lock().unwrap();
    let host = header_line(&requests[0], "host").unwrap();
    assert!(host.starts_with("127.0.0.1:"), "{}", host);
    assert_eq!(header_line(&requests[0], "origin"), None);
    assert_eq!(header_line(&requests[0], "x-custom"), Some("kept"));
}

#[tokio::test]
async fn test_post_json_body() {
    let (base, seen) = spawn_server(|_| response("201 Created", "", b"")).await;

    let bridge = Bridge::builder().build();
    let result = bridge
        .http_request(ProxyRequest::post(format!("{}/items", base)).body(serde_json::json!({ "n": 1 })))
        .await;
    assert_eq!(result.status, 201);

    let requests = seen.lock().unwrap();
    assert!(requests[0].starts_with("POST /items"));
    assert_eq!(header_line(&requests[0], "content-type"), Some("application/json"));
    assert!(requests[0].ends_with(r#"{"n":1}"#));
}

#[tokio::test]
async fn test_redirect_followed_and_cookies_recorded_per_hop() {
    let (base, seen) = spawn_server(|req| {
        if req.starts_with("POST /start") {
            response("303 See Other", "Location: /done\r\nSet-Cookie: hop=1\r\n", b"")
        } else {
            response("200 OK", "", b"landed")
        }
    })
    .await;

    let bridge = Bridge::builder().build();
    let result = bridge
        .http_request(ProxyRequest::post(format!("{}/start", base)).body("payload"))
        .await;

    assert!(result.success);
    assert_eq!(result.body_bytes().unwrap(), b"landed");

    let requests = seen.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].starts_with("GET /done"));
    assert_eq!(header_line(&requests[1], "cookie"), Some("hop=1"));
}

#[tokio::test]
async fn test_redirect_limit() {
    let (base, seen) = spawn_server(|_| response("302 Found", "Location: /loop\r\n", b"")).await;

    let bridge = Bridge::builder().build();
    let result = bridge.http_request(ProxyRequest::get(format!("{}/start", base))).await;

    assert!(!result.success);
    assert_eq!(result.status, 500);
    assert_eq!(result.error.as_deref(), Some("Too many redirects"));
    assert!(result.data.is_empty());
    // The initial request plus five followed redirects.
    assert_eq!(seen.lock().unwrap().len(), 6);
}

#[tokio::test]
async fn test_invalid_url_is_400() {
    let bridge = Bridge::builder().build();

    for url in ["", "not a url", "ftp://example.com/file"] {
        let result = bridge.http_request(ProxyRequest::get(url)).await;
        assert!(!result.success, "{}", url);
        assert_eq!(result.status, 400, "{}", url);
        assert!(result.error.is_some());
    }
}

#[tokio::test]
async fn test_connection_refused_is_500() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let bridge = Bridge::builder().build();
    let result = bridge
        .http_request(ProxyRequest::get(format!("http://127.0.0.1:{}/", port)))
        .await;

    assert!(!result.success);
    assert_eq!(result.status, 500);
    assert!(result.error.unwrap().contains("refused"));
}

#[tokio::test]
async fn test_timeout() {
    // Accepts and then never answers.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
    });

    let bridge = Bridge::builder()
        .config(BridgeConfig::new().request_timeout(Duration::from_millis(200)))
        .build();
    let result = bridge
        .http_request(ProxyRequest::get(format!("http://{}/slow", addr)))
        .await;

    assert!(!result.success);
    assert_eq!(result.status, 500);
    assert_eq!(result.error.as_deref(), Some("Request timed out after 200 ms"));
}

#[tokio::test]
async fn test_cross_origin_redirect_drops_authorization() {
    let (target, target_seen) = spawn_server(|_| response("200 OK", "", b"")).await;
    let location = format!("Location: {}/landing\r\n", target);
    let (origin, origin_seen) =
        spawn_server(move |_| response("307 Temporary Redirect", &location, b"")).await;

    let bridge = Bridge::builder().build();
    let result = bridge
        .http_request(ProxyRequest::get(format!("{}/start", origin)).header("Authorization", "Bearer t"))
        .await;
    assert!(result.success);

    assert_eq!(header_line(&origin_seen.lock().unwrap()[0], "authorization"), Some("Bearer t"));
    assert_eq!(header_line(&target_seen.lock().unwrap()[0], "authorization"), None);
}

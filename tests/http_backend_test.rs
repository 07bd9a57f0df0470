//! The HTTP backend against a minimal local server: cookie bootstrap, CSRF
//! token extraction and multipart encoding as they appear on the wire.

use docchat::{
    AskOutcome, CredentialProvider, FileSelection, HttpBackend, Message, Role, Session, Transcript,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Serves canned responses by request path and keeps every raw request.
struct TestServer {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    async fn start(routes: Vec<(&str, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let routes: HashMap<String, String> = routes
            .into_iter()
            .map(|(path, response)| (path.to_string(), response))
            .collect();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let seen = requests.clone();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let raw = read_request(&mut stream).await;
                let path = raw.split_whitespace().nth(1).unwrap_or_default().to_string();
                seen.lock().unwrap().push(raw);

                let response = routes
                    .get(&path)
                    .cloned()
                    .unwrap_or_else(|| http_response("404 Not Found", &[], "not found"));
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        TestServer { base_url, requests }
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn http_response(status: &str, headers: &[&str], body: &str) -> String {
    let mut out = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        body.len()
    );
    for header in headers {
        out.push_str(header);
        out.push_str("\r\n");
    }
    out.push_str("\r\n");
    out.push_str(body);
    out
}

fn json_response(status: &str, body: &str) -> String {
    http_response(status, &["Content-Type: application/json"], body)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Decode a complete chunked body, or `None` if more bytes are needed.
fn dechunk(mut data: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    loop {
        let line_end = find(data, b"\r\n")?;
        let size_line = std::str::from_utf8(&data[..line_end]).ok()?;
        let size = usize::from_str_radix(size_line.split(';').next()?.trim(), 16).ok()?;
        data = &data[line_end + 2..];
        if size == 0 {
            return Some(out);
        }
        if data.len() < size + 2 {
            return None;
        }
        out.extend_from_slice(&data[..size]);
        data = &data[size + 2..];
    }
}

/// Read one request: head plus a `Content-Length` or chunked body.
async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];

    let head_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            return String::from_utf8_lossy(&buf).into_owned();
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let lowered = head.to_lowercase();
    let content_length = lowered
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok());
    let chunked = lowered.contains("transfer-encoding: chunked");

    let mut body = buf[head_end..].to_vec();
    if let Some(length) = content_length {
        while body.len() < length {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
    } else if chunked {
        body = loop {
            if let Some(decoded) = dechunk(&body) {
                break decoded;
            }
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break body;
            }
            body.extend_from_slice(&chunk[..n]);
        };
    }

    format!("{}{}", head, String::from_utf8_lossy(&body))
}

fn texts(messages: &[Message]) -> Vec<String> {
    messages.iter().map(|m| m.text().to_string()).collect()
}

async fn connected_session(server: &TestServer) -> (Session, Arc<Transcript>) {
    let backend = HttpBackend::new(&server.base_url).unwrap();
    backend.open_session().await.unwrap();
    let transcript = Arc::new(Transcript::new());
    let credentials = Arc::new(backend.credentials());
    (
        Session::new(Arc::new(backend), credentials, transcript.clone()),
        transcript,
    )
}

fn chat_page() -> String {
    http_response(
        "200 OK",
        &["Set-Cookie: csrftoken=ab%2Fc; Path=/", "Content-Type: text/html"],
        "<html>chat</html>",
    )
}

#[tokio::test]
async fn test_session_cookie_becomes_csrf_token() {
    let server = TestServer::start(vec![("/chat/", chat_page())]).await;
    let backend = HttpBackend::new(&server.base_url).unwrap();
    assert_eq!(backend.credentials().read_token(), "");

    let reply = backend.open_session().await.unwrap();
    assert_eq!(reply.status, 200);
    assert_eq!(backend.credentials().read_token(), "ab/c");

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].starts_with("GET /chat/ HTTP/1.1"));
}

#[tokio::test]
async fn test_upload_sends_streamed_file_and_token_as_multipart() {
    let server = TestServer::start(vec![
        ("/chat/", chat_page()),
        ("/api/upload/", json_response("200 OK", r#"{"ok":true,"doc_id":"d1","chunks":2}"#)),
    ])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "line one\nline two\n").unwrap();

    let (session, transcript) = connected_session(&server).await;
    let mut selection = FileSelection::from_paths([path]);
    let reports = session.uploads.upload_all(&mut selection).await.unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].doc_id(), Some("d1"));
    assert_eq!(
        texts(&transcript.messages()),
        vec!["Uploading notes.txt...", "Embedded notes.txt (2 chunks)."]
    );

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    let upload = &requests[1];
    let lowered = upload.to_lowercase();
    assert!(upload.starts_with("POST /api/upload/ HTTP/1.1"));
    assert!(lowered.contains("content-type: multipart/form-data; boundary="));
    assert!(lowered.contains("cookie: csrftoken=ab%2fc"));
    assert!(upload.contains(r#"name="file"; filename="notes.txt""#));
    assert!(upload.contains("line one\nline two\n"));
    assert!(upload.contains("name=\"csrfmiddlewaretoken\"\r\n\r\nab/c\r\n"));
}

#[tokio::test]
async fn test_upload_rejected_by_server_reports_reason_phrase() {
    let server = TestServer::start(vec![
        ("/chat/", chat_page()),
        (
            "/api/upload/",
            http_response("403 Forbidden", &["Content-Type: text/html"], "<h1>CSRF verification failed</h1>"),
        ),
    ])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.txt");
    std::fs::write(&path, "x").unwrap();

    let (session, transcript) = connected_session(&server).await;
    let mut selection = FileSelection::from_paths([path, dir.path().join("missing.txt")]);
    session.uploads.upload_all(&mut selection).await.unwrap();

    let messages = texts(&transcript.messages());
    assert_eq!(
        messages[..3].to_vec(),
        vec!["Uploading a.txt...", "Upload error: Forbidden", "Uploading missing.txt..."]
    );
    assert!(messages[3].starts_with("Upload error: Could not read missing.txt: "));
    // The unreadable file never reached the server.
    assert_eq!(server.requests().len(), 2);
}

#[tokio::test]
async fn test_ask_over_http() {
    let server = TestServer::start(vec![
        ("/chat/", chat_page()),
        (
            "/api/ask/",
            json_response(
                "200 OK",
                r#"{"ok":true,"answer":"Forty-two.","sources":[{"index":1,"doc_name":"guide.txt","snippet":"the answer"}]}"#,
            ),
        ),
    ])
    .await;

    let (session, transcript) = connected_session(&server).await;
    let mut input = "What is the answer?".to_string();
    let outcome = session.asks.ask(&mut input).await.unwrap();
    assert!(matches!(outcome, AskOutcome::Answered { .. }));

    let messages = transcript.messages();
    assert_eq!(messages[1].role(), Role::Assistant);
    assert_eq!(messages[1].text(), "Forty-two.");
    assert_eq!(messages[1].citation_lines(), vec!["[1] guide.txt: the answer"]);

    let ask = &server.requests()[1];
    assert!(ask.starts_with("POST /api/ask/ HTTP/1.1"));
    assert!(ask.contains("name=\"question\"\r\n\r\nWhat is the answer?\r\n"));
    assert!(ask.contains("name=\"csrfmiddlewaretoken\"\r\n\r\nab/c\r\n"));
}

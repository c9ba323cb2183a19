//! Tests for GET/POST dispatch against static files and sessions

use std::path::Path;

use cookie_server::http::handler::Handler;
use cookie_server::http::parser::parse_http_request;
use cookie_server::http::resource::StaticFiles;
use cookie_server::http::response::StatusCode;
use cookie_server::session::SessionStore;
use tempfile::TempDir;

const INDEX: &[u8] = b"<html><body>index</body></html>";

struct Fixture {
    _tmp: TempDir,
    handler: Handler,
    sessions: std::path::PathBuf,
}

fn fixture() -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    let public = tmp.path().join("public");
    let sessions = tmp.path().join("cookies");
    std::fs::create_dir_all(public.join("css")).unwrap();
    std::fs::create_dir_all(&sessions).unwrap();
    std::fs::write(public.join("index.html"), INDEX).unwrap();
    std::fs::write(public.join("css/site.css"), b"body{}").unwrap();
    // A file outside the static root that traversal must never reach.
    std::fs::write(tmp.path().join("secret.txt"), b"secret").unwrap();

    let handler = Handler::new(
        StaticFiles::new(&public, "/index.html"),
        SessionStore::new(&sessions),
        86400,
    );

    Fixture {
        _tmp: tmp,
        handler,
        sessions,
    }
}

async fn exchange(handler: &mut Handler, raw: &[u8]) -> (StatusCode, String, Vec<u8>) {
    let (request, _) = parse_http_request(raw).unwrap();
    let mut out = Vec::new();
    let status = handler.handle(&request, &mut out).await.unwrap();

    let split = out
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has a header terminator");
    let head = String::from_utf8(out[..split].to_vec()).unwrap();
    let body = out[split + 4..].to_vec();
    (status, head, body)
}

fn session_file(dir: &Path, id: &str) -> Vec<u8> {
    std::fs::read(dir.join(id)).unwrap()
}

#[tokio::test]
async fn test_get_root_without_cookie_serves_index_and_sets_cookie() {
    let mut fx = fixture();

    let (status, head, body) =
        exchange(&mut fx.handler, b"GET / HTTP/1.1\r\nHost: x\r\n\r\n").await;

    assert_eq!(status, StatusCode::Ok);
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(head.contains("Connection: close"));
    assert!(head.contains(&format!("Content-Length: {}", INDEX.len())));
    assert!(head.contains("Content-Type: text/html"));
    assert!(head.contains("Set-Cookie: id=0; Max-Age=86400"));
    assert_eq!(body, INDEX);
    assert_eq!(session_file(&fx.sessions, "0"), b"");
}

#[tokio::test]
async fn test_get_without_cookie_allocates_increasing_ids() {
    let mut fx = fixture();

    for expected in 0..3 {
        let (_, head, _) =
            exchange(&mut fx.handler, b"GET /css/site.css HTTP/1.1\r\n\r\n").await;
        assert!(head.contains(&format!("Set-Cookie: id={}; Max-Age=86400", expected)));
        assert!(head.contains("Content-Type: text/css"));
    }
}

#[tokio::test]
async fn test_get_with_cookie_serves_path_without_set_cookie() {
    let mut fx = fixture();
    std::fs::write(fx.sessions.join("5"), b"session data").unwrap();

    let (status, head, body) = exchange(
        &mut fx.handler,
        b"GET /css/site.css HTTP/1.1\r\nCookie: id=5\r\n\r\n",
    )
    .await;

    assert_eq!(status, StatusCode::Ok);
    assert!(!head.contains("Set-Cookie"));
    assert_eq!(body, b"body{}");
    // GET never touches session content.
    assert_eq!(session_file(&fx.sessions, "5"), b"session data");
}

#[tokio::test]
async fn test_get_missing_file_is_not_found() {
    let mut fx = fixture();

    let (status, head, body) = exchange(
        &mut fx.handler,
        b"GET /nope.html HTTP/1.1\r\nCookie: id=1\r\n\r\n",
    )
    .await;

    assert_eq!(status, StatusCode::NotFound);
    assert!(head.starts_with("HTTP/1.1 404 Not Found"));
    assert_eq!(body, b"Not Found");
}

#[tokio::test]
async fn test_get_directory_is_not_found() {
    let mut fx = fixture();

    let (status, _, _) = exchange(&mut fx.handler, b"GET /css HTTP/1.1\r\nCookie: id=1\r\n\r\n").await;

    assert_eq!(status, StatusCode::NotFound);
}

#[tokio::test]
async fn test_get_traversal_is_not_found_even_if_target_exists() {
    let mut fx = fixture();

    let (status, _, body) = exchange(
        &mut fx.handler,
        b"GET /../secret.txt HTTP/1.1\r\nCookie: id=1\r\n\r\n",
    )
    .await;

    assert_eq!(status, StatusCode::NotFound);
    assert_eq!(body, b"Not Found");
}

#[tokio::test]
async fn test_get_long_path_is_bad_request() {
    let mut fx = fixture();
    let raw = format!("GET /{} HTTP/1.1\r\nCookie: id=1\r\n\r\n", "a".repeat(100));

    let (status, head, body) = exchange(&mut fx.handler, raw.as_bytes()).await;

    assert_eq!(status, StatusCode::BadRequest);
    assert!(head.starts_with("HTTP/1.1 400 Bad Request"));
    assert_eq!(body, b"Bad Request");
}

#[tokio::test]
async fn test_post_with_cookie_appends_body() {
    let mut fx = fixture();
    std::fs::write(fx.sessions.join("7"), b"before:").unwrap();

    let (status, head, body) = exchange(
        &mut fx.handler,
        b"POST /x HTTP/1.1\r\nContent-Length: 5\r\nCookie: id=7\r\n\r\nhello",
    )
    .await;

    assert_eq!(status, StatusCode::Ok);
    assert!(head.contains("Content-Length: 0"));
    assert!(body.is_empty());
    assert_eq!(session_file(&fx.sessions, "7"), b"before:hello");
}

#[tokio::test]
async fn test_post_with_unknown_cookie_is_not_found() {
    let mut fx = fixture();

    let (status, _, _) = exchange(
        &mut fx.handler,
        b"POST /x HTTP/1.1\r\nContent-Length: 5\r\nCookie: id=44\r\n\r\nhello",
    )
    .await;

    assert_eq!(status, StatusCode::NotFound);
    assert!(!fx.sessions.join("44").exists());
}

#[tokio::test]
async fn test_post_without_cookie_creates_session_and_serves_it() {
    let mut fx = fixture();

    let (status, head, body) = exchange(
        &mut fx.handler,
        b"POST /form HTTP/1.1\r\nContent-Length: 9\r\n\r\nname=ferr",
    )
    .await;

    assert_eq!(status, StatusCode::Ok);
    assert!(head.contains("Set-Cookie: id=0; Max-Age=86400"));
    assert!(head.contains("Content-Type: text/plain"));
    assert!(head.contains("Content-Length: 9"));
    assert_eq!(body, b"name=ferr");
    assert_eq!(session_file(&fx.sessions, "0"), b"name=ferr");
}

#[tokio::test]
async fn test_sessions_from_get_and_post_share_numbering() {
    let mut fx = fixture();

    exchange(&mut fx.handler, b"GET / HTTP/1.1\r\n\r\n").await;
    let (_, head, _) = exchange(
        &mut fx.handler,
        b"POST / HTTP/1.1\r\nContent-Length: 1\r\n\r\na",
    )
    .await;

    assert!(head.contains("Set-Cookie: id=1;"));
    assert_eq!(session_file(&fx.sessions, "1"), b"a");
}

fn session_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_get_long_path_without_cookie_allocates_nothing() {
    let mut fx = fixture();
    let raw = format!("GET /{} HTTP/1.1\r\n\r\n", "a".repeat(120));

    let (status, head, _) = exchange(&mut fx.handler, raw.as_bytes()).await;

    assert_eq!(status, StatusCode::BadRequest);
    assert!(!head.contains("Set-Cookie"));
    assert!(session_files(&fx.sessions).is_empty());
}

#[tokio::test]
async fn test_get_traversal_without_cookie_allocates_nothing() {
    let mut fx = fixture();

    let (status, _, _) = exchange(&mut fx.handler, b"GET /../secret.txt HTTP/1.1\r\n\r\n").await;
    assert_eq!(status, StatusCode::NotFound);
    assert!(session_files(&fx.sessions).is_empty());

    // The next accepted request still gets the first identifier.
    let (_, head, _) = exchange(&mut fx.handler, b"GET / HTTP/1.1\r\n\r\n").await;
    assert!(head.contains("Set-Cookie: id=0;"));
    assert_eq!(session_files(&fx.sessions), ["0"]);
}

#[tokio::test]
async fn test_get_without_cookie_skips_set_cookie_when_session_cannot_be_created() {
    let mut fx = fixture();
    std::fs::remove_dir(&fx.sessions).unwrap();

    let (status, head, body) = exchange(&mut fx.handler, b"GET / HTTP/1.1\r\n\r\n").await;

    assert_eq!(status, StatusCode::Ok);
    assert!(!head.contains("Set-Cookie"));
    assert_eq!(body, INDEX);
}

#[tokio::test]
async fn test_post_without_cookie_when_session_cannot_be_created() {
    let mut fx = fixture();
    std::fs::remove_dir(&fx.sessions).unwrap();

    let (status, head, _) = exchange(
        &mut fx.handler,
        b"POST /form HTTP/1.1\r\nContent-Length: 1\r\n\r\na",
    )
    .await;

    assert_eq!(status, StatusCode::NotFound);
    assert!(!head.contains("Set-Cookie"));
}

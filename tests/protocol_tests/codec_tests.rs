//! Codec Tests
//!
//! Tests for HTTP request parsing and response encoding.

use std::io::Cursor;

use pear::protocol::{
    check_framing, encode_request, encode_response, keep_alive, read_request,
    read_request_head, read_response, Limits, Method, Response, Status, Version,
};
use tokio::io::BufReader;
use pear::PearError;

fn limits() -> Limits {
    Limits {
        max_line: 256,
        max_headers: 8,
        max_body: 1024,
    }
}

// =============================================================================
// Request Parsing Tests
// =============================================================================

#[tokio::test]
async fn test_read_get_request() {
    let mut input: &[u8] = b"GET /foo/ HTTP/1.1\r\nHost: x\r\n\r\n";

    let request = read_request(&mut input, &limits()).await.unwrap().unwrap();

    assert_eq!(request.head.method, Method::Get);
    assert_eq!(request.path(), b"/foo/");
    assert_eq!(request.head.version, Version::Http11);
    assert_eq!(request.head.header("host"), Some("x"));
    assert!(request.body.is_empty());
}

#[tokio::test]
async fn test_read_put_with_content_length() {
    let mut input: &[u8] = b"PUT /foo/x HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";

    let request = read_request(&mut input, &limits()).await.unwrap().unwrap();

    assert_eq!(request.head.method, Method::Put);
    assert_eq!(&request.body[..], b"hello");
}

#[tokio::test]
async fn test_read_chunked_body() {
    let mut input: &[u8] = b"PUT /k/ HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n\
        5\r\nhello\r\n6;ext=1\r\n world\r\n0\r\nTrailer: yes\r\n\r\n";

    let request = read_request(&mut input, &limits()).await.unwrap().unwrap();

    assert_eq!(&request.body[..], b"hello world");
    assert!(input.is_empty());
}

#[tokio::test]
async fn test_read_pipelined_requests() {
    let mut input: &[u8] = b"PUT /a/ HTTP/1.1\r\nContent-Length: 1\r\n\r\nxGET /a/ HTTP/1.1\r\n\r\n";

    let first = read_request(&mut input, &limits()).await.unwrap().unwrap();
    let second = read_request(&mut input, &limits()).await.unwrap().unwrap();
    let end = read_request(&mut input, &limits()).await.unwrap();

    assert_eq!(first.head.method, Method::Put);
    assert_eq!(&first.body[..], b"x");
    assert_eq!(second.head.method, Method::Get);
    assert!(end.is_none());
}

#[tokio::test]
async fn test_leading_blank_lines_skipped() {
    let mut input: &[u8] = b"\r\n\r\nDELETE /k/ HTTP/1.0\r\n\r\n";

    let head = read_request_head(&mut input, &limits()).await.unwrap().unwrap();

    assert_eq!(head.method, Method::Delete);
    assert_eq!(head.version, Version::Http10);
}

#[tokio::test]
async fn test_unknown_method_parses() {
    let mut input: &[u8] = b"PATCH /k/ HTTP/1.1\r\n\r\n";

    let head = read_request_head(&mut input, &limits()).await.unwrap().unwrap();

    assert_eq!(head.method, Method::Other("PATCH".to_string()));
}

#[tokio::test]
async fn test_clean_eof_is_none() {
    let mut input: &[u8] = b"";

    assert!(read_request(&mut input, &limits()).await.unwrap().is_none());
}

// =============================================================================
// Request Error Tests
// =============================================================================

#[tokio::test]
async fn test_truncated_body_is_eof() {
    let mut input: &[u8] = b"PUT /k/ HTTP/1.1\r\nContent-Length: 10\r\n\r\nshort";

    let err = read_request(&mut input, &limits()).await.unwrap_err();

    assert!(matches!(err, PearError::Io(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof));
}

#[tokio::test]
async fn test_body_arriving_in_small_pieces() {
    let raw: &[u8] = b"PUT /k/ HTTP/1.1\r\nContent-Length: 26\r\n\r\nabcdefghijklmnopqrstuvwxyz";
    let mut input = BufReader::with_capacity(4, raw);

    let request = read_request(&mut input, &limits()).await.unwrap().unwrap();

    assert_eq!(&request.body[..], b"abcdefghijklmnopqrstuvwxyz");
}

#[tokio::test]
async fn test_check_framing_judges_head_alone() {
    let mut input: &[u8] = b"PUT /k/ HTTP/1.1\r\nContent-Length: 999999999999\r\n\r\n";
    let head = read_request_head(&mut input, &limits()).await.unwrap().unwrap();
    assert!(matches!(check_framing(&head, &limits()), Err(PearError::Protocol(_))));

    let mut input: &[u8] = b"PUT /k/ HTTP/1.1\r\nContent-Length: 12x\r\n\r\n";
    let head = read_request_head(&mut input, &limits()).await.unwrap().unwrap();
    assert!(matches!(check_framing(&head, &limits()), Err(PearError::Protocol(_))));

    let mut input: &[u8] = b"PUT /k/ HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n";
    let head = read_request_head(&mut input, &limits()).await.unwrap().unwrap();
    assert!(check_framing(&head, &limits()).is_ok());
}

#[tokio::test]
async fn test_truncated_head_is_eof() {
    let mut input: &[u8] = b"GET /k/ HTTP/1.1\r\nHost: x\r\n";

    let err = read_request_head(&mut input, &limits()).await.unwrap_err();

    assert!(matches!(err, PearError::Io(_)));
}

#[tokio::test]
async fn test_oversized_line_rejected() {
    let path = "a".repeat(400);
    let raw = format!("GET /{}/ HTTP/1.1\r\n\r\n", path);
    let mut input: &[u8] = raw.as_bytes();

    let err = read_request_head(&mut input, &limits()).await.unwrap_err();

    assert!(matches!(err, PearError::Protocol(_)));
}

#[tokio::test]
async fn test_too_many_headers_rejected() {
    let mut raw = String::from("GET /k/ HTTP/1.1\r\n");
    for i in 0..9 {
        raw.push_str(&format!("X-H{}: v\r\n", i));
    }
    raw.push_str("\r\n");
    let mut input: &[u8] = raw.as_bytes();

    let err = read_request_head(&mut input, &limits()).await.unwrap_err();

    assert!(matches!(err, PearError::Protocol(_)));
}

#[tokio::test]
async fn test_body_over_limit_rejected() {
    let mut input: &[u8] = b"PUT /k/ HTTP/1.1\r\nContent-Length: 4096\r\n\r\n";

    let err = read_request(&mut input, &limits()).await.unwrap_err();

    assert!(matches!(err, PearError::Protocol(_)));
}

#[tokio::test]
async fn test_chunked_body_over_limit_rejected() {
    let mut input: &[u8] = b"PUT /k/ HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\nfff\r\n";

    let err = read_request(&mut input, &limits()).await.unwrap_err();

    assert!(matches!(err, PearError::Protocol(_)));
}

#[tokio::test]
async fn test_invalid_content_length_rejected() {
    let mut input: &[u8] = b"PUT /k/ HTTP/1.1\r\nContent-Length: -1\r\n\r\n";

    let err = read_request(&mut input, &limits()).await.unwrap_err();

    assert!(matches!(err, PearError::Protocol(_)));
}

#[tokio::test]
async fn test_bad_version_rejected() {
    let mut input: &[u8] = b"GET /k/ HTTP/2\r\n\r\n";

    let err = read_request_head(&mut input, &limits()).await.unwrap_err();

    assert!(matches!(err, PearError::Protocol(_)));
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[tokio::test]
async fn test_keep_alive_rules() {
    let cases: [(&[u8], bool); 4] = [
        (b"GET /k/ HTTP/1.1\r\n\r\n", true),
        (b"GET /k/ HTTP/1.1\r\nConnection: close\r\n\r\n", false),
        (b"GET /k/ HTTP/1.0\r\n\r\n", false),
        (b"GET /k/ HTTP/1.0\r\nConnection: Keep-Alive\r\n\r\n", true),
    ];

    for (raw, expected) in cases {
        let mut input = raw;
        let head = read_request_head(&mut input, &limits()).await.unwrap().unwrap();
        assert_eq!(keep_alive(&head, &Response::ok()), expected);
    }
}

#[tokio::test]
async fn test_forced_keep_alive_overrides_close() {
    let mut input: &[u8] = b"GET /k/ HTTP/1.1\r\nConnection: close\r\n\r\n";
    let head = read_request_head(&mut input, &limits()).await.unwrap().unwrap();

    let response = Response::not_found().with_forced_keep_alive();

    assert!(keep_alive(&head, &response));
}

#[tokio::test]
async fn test_expect_continue_detected() {
    let mut input: &[u8] = b"PUT /k/ HTTP/1.1\r\nExpect: 100-continue\r\nContent-Length: 1\r\n\r\n";

    let head = read_request_head(&mut input, &limits()).await.unwrap().unwrap();

    assert!(head.expects_continue());
}

// =============================================================================
// Response Encoding / Client Parsing Tests
// =============================================================================

#[test]
fn test_encode_get_response() {
    let response = Response::ok()
        .with_header("Content-Type", "text/plain; charset=utf-8")
        .with_body(&b"hello"[..]);

    let bytes = encode_response(&response, Version::Http11, true);

    assert_eq!(
        &bytes[..],
        &b"HTTP/1.1 200 OK\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: 5\r\n\r\nhello"[..]
    );
}

#[test]
fn test_encode_request() {
    let bytes = encode_request("PUT", b"/foo/x", b"hello");

    assert_eq!(
        bytes,
        b"PUT /foo/x HTTP/1.1\r\nHost: pear\r\nContent-Length: 5\r\n\r\nhello".to_vec()
    );
}

#[test]
fn test_read_response_from_encoded() {
    let response = Response::ok().with_body(&b"value"[..]);
    let encoded = encode_response(&response, Version::Http11, true);
    let mut reader = Cursor::new(encoded.to_vec());

    let parsed = read_response(&mut reader, &Limits::default()).unwrap();

    assert_eq!(parsed.status, Status::Ok);
    assert_eq!(&parsed.body[..], b"value");
    assert_eq!(parsed.header("content-length"), Some("5"));
}

#[test]
fn test_read_response_skips_continue() {
    let raw = b"HTTP/1.1 100 Continue\r\n\r\nHTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n";
    let mut reader = Cursor::new(raw.to_vec());

    let parsed = read_response(&mut reader, &Limits::default()).unwrap();

    assert_eq!(parsed.status, Status::NotFound);
    assert!(parsed.body.is_empty());
}

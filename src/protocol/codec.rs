//! Protocol codec
//!
//! Parsing and encoding of HTTP/1.x messages.
//!
//! The server side is async (runs inside a worker's event loop); the client
//! side is blocking and used by the CLI and tests.
//!
//! ## Body Framing (requests)
//! - `Transfer-Encoding: chunked` → hex-size chunks, extensions and trailers ignored
//! - `Content-Length: N`          → exactly N bytes
//! - neither                      → empty body
//!
//! Responses always carry `Content-Length`.

use std::io::{BufRead, Read, Write};

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::Config;
use crate::error::{PearError, Result};
use super::{Method, Request, RequestHead, Response, Status, Version};

/// Interim response sent when a client asks for `Expect: 100-continue`
pub const CONTINUE: &[u8] = b"HTTP/1.1 100 Continue\r\n\r\n";

/// Most body bytes reserved before any arrive
const BODY_PREALLOC: usize = 64 * 1024;

/// Size limits applied while parsing
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Longest request, status, header, or chunk-size line (bytes)
    pub max_line: usize,

    /// Most header (or trailer) lines per message
    pub max_headers: usize,

    /// Largest body (bytes)
    pub max_body: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for Limits {
    fn from(config: &Config) -> Self {
        Self {
            max_line: config.max_header_size,
            max_headers: config.max_headers,
            max_body: config.max_body_size,
        }
    }
}

fn protocol(msg: impl Into<String>) -> PearError {
    PearError::Protocol(msg.into())
}

fn unexpected_eof() -> PearError {
    PearError::Io(std::io::ErrorKind::UnexpectedEof.into())
}

/// Strip the trailing `\n` / `\r\n` from a raw line
///
/// Returns an error if the line was cut short by the length limit, or EOF if
/// the stream ended mid-line.
fn finish_line(mut line: Vec<u8>, max_line: usize) -> Result<Vec<u8>> {
    if line.last() != Some(&b'\n') {
        if line.len() >= max_line + 2 {
            return Err(protocol(format!("Line exceeds {} bytes", max_line)));
        }
        return Err(unexpected_eof());
    }
    line.pop();
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Ok(line)
}

// =============================================================================
// Line Parsers
// =============================================================================

fn parse_request_line(line: &[u8]) -> Result<(Method, Bytes, Version)> {
    let mut parts = line.split(|&b| b == b' ').filter(|p| !p.is_empty());

    let (Some(method), Some(target), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(protocol(format!(
            "Invalid request line: {:?}",
            String::from_utf8_lossy(line)
        )));
    };

    let version = Version::parse(version).ok_or_else(|| {
        protocol(format!(
            "Unsupported version: {:?}",
            String::from_utf8_lossy(version)
        ))
    })?;

    Ok((Method::parse(method), Bytes::copy_from_slice(target), version))
}

fn parse_header_line(line: &[u8]) -> Result<(String, String)> {
    let colon = line
        .iter()
        .position(|&b| b == b':')
        .ok_or_else(|| protocol("Header line without ':'"))?;

    let name = &line[..colon];
    if name.is_empty() || name.iter().any(|b| b.is_ascii_whitespace()) {
        return Err(protocol(format!(
            "Invalid header name: {:?}",
            String::from_utf8_lossy(name)
        )));
    }

    let value = String::from_utf8_lossy(&line[colon + 1..]).trim().to_string();
    Ok((String::from_utf8_lossy(name).into_owned(), value))
}

fn parse_status_line(line: &[u8]) -> Result<Status> {
    let text = String::from_utf8_lossy(line);
    let mut parts = text.splitn(3, ' ');

    let version = parts.next().unwrap_or_default();
    if Version::parse(version.as_bytes()).is_none() {
        return Err(protocol(format!("Invalid status line: {:?}", text)));
    }

    let code: u16 = parts
        .next()
        .and_then(|c| c.parse().ok())
        .ok_or_else(|| protocol(format!("Invalid status line: {:?}", text)))?;

    Status::from_code(code).ok_or_else(|| protocol(format!("Unknown status code: {}", code)))
}

fn parse_chunk_size(line: &[u8]) -> Result<usize> {
    let size = line.split(|&b| b == b';').next().unwrap_or_default();
    let size = String::from_utf8_lossy(size);
    usize::from_str_radix(size.trim(), 16)
        .map_err(|_| protocol(format!("Invalid chunk size: {:?}", size)))
}

/// How the body of a message is framed
enum Framing {
    Empty,
    Length(usize),
    Chunked,
}

fn body_framing(headers: &[(String, String)], limits: &Limits) -> Result<Framing> {
    let mut transfer_encoding = headers
        .iter()
        .filter(|(k, _)| k.eq_ignore_ascii_case("transfer-encoding"))
        .flat_map(|(_, v)| v.split(','))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .peekable();

    if transfer_encoding.peek().is_some() {
        return match transfer_encoding.last() {
            Some(last) if last.eq_ignore_ascii_case("chunked") => Ok(Framing::Chunked),
            _ => Err(protocol("Unsupported transfer encoding")),
        };
    }

    let mut length: Option<usize> = None;
    for (_, value) in headers
        .iter()
        .filter(|(k, _)| k.eq_ignore_ascii_case("content-length"))
    {
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(protocol(format!("Invalid Content-Length: {:?}", value)));
        }
        let parsed: usize = value
            .parse()
            .map_err(|_| protocol(format!("Invalid Content-Length: {:?}", value)))?;
        match length {
            Some(existing) if existing != parsed => {
                return Err(protocol("Conflicting Content-Length headers"));
            }
            _ => length = Some(parsed),
        }
    }

    match length {
        Some(len) if len > limits.max_body => Err(protocol(format!(
            "Body too large: {} bytes (max {})",
            len, limits.max_body
        ))),
        Some(len) => Ok(Framing::Length(len)),
        None => Ok(Framing::Empty),
    }
}

/// Check that the body announced by `head` is acceptable before reading it
///
/// Lets the server refuse a request before answering `Expect: 100-continue`.
pub fn check_framing(head: &RequestHead, limits: &Limits) -> Result<()> {
    body_framing(&head.headers, limits).map(|_| ())
}

fn grow_body(body: &BytesMut, chunk: usize, limits: &Limits) -> Result<usize> {
    body.len()
        .checked_add(chunk)
        .filter(|&total| total <= limits.max_body)
        .ok_or_else(|| protocol(format!("Body exceeds {} bytes", limits.max_body)))
}

// =============================================================================
// Server Side (async)
// =============================================================================

async fn read_line_async<R>(reader: &mut R, max_line: usize) -> Result<Option<Vec<u8>>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let n = (&mut *reader)
        .take(max_line as u64 + 2)
        .read_until(b'\n', &mut line)
        .await?;
    if n == 0 {
        return Ok(None);
    }
    finish_line(line, max_line).map(Some)
}

/// Append exactly `len` bytes to `body`, growing it only as data arrives
async fn read_exact_into<R>(reader: &mut R, len: usize, body: &mut BytesMut) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut remaining = len;
    while remaining > 0 {
        let n = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                return Err(unexpected_eof());
            }
            let n = available.len().min(remaining);
            body.extend_from_slice(&available[..n]);
            n
        };
        reader.consume(n);
        remaining -= n;
    }
    Ok(())
}

/// Read a request line and its headers
///
/// Returns `Ok(None)` if the stream ends cleanly before a new request starts.
/// Blank lines before the request line are skipped.
pub async fn read_request_head<R>(reader: &mut R, limits: &Limits) -> Result<Option<RequestHead>>
where
    R: AsyncBufRead + Unpin,
{
    let request_line = loop {
        match read_line_async(reader, limits.max_line).await? {
            None => return Ok(None),
            Some(line) if line.is_empty() => continue,
            Some(line) => break line,
        }
    };
    let (method, path, version) = parse_request_line(&request_line)?;

    let mut headers = Vec::new();
    loop {
        let line = read_line_async(reader, limits.max_line)
            .await?
            .ok_or_else(unexpected_eof)?;
        if line.is_empty() {
            break;
        }
        if headers.len() == limits.max_headers {
            return Err(protocol(format!("More than {} headers", limits.max_headers)));
        }
        headers.push(parse_header_line(&line)?);
    }

    Ok(Some(RequestHead {
        method,
        path,
        version,
        headers,
    }))
}

/// Read the body that follows `head`
pub async fn read_body<R>(reader: &mut R, head: &RequestHead, limits: &Limits) -> Result<Bytes>
where
    R: AsyncBufRead + Unpin,
{
    match body_framing(&head.headers, limits)? {
        Framing::Empty => Ok(Bytes::new()),
        Framing::Length(len) => {
            let mut body = BytesMut::with_capacity(len.min(BODY_PREALLOC));
            read_exact_into(reader, len, &mut body).await?;
            Ok(body.freeze())
        }
        Framing::Chunked => {
            let mut body = BytesMut::new();
            loop {
                let line = read_line_async(reader, limits.max_line)
                    .await?
                    .ok_or_else(unexpected_eof)?;
                let size = parse_chunk_size(&line)?;
                if size == 0 {
                    break;
                }

                grow_body(&body, size, limits)?;
                read_exact_into(reader, size, &mut body).await?;

                let terminator = read_line_async(reader, limits.max_line)
                    .await?
                    .ok_or_else(unexpected_eof)?;
                if !terminator.is_empty() {
                    return Err(protocol("Missing CRLF after chunk data"));
                }
            }

            // Trailers are read and dropped
            for _ in 0..=limits.max_headers {
                let line = read_line_async(reader, limits.max_line)
                    .await?
                    .ok_or_else(unexpected_eof)?;
                if line.is_empty() {
                    return Ok(body.freeze());
                }
            }
            Err(protocol(format!("More than {} trailers", limits.max_headers)))
        }
    }
}

/// Read a complete request (no `100 Continue` handling)
pub async fn read_request<R>(reader: &mut R, limits: &Limits) -> Result<Option<Request>>
where
    R: AsyncBufRead + Unpin,
{
    let Some(head) = read_request_head(reader, limits).await? else {
        return Ok(None);
    };
    let body = read_body(reader, &head, limits).await?;
    Ok(Some(Request::new(head, body)))
}

/// Decide whether the connection stays open after `response`
pub fn keep_alive(head: &RequestHead, response: &Response) -> bool {
    response.force_keep_alive || head.wants_keep_alive()
}

/// Encode a response to bytes
///
/// `version` is the request's version; it only affects the `Connection` header.
pub fn encode_response(response: &Response, version: Version, keep_alive: bool) -> BytesMut {
    let mut message = BytesMut::with_capacity(128 + response.body.len());

    message.put_slice(
        format!(
            "HTTP/1.1 {} {}\r\n",
            response.status.code(),
            response.status.reason()
        )
        .as_bytes(),
    );

    for (name, value) in &response.headers {
        if name.eq_ignore_ascii_case("content-length") || name.eq_ignore_ascii_case("connection") {
            continue;
        }
        message.put_slice(format!("{}: {}\r\n", name, value).as_bytes());
    }

    message.put_slice(format!("Content-Length: {}\r\n", response.body.len()).as_bytes());
    if !keep_alive {
        message.put_slice(b"Connection: close\r\n");
    } else if version == Version::Http10 {
        message.put_slice(b"Connection: keep-alive\r\n");
    }
    message.put_slice(b"\r\n");
    message.put_slice(&response.body);

    message
}

/// Write a response to a stream and flush it
pub async fn write_response<W>(
    writer: &mut W,
    response: &Response,
    version: Version,
    keep_alive: bool,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let bytes = encode_response(response, version, keep_alive);
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

// =============================================================================
// Client Side (blocking)
// =============================================================================

fn read_line_blocking<R: BufRead>(reader: &mut R, max_line: usize) -> Result<Option<Vec<u8>>> {
    let mut line = Vec::new();
    let n = reader
        .by_ref()
        .take(max_line as u64 + 2)
        .read_until(b'\n', &mut line)?;
    if n == 0 {
        return Ok(None);
    }
    finish_line(line, max_line).map(Some)
}

/// Encode a request with a `Content-Length` body
pub fn encode_request(method: &str, path: &[u8], body: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(64 + path.len() + body.len());
    message.extend_from_slice(method.as_bytes());
    message.push(b' ');
    message.extend_from_slice(path);
    message.extend_from_slice(b" HTTP/1.1\r\nHost: pear\r\n");
    message.extend_from_slice(format!("Content-Length: {}\r\n\r\n", body.len()).as_bytes());
    message.extend_from_slice(body);
    message
}

/// Write a request to a stream
pub fn write_request<W: Write>(writer: &mut W, method: &str, path: &[u8], body: &[u8]) -> Result<()> {
    let bytes = encode_request(method, path, body);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
///
/// Interim `100 Continue` responses are skipped. Parsed responses keep every
/// header they arrived with, including `Content-Length`.
pub fn read_response<R: BufRead>(reader: &mut R, limits: &Limits) -> Result<Response> {
    loop {
        let status_line = read_line_blocking(reader, limits.max_line)?.ok_or_else(unexpected_eof)?;
        let status = parse_status_line(&status_line)?;

        let mut headers = Vec::new();
        loop {
            let line = read_line_blocking(reader, limits.max_line)?.ok_or_else(unexpected_eof)?;
            if line.is_empty() {
                break;
            }
            if headers.len() == limits.max_headers {
                return Err(protocol(format!("More than {} headers", limits.max_headers)));
            }
            headers.push(parse_header_line(&line)?);
        }

        if status == Status::Continue {
            continue;
        }

        let body = match body_framing(&headers, limits)? {
            Framing::Empty => Bytes::new(),
            Framing::Length(len) => {
                let mut body = vec![0u8; len];
                reader.read_exact(&mut body)?;
                Bytes::from(body)
            }
            Framing::Chunked => {
                return Err(protocol("Chunked responses are not supported"));
            }
        };

        let mut response = Response::new(status).with_body(body);
        response.headers = headers;
        return Ok(response);
    }
}

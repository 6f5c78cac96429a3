//! Response definitions
//!
//! Represents responses to clients.

use bytes::Bytes;

/// Content type used for document bodies
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Status {
    Continue = 100,
    Ok = 200,
    BadRequest = 400,
    NotFound = 404,
    InternalServerError = 500,
}

impl Status {
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn reason(self) -> &'static str {
        match self {
            Status::Continue => "Continue",
            Status::Ok => "OK",
            Status::BadRequest => "Bad Request",
            Status::NotFound => "Not Found",
            Status::InternalServerError => "Internal Server Error",
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            100 => Some(Status::Continue),
            200 => Some(Status::Ok),
            400 => Some(Status::BadRequest),
            404 => Some(Status::NotFound),
            500 => Some(Status::InternalServerError),
            _ => None,
        }
    }
}

/// A response to send to a client
///
/// `Content-Length` and `Connection` are always written by the codec; entries
/// with those names in `headers` are skipped when encoding.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: Status,

    pub headers: Vec<(String, String)>,

    pub body: Bytes,

    /// Keep the connection open even if the request asked otherwise
    pub force_keep_alive: bool,
}

impl Response {
    /// Empty response with the given status
    pub fn new(status: Status) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Bytes::new(),
            force_keep_alive: false,
        }
    }

    /// 200 with an empty body
    pub fn ok() -> Self {
        Self::new(Status::Ok)
    }

    /// 400 with an empty body
    pub fn bad_request() -> Self {
        Self::new(Status::BadRequest)
    }

    /// 404 with an empty body
    pub fn not_found() -> Self {
        Self::new(Status::NotFound)
    }

    /// 500 with an empty body
    pub fn internal_error() -> Self {
        Self::new(Status::InternalServerError)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_forced_keep_alive(mut self) -> Self {
        self.force_keep_alive = true;
        self
    }

    /// First header with the given name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

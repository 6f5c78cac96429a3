//! Protocol Module
//!
//! The HTTP/1.x subset spoken between clients and the server.
//!
//! ## Request Format
//! ```text
//! PUT /{key}/anything HTTP/1.1\r\n
//! Content-Length: 5\r\n            (or Transfer-Encoding: chunked)
//! \r\n
//! hello
//! ```
//!
//! ## Response Format
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: text/plain; charset=utf-8\r\n
//! Content-Length: 5\r\n
//! \r\n
//! hello
//! ```
//!
//! ### Status Codes
//! - 200: OK (value in body for GET)
//! - 400: malformed path, unknown method, or protocol violation
//! - 404: key not found
//! - 500: storage failure (only when failures are not process-fatal)
//!
//! ### Persistence
//! HTTP/1.1 connections stay open unless the client sends `Connection: close`;
//! HTTP/1.0 connections close unless the client sends `Connection: keep-alive`.
//! A response may force the connection to stay open.

mod request;
mod response;
mod codec;

pub use request::{Method, Request, RequestHead, Version};
pub use response::{Response, Status, TEXT_PLAIN};
pub use codec::{
    Limits, CONTINUE,
    check_framing, read_request_head, read_body, read_request, keep_alive,
    encode_response, write_response,
    encode_request, write_request, read_response,
};

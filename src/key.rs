//! Key extraction
//!
//! A document key is the first path segment: the bytes after the leading `/`
//! up to (not including) the next `/`.
//!
//! ```text
//! /foo/         -> foo
//! /foo/bar/baz  -> foo
//! /foo          -> malformed (no second '/')
//! //x           -> malformed (empty key)
//! ```
//!
//! Bytes are taken verbatim: no percent-decoding, no case folding.

use crate::error::{PearError, Result};

/// Extract the document key from a request path
pub fn extract_key(path: &[u8]) -> Result<&[u8]> {
    let rest = path.strip_prefix(b"/").ok_or(PearError::MalformedPath)?;
    let end = rest
        .iter()
        .position(|&b| b == b'/')
        .ok_or(PearError::MalformedPath)?;

    if end == 0 {
        return Err(PearError::MalformedPath);
    }

    Ok(&rest[..end])
}

//! Method router
//!
//! Turns a parsed request into exactly one handler call.
//!
//! ## Routing
//! 1. Extract the key from the path; malformed → 400 before any handler runs
//! 2. PUT / GET / DELETE → matching handler
//! 3. Any other method → 400
//!
//! ## Storage Failures
//! Governed by [`StorageFailurePolicy`]:
//! - `Abort`: the process terminates immediately, taking every connection on
//!   every worker with it
//! - `Respond`: only the current request fails, with a 500

use std::sync::Arc;

use crate::config::StorageFailurePolicy;
use crate::error::PearError;
use crate::handler;
use crate::key::extract_key;
use crate::protocol::{Method, Request, Response};
use crate::storage::Store;

/// Dispatches requests to handlers
///
/// Shared by every worker; holds no per-request state.
pub struct Router {
    store: Arc<Store>,
    policy: StorageFailurePolicy,
}

impl Router {
    pub fn new(store: Arc<Store>, policy: StorageFailurePolicy) -> Self {
        Self { store, policy }
    }

    /// Produce the response for a request
    pub fn route(&self, request: &Request) -> Response {
        let key = match extract_key(request.path()) {
            Ok(key) => key,
            Err(_) => {
                tracing::trace!(
                    "Malformed path {:?}",
                    String::from_utf8_lossy(request.path())
                );
                return Response::bad_request();
            }
        };

        let result = match request.method() {
            Method::Put => handler::put(&self.store, key, &request.body),
            Method::Get => handler::get(&self.store, key),
            Method::Delete => handler::delete(&self.store, key),
            Method::Other(token) => {
                tracing::trace!("Unsupported method {}", token);
                return Response::bad_request();
            }
        };

        match result {
            Ok(response) => response,
            Err(e) => self.fail(request.method(), e),
        }
    }

    fn fail(&self, method: &Method, err: PearError) -> Response {
        if !err.is_storage_failure() {
            // Handlers only surface storage errors; anything else is a bad request
            tracing::warn!("{} failed: {}", method.as_str(), err);
            return Response::bad_request();
        }

        match self.policy {
            StorageFailurePolicy::Abort => {
                tracing::error!("{} hit a storage failure, aborting: {}", method.as_str(), err);
                std::process::abort();
            }
            StorageFailurePolicy::Respond => {
                tracing::error!("{} hit a storage failure: {}", method.as_str(), err);
                Response::internal_error()
            }
        }
    }
}

//! The transport seam between the auth layers and the network.

use std::future::Future;
use std::sync::Arc;

use crate::error::Result;
use crate::request::RequestBuilder;
use crate::response::Response;

/// Sends fully-formed requests and returns buffered responses.
///
/// Implementations must not turn HTTP error statuses into `Err`; only failures
/// to obtain a response at all (connect, timeout, body read) are errors.
pub trait HttpTransport: Send + Sync {
    /// Send a request.
    fn send(&self, request: RequestBuilder) -> impl Future<Output = Result<Response>> + Send;
}

impl<T: HttpTransport> HttpTransport for Arc<T> {
    fn send(&self, request: RequestBuilder) -> impl Future<Output = Result<Response>> + Send {
        (**self).send(request)
    }
}

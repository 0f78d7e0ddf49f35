//! Request handlers and the values they return.
//!
//! A handler comes in one of three shapes, chosen explicitly at
//! registration:
//!
//! - [`Handler::sync`] runs to completion on the event loop. A long
//!   computation here stalls every other connection until it returns.
//! - [`Handler::suspending`] returns a future; awaiting inside it yields the
//!   loop to other connections.
//! - [`Handler::offloaded`] runs a synchronous function on tokio's blocking
//!   pool so the loop stays free.

use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::parser::HttpRequest;
use crate::router::Params;
use crate::server::response::{HttpResponse, StatusCode};

/// Error type handlers may fail with. Its `Display` text becomes the 500 body.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// What a handler produces.
pub type HandlerResult = Result<Reply, BoxError>;

/// Type alias for a boxed future that returns a HandlerResult.
pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

type SyncFn = dyn Fn(&HttpRequest, &Params) -> HandlerResult + Send + Sync;
type SuspendingFn = dyn Fn(HttpRequest, Params) -> HandlerFuture + Send + Sync;

/// A handler return value before normalization into a response.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Sent verbatim.
    Response(HttpResponse),
    /// Sent as `200` with `Content-Type: text/html`.
    Text(String),
    /// Sent as `200` with `Content-Type: text/html`.
    Bytes(Vec<u8>),
}

impl Reply {
    /// Normalize into the response that goes on the wire.
    pub fn into_response(self) -> HttpResponse {
        match self {
            Reply::Response(response) => response,
            Reply::Text(text) => HttpResponse::new(StatusCode::OK)
                .with_content_type("text/html")
                .with_body_string(text),
            Reply::Bytes(bytes) => HttpResponse::new(StatusCode::OK)
                .with_content_type("text/html")
                .with_body_bytes(bytes),
        }
    }
}

impl From<HttpResponse> for Reply {
    fn from(response: HttpResponse) -> Self {
        Reply::Response(response)
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::Text(text)
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Reply::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Reply {
    fn from(bytes: Vec<u8>) -> Self {
        Reply::Bytes(bytes)
    }
}

impl From<&[u8]> for Reply {
    fn from(bytes: &[u8]) -> Self {
        Reply::Bytes(bytes.to_vec())
    }
}

/// A registered request handler.
#[derive(Clone)]
pub enum Handler {
    Sync(Arc<SyncFn>),
    Suspending(Arc<SuspendingFn>),
    Offloaded(Arc<SyncFn>),
}

impl Handler {
    /// A handler that runs on the event loop without yielding.
    pub fn sync<F, R>(f: F) -> Self
    where
        F: Fn(&HttpRequest, &Params) -> Result<R, BoxError> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        Handler::Sync(Arc::new(move |req: &HttpRequest, params: &Params| f(req, params).map(Into::<Reply>::into)))
    }

    /// A handler that may suspend at `.await` points.
    pub fn suspending<F, Fut, R>(f: F) -> Self
    where
        F: Fn(HttpRequest, Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, BoxError>> + Send + 'static,
        R: Into<Reply>,
    {
        Handler::Suspending(Arc::new(move |req: HttpRequest, params: Params| -> HandlerFuture {
            let fut = f(req, params);
            Box::pin(async move { fut.await.map(Into::<Reply>::into) })
        }))
    }

    /// A synchronous handler executed on the blocking thread pool.
    pub fn offloaded<F, R>(f: F) -> Self
    where
        F: Fn(&HttpRequest, &Params) -> Result<R, BoxError> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        Handler::Offloaded(Arc::new(move |req: &HttpRequest, params: &Params| f(req, params).map(Into::<Reply>::into)))
    }

    /// Invoke the handler. The returned future does no work until polled.
    pub fn call(&self, request: HttpRequest, params: Params) -> HandlerFuture {
        match self {
            Handler::Sync(f) => {
                let f = Arc::clone(f);
                Box::pin(async move { f(&request, &params) })
            }
            Handler::Suspending(f) => f(request, params),
            Handler::Offloaded(f) => {
                let f = Arc::clone(f);
                Box::pin(async move {
                    match tokio::task::spawn_blocking(move || f(&request, &params)).await {
                        Ok(result) => result,
                        Err(e) => match e.try_into_panic() {
                            Ok(payload) => Err(panic_message(&*payload).into()),
                            Err(e) => Err(Box::new(e) as BoxError),
                        },
                    }
                })
            }
        }
    }
}

/// Extract the message a panic was raised with.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}

//! HTTP server implementation for miniweb.
//!
//! A single-process server: one listener, one task per accepted connection,
//! exactly one request/response cycle per connection.

mod response;
mod config;
mod connection;
mod error;
mod handler;
mod http_server;

// Re-export public items
pub use response::{HttpResponse, StatusCode};
pub use config::{AppConfig, ServerConfig};
pub use connection::{dispatch, handle_connection, not_found_response, ConnectionOutcome};
pub use error::Error;
pub use handler::{BoxError, Handler, HandlerFuture, HandlerResult, Reply};
pub use http_server::HttpServer;

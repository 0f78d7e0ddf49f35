//! HTTP parser module.
//!
//! Turns the head of an HTTP/1.x request into an [`HttpRequest`]. Reading
//! the bytes off the wire and attaching the body is left to the server.

mod request;
mod method;
mod version;
mod error;
mod tests;

// Re-export public items
pub use request::{HttpRequest, HEADER_TERMINATOR};
pub use method::Method;
pub use version::HttpVersion;
pub use error::Error;

pub use request::{find_header_end, parse_request};

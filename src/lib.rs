//! A minimal single-process HTTP server and request router.
//!
//! Each accepted connection serves exactly one HTTP/1.1 request: the head is
//! parsed, the request is matched to a handler by method and path, the
//! handler runs, and its result is written back before the connection is
//! closed.
//!
//! # Features
//!
//! - Static routes matched by exact path, always preferred over dynamic ones
//! - Typed path placeholders: `<name>`, `<int:name>`, `<float:name>`, `<path:name>`
//! - Dynamic routes tried in registration order, first match wins
//! - Synchronous, suspending and offloaded handler shapes on one cooperative event loop
//! - Handler errors and panics contained per connection as `500` responses
//!
//! # Examples
//!
//! ## Routing
//!
//! ```
//! use miniweb::{MatchOutcome, Method, Router};
//!
//! let mut router = Router::new();
//! router.add_route(Method::GET, "/user/<int:id>", "show_user").unwrap();
//!
//! match router.match_route(&Method::GET, "/user/42") {
//!     MatchOutcome::Found { handler, params } => {
//!         assert_eq!(*handler, "show_user");
//!         assert_eq!(params.get_int("id"), Some(42));
//!     }
//!     MatchOutcome::NotFound { .. } => unreachable!(),
//! }
//! ```
//!
//! ## Parsing
//!
//! ```
//! use miniweb::{parse_request, Method};
//!
//! let request = parse_request(b"GET /user/7 HTTP/1.1\r\nHost: x\r\n\r\n").unwrap();
//! assert_eq!(request.method, Method::GET);
//! assert_eq!(request.path, "/user/7");
//! assert_eq!(request.get_header("host").unwrap(), "x");
//! assert!(request.body.is_empty());
//! ```
//!
//! ## Serving
//!
//! ```no_run
//! use miniweb::{BoxError, Handler, HttpServer, ServerConfig};
//!
//! let mut server = HttpServer::new(ServerConfig::default());
//! server.register("GET", "/", Handler::sync(|_req, _params| Ok("<h1>Hello</h1>"))).unwrap();
//! server.register("GET", "/user/<int:id>", Handler::sync(|_req, params| {
//!     Ok(format!("user {}", params.get_int("id").unwrap_or_default()))
//! })).unwrap();
//! server.register("GET", "/slow", Handler::suspending(|_req, _params| async {
//!     tokio::time::sleep(std::time::Duration::from_secs(1)).await;
//!     Ok::<_, BoxError>("done")
//! })).unwrap();
//!
//! server.run("127.0.0.1", 8000).unwrap();
//! ```

pub mod parser;
pub mod router;
pub mod server;
pub mod store;
pub mod templates;

// Re-export commonly used items for convenience
pub use parser::{Error as ParserError, HttpRequest, HttpVersion, Method, parse_request};
pub use router::{ConversionError, MatchOutcome, ParamKind, ParamValue, Params, PathPattern, RouteError, Router};
pub use server::{
    AppConfig, BoxError, ConnectionOutcome, Error as ServerError, Handler, HttpResponse, HttpServer, Reply,
    ServerConfig, StatusCode,
};
pub use store::{MemoryRepository, Repository};
pub use templates::{TemplateError, Templates};

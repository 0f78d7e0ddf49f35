//! One request/response cycle on one connection.
//!
//! The cycle reads until the header terminator, parses the head, reads a
//! `Content-Length` body if one is declared, dispatches through the router,
//! writes the response and shuts the stream down. There is no keep-alive and
//! no read timeout.

use log::{debug, error};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::AbortHandle;

use crate::parser::{find_header_end, parse_request, HttpRequest, HEADER_TERMINATOR};
use crate::router::{MatchOutcome, Router};
use crate::server::error::Error;
use crate::server::handler::{panic_message, BoxError, Handler};
use crate::server::response::{HttpResponse, StatusCode};
use crate::templates::TemplateError;

/// How a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionOutcome {
    /// A response with this status was written.
    Responded(StatusCode),
    /// The peer closed early or sent an unparseable head; nothing was written.
    Dropped,
}

/// Serve exactly one request on `socket`.
///
/// Malformed or truncated input yields [`ConnectionOutcome::Dropped`];
/// only I/O failures are returned as errors.
pub async fn handle_connection<S>(
    socket: &mut S,
    router: &Router<Handler>,
    read_buffer_size: usize,
) -> Result<ConnectionOutcome, Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = match read_request(socket, read_buffer_size).await? {
        Some(request) => request,
        None => return Ok(ConnectionOutcome::Dropped),
    };

    let method = request.method.clone();
    let path = request.path.clone();

    let response = dispatch(router, request).await;

    socket.write_all(&response.to_bytes()).await?;
    socket.flush().await?;
    // The peer may already be gone; the stream is dropped either way.
    let _ = socket.shutdown().await;

    debug!("{method} {path} -> {status}", status = response.status);
    Ok(ConnectionOutcome::Responded(response.status))
}

/// Read one request off the stream, or `None` if it has to be dropped.
async fn read_request<S>(socket: &mut S, read_buffer_size: usize) -> Result<Option<HttpRequest>, Error>
where
    S: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(read_buffer_size);
    let mut chunk = vec![0; read_buffer_size.max(1)];

    // Awaiting headers
    let head_end = loop {
        let searched = buf.len().saturating_sub(HEADER_TERMINATOR.len() - 1);
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = find_header_end(&buf[searched..]) {
            break searched + end;
        }
    };

    // Headers received
    let request = match parse_request(&buf[..head_end]) {
        Ok(request) => request,
        Err(_) => return Ok(None),
    };

    // Awaiting body
    let length = match request.content_length() {
        Ok(length) => length.unwrap_or(0),
        Err(_) => return Ok(None),
    };
    let mut body = buf.split_off(head_end);
    while body.len() < length {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(length);

    Ok(Some(request.with_body(body)))
}

/// Route a request and run its handler, turning every failure into a response.
///
/// The handler runs in its own task so that a panic is contained and
/// reported like any other handler error. Dropping the returned future
/// aborts that task.
pub async fn dispatch(router: &Router<Handler>, request: HttpRequest) -> HttpResponse {
    let path = request.route_path().to_string();

    let future = match router.match_route(&request.method, &path) {
        MatchOutcome::Found { handler, params } => handler.call(request, params),
        MatchOutcome::NotFound { method, path } => {
            debug!("No route for {method} {path}");
            return not_found_response();
        }
    };

    let handle = tokio::spawn(future);
    let _abort = AbortOnDrop(handle.abort_handle());

    match handle.await {
        Ok(Ok(reply)) => reply.into_response(),
        Ok(Err(e)) => error_response(e),
        Err(e) if e.is_panic() => {
            let message = panic_message(&*e.into_panic());
            error!("Handler panicked on {path}: {message}");
            HttpResponse::text(StatusCode::INTERNAL_SERVER_ERROR, message)
        }
        Err(e) => error_response(Box::new(e)),
    }
}

/// Aborts a spawned handler when the connection serving it goes away.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// The built-in response when nothing matches.
pub fn not_found_response() -> HttpResponse {
    HttpResponse::text(StatusCode::NOT_FOUND, "404 Not Found")
}

fn error_response(err: BoxError) -> HttpResponse {
    if let Some(TemplateError::NotFound(name)) = err.downcast_ref::<TemplateError>() {
        debug!("Template {name} not found, serving 404");
        return not_found_response();
    }

    error!("Handler error: {err}");
    HttpResponse::text(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

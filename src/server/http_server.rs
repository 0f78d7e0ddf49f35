//! HTTP server implementation.

use std::future::Future;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::signal;
use log::{info, warn, error, debug};

use crate::parser::{find_header_end, Method};
use crate::router::Router;
use crate::server::config::ServerConfig;
use crate::server::connection::{handle_connection, ConnectionOutcome};
use crate::server::error::Error;
use crate::server::handler::Handler;
use crate::server::response::{HttpResponse, StatusCode};

/// How long an over-limit connection gets to finish sending its request head.
const REJECT_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// An HTTP server.
///
/// Routes are registered up front through `&mut self`; serving consumes the
/// server and shares the finished route table read-only between connections.
pub struct HttpServer {
    /// The server configuration.
    pub config: ServerConfig,
    router: Router<Handler>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            router: Router::new(),
        }
    }

    /// Register a handler for a method and path template.
    ///
    /// The method name is case-insensitive.
    pub fn register(&mut self, method: &str, path: &str, handler: Handler) -> Result<(), Error> {
        let method = Method::from_str(method)?;
        self.router.add_route(method, path, handler)?;
        Ok(())
    }

    /// Register the handler used when no route matches.
    pub fn set_not_found_handler(&mut self, handler: Handler) {
        self.router.set_404(handler);
    }

    /// The route table built so far.
    pub fn router(&self) -> &Router<Handler> {
        &self.router
    }

    /// Bind `host:port` and serve on a single-threaded event loop until Ctrl+C.
    ///
    /// Every connection is a task on that one loop, so a handler that blocks
    /// without yielding holds up all other connections.
    pub fn run(mut self, host: &str, port: u16) -> Result<(), Error> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        runtime.block_on(async move {
            let addr = format!("{host}:{port}");
            let listener = TcpListener::bind((host, port))
                .await
                .map_err(|source| Error::BindError { addr, source })?;
            if let Ok(local) = listener.local_addr() {
                self.config.addr = local;
            }
            self.serve(listener, ctrl_c()).await
        })
    }

    /// Bind the configured address and serve until Ctrl+C.
    ///
    /// Must be awaited on a current-thread runtime. On a multi-thread runtime
    /// a [`Handler::sync`] no longer stalls other connections; [`run`](Self::run)
    /// builds the right runtime itself.
    pub async fn start(self) -> Result<(), Error> {
        let listener = self.setup_listener().await?;
        self.serve(listener, ctrl_c()).await
    }

    /// Set up the TCP listener.
    async fn setup_listener(&self) -> Result<TcpListener, Error> {
        TcpListener::bind(&self.config.addr)
            .await
            .map_err(|source| Error::BindError {
                addr: self.config.addr.to_string(),
                source,
            })
    }

    /// Display the registered endpoints.
    fn display_server_info(&self, listener: &TcpListener) {
        match listener.local_addr() {
            Ok(addr) => info!("* Running on http://{addr}"),
            Err(e) => warn!("Listening on an unknown address: {e}"),
        }

        info!("Registered endpoints:");
        for (method, path) in self.router.endpoints() {
            info!("  {method} {path}");
        }
        if self.router.has_404() {
            info!("  custom 404 handler");
        }
    }

    /// Accept connections on `listener` until `shutdown` resolves, then wait
    /// for in-flight connections to finish.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        self.display_server_info(&listener);
        if !runs_on_current_thread() {
            warn!("Serving on a multi-thread runtime: sync handlers will not block the event loop");
        }

        let HttpServer { config, router } = self;
        let router = Arc::new(router);

        // Create a semaphore to limit concurrent connections
        let semaphore = Arc::new(Semaphore::new(config.max_connections));

        // Use JoinSet to keep track of all spawned tasks
        let mut tasks = JoinSet::new();

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down server...");
                    break;
                }

                Some(res) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = res {
                        error!("Connection task failed: {e}");
                    }
                }

                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((socket, addr)) => {
                            Self::handle_new_connection(
                                socket,
                                addr,
                                semaphore.clone(),
                                router.clone(),
                                config.read_buffer_size,
                                &mut tasks,
                            );
                        }
                        Err(e) => Self::handle_accept_error(e).await,
                    }
                }
            }
        }

        Self::perform_shutdown(&mut tasks).await;

        Ok(())
    }

    /// Handle a new connection.
    fn handle_new_connection(
        mut socket: TcpStream,
        addr: SocketAddr,
        semaphore: Arc<Semaphore>,
        router: Arc<Router<Handler>>,
        read_buffer_size: usize,
        tasks: &mut JoinSet<()>,
    ) {
        // Try to acquire a permit from the semaphore
        let permit = match semaphore.try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!("Connection limit reached, rejecting connection from {addr}");
                tasks.spawn(reject_connection(socket, addr, read_buffer_size));
                return;
            }
        };

        tasks.spawn(async move {
            // The permit is dropped when the task completes, releasing the semaphore slot
            let _permit = permit;

            match handle_connection(&mut socket, &router, read_buffer_size).await {
                Ok(ConnectionOutcome::Responded(_)) | Ok(ConnectionOutcome::Dropped) => {}
                Err(e) => debug!("Connection from {addr} failed: {e}"),
            }
        });
    }

    /// Log an accept failure and back off briefly. Accept errors never stop the server.
    async fn handle_accept_error(e: std::io::Error) {
        error!("Error accepting connection: {e}");
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    /// Perform graceful shutdown.
    async fn perform_shutdown(tasks: &mut JoinSet<()>) {
        info!("Waiting for {len} active connections to complete...", len = tasks.len());
        let shutdown_timeout = Duration::from_secs(30);
        let _ = tokio::time::timeout(shutdown_timeout, async {
            while let Some(res) = tasks.join_next().await {
                if let Err(e) = res {
                    error!("Task failed during shutdown: {e}");
                }
            }
        }).await;

        info!("Server shutdown complete");
    }
}

/// Answer an over-limit connection with 503.
///
/// The request head is read first: closing a socket with unread input makes
/// the kernel reset the connection and the client never sees the response.
async fn reject_connection(mut socket: TcpStream, addr: SocketAddr, read_buffer_size: usize) {
    let mut buf = Vec::new();
    let mut chunk = vec![0; read_buffer_size.max(1)];

    let drained = tokio::time::timeout(REJECT_DRAIN_TIMEOUT, async {
        loop {
            match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    buf.extend_from_slice(&chunk[..n]);
                    if find_header_end(&buf).is_some() {
                        break;
                    }
                }
            }
        }
    })
    .await;
    if drained.is_err() {
        debug!("No request head from {addr} before rejecting");
    }

    let response = HttpResponse::text(
        StatusCode::SERVICE_UNAVAILABLE,
        "Server is at capacity, please try again later",
    );
    if let Err(e) = socket.write_all(&response.to_bytes()).await {
        debug!("Failed to send 503 to {addr}: {e}");
        return;
    }
    if let Err(e) = socket.shutdown().await {
        debug!("Failed to close rejected connection from {addr}: {e}");
    }
}

/// Whether the current task runs on a single-threaded runtime.
pub(crate) fn runs_on_current_thread() -> bool {
    matches!(
        tokio::runtime::Handle::current().runtime_flavor(),
        tokio::runtime::RuntimeFlavor::CurrentThread
    )
}

/// Resolves on Ctrl+C. If the signal handler cannot be installed the server
/// keeps running.
async fn ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown"),
        Err(e) => {
            error!("Error setting up Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    }
}

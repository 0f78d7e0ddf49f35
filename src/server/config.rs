//! Server and application configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::{ArgAction, Parser};

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address to bind to.
    pub addr: SocketAddr,
    /// The maximum number of concurrent connections.
    pub max_connections: usize,
    /// How many bytes to request from the socket per read.
    pub read_buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8000)),
            max_connections: 1024,
            read_buffer_size: 8192,
        }
    }
}

/// Settings for an application built on the server, read from the command line.
#[derive(Debug, Clone, Parser)]
#[command(name = "miniweb", about = "Run the minimal web framework demo")]
pub struct AppConfig {
    /// Hostname or IP to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind
    #[arg(long, default_value_t = 8000)]
    pub port: u16,

    /// Path of the application database
    #[arg(long = "db", default_value = "app.db")]
    pub db_path: PathBuf,

    /// Disable the template engine
    #[arg(long = "no-templates", action = ArgAction::SetFalse)]
    pub templates_enabled: bool,

    /// Enable debug mode
    #[arg(long)]
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            db_path: PathBuf::from("app.db"),
            templates_enabled: true,
            debug: false,
        }
    }
}

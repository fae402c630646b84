//! Process-wide configuration, read once at startup from flags or the environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;

/// The issuer tag embedded in session tokens when none is configured.
pub const DEFAULT_ISSUER: &str = "Awesome API v3";

/// The REST API server for tracking personal transactions.
///
/// Every option can also be set with the environment variable named next to it.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct AppConfig {
    /// File path to the application SQLite database.
    #[arg(long, env = "DATABASE_PATH")]
    pub db_path: String,

    /// The secret used to sign session tokens.
    #[arg(long, env = "TOKEN_KEY", hide_env_values = true)]
    pub token_secret: String,

    /// The issuer tag embedded in, and required of, session tokens.
    #[arg(long, env = "TOKEN_ISSUER", default_value = DEFAULT_ISSUER)]
    pub issuer: String,

    /// The address to serve the API from.
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// The bcrypt cost used when hashing passwords.
    #[arg(long, env = "PASSWORD_COST", default_value_t = crate::PasswordHash::DEFAULT_COST,
          value_parser = clap::value_parser!(u32).range(4..=31))]
    pub password_cost: u32,

    /// File that receives debug level logs.
    #[arg(long, env = "LOG_PATH", default_value = "debug.log")]
    pub log_path: String,
}

impl AppConfig {
    /// The socket address the server should listen on.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

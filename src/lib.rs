// Module definitions
pub mod core;
pub mod ingest;
pub mod server;
pub mod stats;

// Essential re-exports
pub use crate::core::config::Config;
pub use crate::core::error::{AppError, Result};

/// Main entry point: load configuration and run the server.
pub async fn run() -> Result<()> {
    let config = Config::load()?;
    server::run(config).await
}

//! Entry point for the Pricing Engine binary.
//!
//! Running this binary starts an HTTP server that exposes the pricing
//! calculator.  Configuration is read from the environment (see
//! [`pricing_engine::config`]); a `.env` file in the working directory
//! is loaded first if present.  Log verbosity follows `RUST_LOG` and
//! defaults to `info`.

use pricing_engine::config::AppConfig;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = pricing_engine::api::serve(config).await {
        tracing::error!(error = ?err, "server stopped");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

//! `netkeep serve` -- run the API server.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use netkeep_core::MemoryStore;
use netkeep_server::AppState;

use crate::cli::{GlobalOpts, ServeArgs};
use crate::error::CliError;

pub async fn handle(args: ServeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = netkeep_config::load(args.config.as_deref())?;
    init_tracing(&config, global.verbose);

    let listen = args.listen.unwrap_or_else(|| config.listen.clone());

    let store = Arc::new(MemoryStore::new());
    let site = store
        .ensure_site(&config.site.slug, &config.site.name)
        .map_err(|err| CliError::Startup {
            message: err.to_string(),
        })?;
    info!(site = %site.slug, "active site ready");

    let state = Arc::new(AppState::new(store));
    netkeep_server::serve(&listen, state).await.map_err(CliError::Io)
}

/// Config-driven logging; `-v` flags and `RUST_LOG` take precedence
/// over the configured filter.
fn init_tracing(config: &netkeep_config::Config, verbosity: u8) {
    let filter = match verbosity {
        0 => config.log.filter.clone(),
        1 => "netkeep=debug,tower_http=info".to_owned(),
        _ => "trace".to_owned(),
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if config.log.format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }
}

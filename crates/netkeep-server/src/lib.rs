// netkeep-server: HTTP surface over the netkeep-core inventory engine.

pub mod dto;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;

use std::io;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

/// Bind and serve the API until the process is stopped.
pub async fn serve(listen: &str, state: Arc<AppState>) -> io::Result<()> {
    let app = build_router(state);
    let listener = TcpListener::bind(listen).await?;
    info!(addr = %listener.local_addr()?, "netkeep API listening");
    axum::serve(listener, app).await
}

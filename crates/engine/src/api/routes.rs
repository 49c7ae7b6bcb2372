use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

use super::handlers;
use super::ApiState;

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/ready", get(handlers::ready))
        .route("/correlations", get(handlers::correlations))
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
}

pub async fn serve(listener: TcpListener, state: ApiState) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}

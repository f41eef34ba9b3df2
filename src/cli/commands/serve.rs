use std::sync::Arc;

use crate::content_api::ContentApi;
use crate::handlers;

pub async fn handle(api: ContentApi, port: u16) -> anyhow::Result<()> {
    let app = handlers::router(Arc::new(api));

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("content-guard listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

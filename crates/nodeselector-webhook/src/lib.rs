pub mod admission_review;
mod api;
mod certs;
pub mod cli;
pub mod config;
pub mod mutation;
pub mod tracing;

use ::tracing::info;
use anyhow::{anyhow, Result};
use axum::{
    routing::{get, post},
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use api::{
    handlers::{mutate_handler, readiness_handler, root_handler},
    state::ApiServerState,
};
use config::{Config, SERVICE_NAME};
use mutation::Mutator;

/// Time allowed to read a request and produce its response.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Upper bound of the HTTP/1 read buffer, this caps the size of the request headers.
pub const MAX_HEADER_BYTES: usize = 1 << 20;

pub struct WebhookServer {
    router: Router,
    addr: SocketAddr,
    tls_config: RustlsConfig,
}

impl WebhookServer {
    pub async fn new_from_config(config: Config) -> Result<Self> {
        let tls_config = certs::create_tls_config(&config.tls_config).await?;

        let mutator = Mutator::new(Arc::new(config.mutate_options), config.verbose);
        let router = router(mutator);

        Ok(Self {
            router,
            addr: config.addr,
            tls_config,
        })
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn run(self) -> Result<()> {
        let mut server = axum_server::bind_rustls(self.addr, self.tls_config);
        server.http_builder().http1().max_buf_size(MAX_HEADER_BYTES);

        info!(
            service = SERVICE_NAME,
            address = self.addr.to_string().as_str(),
            "started HTTPS server"
        );
        server
            .serve(self.router.into_make_service())
            .await
            .map_err(|e| anyhow!("HTTPS server error: {e}"))
    }
}

/// Build the routes served by the webhook.
pub fn router(mutator: Mutator) -> Router {
    let state = Arc::new(ApiServerState { mutator });

    Router::new()
        .route("/mutate", post(mutate_handler))
        .route("/readiness", get(readiness_handler))
        .fallback(root_handler)
        .with_state(state)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
}

//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with the batch endpoint and optional relay
//!   fallback
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Serve plain or TLS, with graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::routing::post;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::batch::batch_handler;
use crate::http::relay::relay_handler;
use crate::lifecycle::ShutdownListener;
use crate::security::HostAllowlist;
use crate::upstream::UpstreamChannel;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub channel: Arc<UpstreamChannel>,
    pub allowlist: Arc<HostAllowlist>,
}

/// HTTP server for the batch gateway.
pub struct HttpServer {
    router: Router,
    config: Arc<GatewayConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let channel = Arc::new(UpstreamChannel::new(&config.upstream)?);
        let allowlist = Arc::new(HostAllowlist::new(&config.relay.allowed_hosts));
        let config = Arc::new(config);

        let state = AppState {
            config: Arc::clone(&config),
            channel,
            allowlist,
        };
        let router = Self::build_router(&config, state);

        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let mut router = Router::new().route("/batch", post(batch_handler));
        if config.relay.enabled {
            router = router.fallback(relay_handler);
        }

        router
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener until
    /// shutdown is triggered.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownListener,
    ) -> Result<(), GatewayError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        match self.config.listener.tls.clone() {
            None => {
                axum::serve(listener, self.router.into_make_service())
                    .with_graceful_shutdown(shutdown.wait())
                    .await?;
            }
            Some(tls) => {
                let rustls = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path).await?;
                let handle = axum_server::Handle::new();
                let drainer = handle.clone();
                tokio::spawn(async move {
                    shutdown.wait().await;
                    drainer.graceful_shutdown(Some(Duration::from_secs(10)));
                });

                axum_server::from_tcp_rustls(listener.into_std()?, rustls)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await?;
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

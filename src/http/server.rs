//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with one route per single-file entry
//! - Mount the prefix-mapped file server as the fallback
//! - Wrap each file handler in its Cache-Control layer
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener and shut down on Ctrl+C

use std::future::Future;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::caching::{self, CacheControlLayer};
use crate::config::{validate_config, AppConfig, CacheConfig, ConfigError};
use crate::file::{BaseDir, ContentServer, FileServer, ServeConfig};

/// HTTP server for static files.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    /// Create a new HTTP server; relative paths in `config` resolve against `base`.
    ///
    /// The config is validated first, so route registration cannot fail.
    pub fn new(config: AppConfig, base: &BaseDir) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        let router = Self::build_router(&config, base);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, base: &BaseDir) -> Router {
        let shared = config.static_files.to_options();
        let mut router = Router::new();

        for file in &config.files {
            let serve_config = ServeConfig::from_options(&[shared.clone(), file.to_options()], base);
            let service = ServiceBuilder::new()
                .layer(cache_layer(file.cache.as_ref()))
                .service(ContentServer::new(&file.path, serve_config));
            tracing::info!(route = %file.route, path = %file.path.display(), "Mounted file route");
            router = router.route_service(&file.route, service);
        }

        let path_map: Vec<(String, String)> = if config.paths.is_empty() {
            vec![("/".to_string(), "/".to_string())]
        } else {
            config
                .paths
                .iter()
                .map(|(prefix, dir)| (prefix.clone(), dir.clone()))
                .collect()
        };
        let files = FileServer::new(path_map, ServeConfig::from_options(&[shared], base));
        tracing::info!(root = %files.config().root().display(), "Mounted file server");

        router
            .fallback_service(
                ServiceBuilder::new()
                    .layer(cache_layer(config.cache.as_ref()))
                    .service(files),
            )
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server until Ctrl+C.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.run_until(listener, shutdown_signal()).await
    }

    /// Run the server until `shutdown` resolves, then drain in-flight requests.
    pub async fn run_until<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The assembled router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

fn cache_layer(cache: Option<&CacheConfig>) -> CacheControlLayer {
    caching::layer(&cache.map(CacheConfig::to_options).unwrap_or_default())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    }
}

use std::sync::Arc;
use std::time::Duration;
use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use axum::{BoxError, Router};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use sq_system::features::FeatureFlags;
use sq_system::{StoryQuestSystem, SystemHandle};
use crate::api::AppState;
use crate::config::{Config, SharedConfig};

pub struct Application {
    pub tcp: TcpListener,
    pub config: SharedConfig,
    pub system: SystemHandle,
}

impl Application {
    #[tracing::instrument(name = "Create application", skip(config), fields(addr = config.app.host, port = config.app.port))]
    pub async fn new(config: Config) -> eyre::Result<Self> {
        let tcp = TcpListener::bind(config.app.bind_address()).await?;
        let config = Arc::new(config);

        let features = FeatureFlags::from_env();
        tracing::debug!(flags = ?features.all_flags(), "Loaded feature flags");

        let system = StoryQuestSystem::from_config(&config.system(), features).await?;

        Ok(Application {
            tcp,
            config,
            system: Arc::new(system),
        })
    }

    /// Start running the Axum server, consuming `Application`.
    /// The future completes when the Tokio-Runtime has been shut down (due to f.e a SIGINT).
    ///
    /// # Arguments
    ///
    /// * `quitter` - A way to inform the spawned runtime to shut down. Especially useful for tests
    /// where we won't provide a signal for shutdown.
    pub async fn run(self, quitter: Arc<tokio::sync::Notify>) -> eyre::Result<()> {
        tracing::info!("Setup complete, starting server...");

        let app = construct_server(&self.config, self.system.clone());

        tracing::info!("Listening on {:?}", self.tcp.local_addr()?);

        let server = axum::serve(self.tcp, app.into_make_service());

        let result = tokio::select! {
            _ = quitter.notified() => Ok(()),
            res = tokio::signal::ctrl_c() => {
                tracing::trace!("Received CTRL-C notification, exiting...");
                // Should notify all dependant sub-processes.
                quitter.notify_waiters();
                res.map_err(|e| eyre::eyre!(e))
            },
            res = server => res.map_err(|e| eyre::eyre!(e))
        };

        self.system.shutdown().await?;

        result
    }

    pub fn port(&self) -> &TcpListener {
        &self.tcp
    }
}

/// Build the full router, including all middleware.
pub fn construct_server(config: &Config, system: SystemHandle) -> Router {
    let api = crate::api::config(&system.features);
    let state = AppState::new(system);

    let app_layers = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new().br(true).gzip(true).deflate(true))
        .layer(CorsLayer::permissive());

    let app = api.layer(app_layers).with_state(state);

    apply_security_middleware(app, config.app.request_timeout())
}

fn apply_security_middleware(router: Router, request_timeout: Duration) -> Router {
    let security = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(generic_error_handler))
        .load_shed()
        .concurrency_limit(512)
        .layer(tower_http::timeout::TimeoutLayer::new(request_timeout));

    router.layer(security)
}

async fn generic_error_handler(error: BoxError) -> impl axum::response::IntoResponse {
    tracing::trace!(?error, "Error occurred in normal response handler");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Error")
}

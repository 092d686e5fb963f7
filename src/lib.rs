pub mod configuration;
pub mod domain;
pub mod email_client;
pub mod emails;
mod error;
pub mod metrics;
mod routes;
mod state;
pub mod telemetry;

use anyhow::Context;
use axum::{body::Body, Router, Server};
use configuration::Settings;
use email_client::EmailClient;
use http::Request;
use state::AppState;
use std::net::TcpListener;

#[derive(Debug)]
pub struct App {
    listener: TcpListener,
    router: Router,
}

impl App {
    /// Build the app from the configuration: bind the listener and construct
    /// every dependency the handlers need.
    pub fn build(config: Settings) -> anyhow::Result<Self> {
        let email_client = EmailClient::try_from(&config.email_client)?;
        let admin_recipient = config
            .waitlist
            .admin_recipient()
            .map_err(anyhow::Error::msg)
            .context("Waitlist admin email is invalid")?;
        let metrics = metrics::Metrics::new()?;

        let app_state = AppState::create(
            email_client,
            admin_recipient,
            config.waitlist.testflight_url,
            metrics,
        );

        let listener = TcpListener::bind(config.application.address())
            .with_context(|| format!("Failed to bind {}", config.application.address()))?;

        Ok(Self {
            listener,
            router: Self::build_router(app_state),
        })
    }

    /// The port the app is listening on.
    pub fn port(&self) -> std::io::Result<u16> {
        self.listener.local_addr().map(|addr| addr.port())
    }

    /// Serve the app until the process receives Ctrl-C.
    pub async fn run_until_stopped(self) -> anyhow::Result<()> {
        tracing::info!("Server running at {}", self.listener.local_addr()?);

        Server::from_tcp(self.listener)?
            .serve(self.router.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server stopped");
        Ok(())
    }

    /// Build the router for the application.
    fn build_router(app_state: AppState) -> Router {
        use tower::ServiceBuilder;
        use tower_http::{
            request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
            trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
        };
        use tracing::Level;

        routes::build_router(app_state).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|request: &Request<Body>| {
                            let request_id = request
                                .headers()
                                .get("x-request-id")
                                .and_then(|id| id.to_str().ok())
                                .unwrap_or_default();
                            tracing::info_span!(
                                "HTTP request",
                                method = %request.method(),
                                uri = %request.uri(),
                                request_id = %request_id,
                            )
                        })
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for the shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

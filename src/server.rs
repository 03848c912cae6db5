//! Wiring: build collaborators from config and assemble the HTTP app.

use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::checkout::HttpCheckoutClient;
use crate::config::OnboardingConfig;
use crate::error::Result;
use crate::onboarding::{OnboardingManager, OnboardingRouteState, SessionDeps, onboarding_routes};
use crate::store::{FirestoreProfileStore, MemoryProfileStore, ProfileStore};

/// Build the store and billing client named by `config`.
pub fn build_deps(config: &OnboardingConfig) -> SessionDeps {
    let store: Arc<dyn ProfileStore> = match &config.firestore {
        Some(fs) => {
            info!(project = %fs.project_id, "Using Firestore profile store");
            Arc::new(FirestoreProfileStore::new(fs))
        }
        None => {
            info!("Using in-memory profile store");
            Arc::new(MemoryProfileStore::new())
        }
    };
    SessionDeps {
        store,
        checkout: Arc::new(HttpCheckoutClient::new(&config.subscription_base_url)),
    }
}

/// The full router: onboarding routes plus CORS and request tracing.
pub fn app(deps: SessionDeps) -> Router {
    let manager = Arc::new(OnboardingManager::new(deps));
    onboarding_routes(OnboardingRouteState { manager }).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
}

/// Load config from the environment and serve until the listener fails.
pub async fn run() -> Result<()> {
    let config = OnboardingConfig::from_env()?;

    eprintln!("Onboarding form v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Subscriptions: {}", config.subscription_base_url);
    eprintln!(
        "   Profile store: {}",
        config
            .firestore
            .as_ref()
            .map(|fs| format!("firestore ({})", fs.project_id))
            .unwrap_or_else(|| "memory".to_string())
    );
    eprintln!("   API: http://0.0.0.0:{}/api/onboarding/sessions\n", config.port);

    let router = app(build_deps(&config));
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    info!(port = config.port, "Onboarding server started");
    axum::serve(listener, router).await?;
    Ok(())
}

use onboarding_form::error::{ConfigError, Error};
use onboarding_form::server;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    if let Err(e) = server::run().await {
        eprintln!("Error: {e}");
        if let Error::Config(ConfigError::MissingEnvVar(_)) = e {
            eprintln!("  export SUBSCRIPTION_BASE_URL=https://subscriptions.example.com");
        }
        std::process::exit(1);
    }
}

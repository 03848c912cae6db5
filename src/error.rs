//! Error types for the onboarding form.

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Document-store write failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Permission denied writing {collection}/{id}")]
    PermissionDenied { collection: String, id: String },

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}

/// Billing backend failures while creating a checkout session.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("No checkout URL received")]
    MissingUrl,

    #[error("Invalid checkout response: {0}")]
    InvalidResponse(String),

    #[error("Request failed with status code {status}")]
    Status { status: u16 },

    #[error("Checkout request failed: {0}")]
    Request(String),
}

/// Failures raised while subscribing to the identity provider.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),

    #[error("Identity stream already taken")]
    AlreadySubscribed,
}

/// Failures of the submit sequence. `Display` is the user-facing text.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    /// Not signed in, or signed in with the wrong account.
    #[error("{0}")]
    Auth(String),

    /// Missing uid or an empty required field.
    #[error("{0}")]
    Validation(String),

    /// The profile write was rejected.
    #[error("{}", persistence_message(.0))]
    Persistence(StoreError),

    /// The billing backend answered without a usable URL.
    #[error("{0}")]
    Checkout(CheckoutError),

    /// The billing request itself failed.
    #[error("{0}")]
    Network(CheckoutError),
}

impl OnboardingError {
    /// Short machine-readable kind, used in logs and JSON bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::Validation(_) => "validation",
            Self::Persistence(_) => "persistence",
            Self::Checkout(_) => "checkout",
            Self::Network(_) => "network",
        }
    }
}

impl From<StoreError> for OnboardingError {
    fn from(err: StoreError) -> Self {
        Self::Persistence(err)
    }
}

impl From<CheckoutError> for OnboardingError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Status { .. } | CheckoutError::Request(_) => Self::Network(err),
            CheckoutError::MissingUrl | CheckoutError::InvalidResponse(_) => Self::Checkout(err),
        }
    }
}

fn persistence_message(err: &StoreError) -> &'static str {
    if err.is_permission_denied() {
        "Unable to save user data. Please try signing out and signing in again."
    } else {
        "Error saving user data to database. Please try again."
    }
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;

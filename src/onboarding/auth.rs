//! Identity gate: tracks whether the signed-in principal is the one the
//! onboarding link was issued for.

use std::pin::Pin;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::error::IdentityError;

pub const SIGNED_OUT_MESSAGE: &str = "You must be signed in to access this page.";
pub const MISMATCH_MESSAGE: &str = "Email mismatch. Please sign in with the correct account.";
pub const INIT_FAILED_MESSAGE: &str = "Authentication error. Please try again.";

/// Channel capacity for pushed auth events.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// The signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// One auth-state change from the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuthEvent {
    SignedIn(Principal),
    SignedOut,
}

/// Whether the current principal may submit the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    #[default]
    Unauthenticated,
    AuthenticatedMatching,
    AuthenticatedMismatched,
}

impl AuthStatus {
    /// Check if a transition from `self` to `target` is valid.
    ///
    /// Any sign-in may replace any other, so only re-entering the same
    /// status is rejected.
    pub fn can_transition_to(&self, target: AuthStatus) -> bool {
        use AuthStatus::*;
        matches!(
            (self, target),
            (Unauthenticated, AuthenticatedMatching)
                | (Unauthenticated, AuthenticatedMismatched)
                | (AuthenticatedMatching, Unauthenticated)
                | (AuthenticatedMismatched, Unauthenticated)
                | (AuthenticatedMatching, AuthenticatedMismatched)
                | (AuthenticatedMismatched, AuthenticatedMatching)
        )
    }

    pub fn can_submit(&self) -> bool {
        matches!(self, Self::AuthenticatedMatching)
    }
}

impl std::fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::AuthenticatedMatching => "authenticated_matching",
            Self::AuthenticatedMismatched => "authenticated_mismatched",
        };
        write!(f, "{s}")
    }
}

/// Latest auth status plus the inline message shown with it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthSnapshot {
    pub status: AuthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AuthSnapshot {
    /// Derive the snapshot for one event against the expected email.
    pub fn evaluate(expected_email: Option<&str>, event: &AuthEvent) -> Self {
        match event {
            AuthEvent::SignedOut => Self {
                status: AuthStatus::Unauthenticated,
                message: Some(SIGNED_OUT_MESSAGE.to_string()),
            },
            AuthEvent::SignedIn(principal) => {
                let matches = matches!(
                    (principal.email.as_deref(), expected_email),
                    (Some(actual), Some(expected)) if actual == expected
                );
                if matches {
                    Self {
                        status: AuthStatus::AuthenticatedMatching,
                        message: None,
                    }
                } else {
                    Self {
                        status: AuthStatus::AuthenticatedMismatched,
                        message: Some(MISMATCH_MESSAGE.to_string()),
                    }
                }
            }
        }
    }
}

/// Boxed stream of auth events.
pub type AuthEventStream = Pin<Box<dyn Stream<Item = AuthEvent> + Send>>;

/// Source of auth-state changes.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Start listening. The stream yields every later state change.
    async fn subscribe(&self) -> Result<AuthEventStream, IdentityError>;
}

/// Identity provider fed by an mpsc channel.
///
/// Events are pushed through the paired [`AuthEventSender`]; the stream can
/// be taken once.
pub struct ChannelIdentityProvider {
    rx: Mutex<Option<mpsc::Receiver<AuthEvent>>>,
}

pub type AuthEventSender = mpsc::Sender<AuthEvent>;

impl ChannelIdentityProvider {
    pub fn new() -> (Self, AuthEventSender) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        (
            Self {
                rx: Mutex::new(Some(rx)),
            },
            tx,
        )
    }
}

#[async_trait]
impl IdentityProvider for ChannelIdentityProvider {
    async fn subscribe(&self) -> Result<AuthEventStream, IdentityError> {
        let rx = self
            .rx
            .lock()
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?
            .take()
            .ok_or(IdentityError::AlreadySubscribed)?;
        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

/// Holds the current [`AuthSnapshot`] for one onboarding session.
///
/// Later events overwrite earlier ones; readers always see the latest.
pub struct IdentityGate {
    expected_email: Option<String>,
    tx: watch::Sender<AuthSnapshot>,
}

impl IdentityGate {
    pub fn new(expected_email: Option<String>) -> Self {
        let (tx, _rx) = watch::channel(AuthSnapshot::default());
        Self { expected_email, tx }
    }

    pub fn expected_email(&self) -> Option<&str> {
        self.expected_email.as_deref()
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.tx.borrow().clone()
    }

    pub fn status(&self) -> AuthStatus {
        self.tx.borrow().status
    }

    /// Watch for snapshot changes.
    pub fn watch(&self) -> watch::Receiver<AuthSnapshot> {
        self.tx.subscribe()
    }

    /// Apply one auth event and return the resulting snapshot.
    pub fn apply(&self, event: &AuthEvent) -> AuthSnapshot {
        let next = AuthSnapshot::evaluate(self.expected_email(), event);
        let previous = self.tx.send_replace(next.clone());
        if previous.status != next.status {
            if !previous.status.can_transition_to(next.status) {
                warn!(from = %previous.status, to = %next.status, "Unexpected auth transition");
            }
            info!(from = %previous.status, to = %next.status, "Auth status changed");
        } else {
            debug!(status = %next.status, "Auth event left status unchanged");
        }
        next
    }

    /// Record that the provider could not be initialized.
    pub fn fail_initialization(&self, err: &IdentityError) {
        warn!(error = %err, "Auth check error");
        self.tx.send_replace(AuthSnapshot {
            status: AuthStatus::Unauthenticated,
            message: Some(INIT_FAILED_MESSAGE.to_string()),
        });
    }

    /// Subscribe to `provider` and apply its events in a background task.
    ///
    /// Returns `None` when the subscription could not be set up; the gate
    /// then carries the initialization-failure message.
    pub async fn attach(
        self: &Arc<Self>,
        provider: &dyn IdentityProvider,
    ) -> Option<JoinHandle<()>> {
        let mut events = match provider.subscribe().await {
            Ok(stream) => stream,
            Err(e) => {
                self.fail_initialization(&e);
                return None;
            }
        };

        let gate = Arc::clone(self);
        Some(tokio::spawn(async move {
            while let Some(event) = events.next().await {
                gate.apply(&event);
            }
            debug!("Auth event stream ended");
        }))
    }
}

//! One onboarding page: form state, identity gate, and the submit flow.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::auth::{AuthSnapshot, IdentityGate, IdentityProvider};
use super::destination::{Destination, Navigation, SIGN_IN_PATH};
use super::model::{FormField, LeadSource, OnboardingForm, UserProfileDocument};
use super::params::NavigationParams;
use crate::checkout::CheckoutClient;
use crate::error::OnboardingError;
use crate::store::ProfileStore;

pub const AUTH_REQUIRED_MESSAGE: &str = "Authentication required. Please sign in.";
pub const MISSING_UID_MESSAGE: &str = "User ID is missing";
pub const MISSING_FIELDS_MESSAGE: &str = "Please fill out all required fields.";
pub const FALLBACK_SUBMIT_MESSAGE: &str = "Error saving onboarding data. Please try again.";

/// Collaborators a session writes to.
#[derive(Clone)]
pub struct SessionDeps {
    pub store: Arc<dyn ProfileStore>,
    pub checkout: Arc<dyn CheckoutClient>,
}

/// What the page shows below the heading.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    /// The profile form; only shown to the matching principal.
    Form {
        form: OnboardingForm,
        sources: Vec<&'static str>,
    },
    /// Sign-in prompt with its "Go to Sign In" target.
    SignInPrompt { sign_in: Navigation },
}

/// Rendered state of the page.
#[derive(Debug, Clone, Serialize)]
pub struct OnboardingView {
    pub auth: AuthSnapshot,
    #[serde(flatten)]
    pub screen: Screen,
}

impl OnboardingView {
    pub fn shows_form(&self) -> bool {
        matches!(self.screen, Screen::Form { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Error,
}

/// Transient, non-blocking message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Result of a submit as the user sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubmitOutcome {
    Navigate { navigation: Navigation },
    Notification(Notification),
}

/// Server-side state of one onboarding page load.
///
/// Submits are not serialized against each other: two concurrent submits
/// both write and both navigate.
pub struct OnboardingSession {
    params: NavigationParams,
    form: RwLock<OnboardingForm>,
    gate: Arc<IdentityGate>,
    deps: SessionDeps,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl OnboardingSession {
    /// Create a session that has not yet subscribed to an identity provider.
    pub fn new(params: NavigationParams, deps: SessionDeps) -> Self {
        let form = OnboardingForm::prefilled(params.email.as_deref(), params.name.as_deref());
        let gate = Arc::new(IdentityGate::new(params.email.clone()));
        Self {
            params,
            form: RwLock::new(form),
            gate,
            deps,
            listener: Mutex::new(None),
        }
    }

    /// Create a session and subscribe it to `provider`.
    pub async fn start(
        params: NavigationParams,
        deps: SessionDeps,
        provider: &dyn IdentityProvider,
    ) -> Arc<Self> {
        let session = Arc::new(Self::new(params, deps));
        let handle = session.gate.attach(provider).await;
        if let Ok(mut slot) = session.listener.lock() {
            *slot = handle;
        }
        session
    }

    pub fn params(&self) -> &NavigationParams {
        &self.params
    }

    pub fn gate(&self) -> &Arc<IdentityGate> {
        &self.gate
    }

    pub fn auth(&self) -> AuthSnapshot {
        self.gate.snapshot()
    }

    pub async fn form(&self) -> OnboardingForm {
        self.form.read().await.clone()
    }

    /// Update one form field.
    pub async fn set_field(
        &self,
        field: FormField,
        value: impl Into<String>,
    ) -> Result<(), OnboardingError> {
        if !self.form.write().await.set(field, value) {
            return Err(OnboardingError::Validation(format!(
                "The {field} field cannot be changed."
            )));
        }
        Ok(())
    }

    pub async fn view(&self) -> OnboardingView {
        let auth = self.gate.snapshot();
        let screen = if auth.status.can_submit() {
            Screen::Form {
                form: self.form().await,
                sources: LeadSource::ALL.iter().map(LeadSource::as_str).collect(),
            }
        } else {
            Screen::SignInPrompt {
                sign_in: Navigation::push(SIGN_IN_PATH),
            }
        };
        OnboardingView { auth, screen }
    }

    /// Validate, save the profile, then pick where to go next.
    pub async fn submit(&self) -> Result<Navigation, OnboardingError> {
        let auth = self.gate.snapshot();
        if !auth.status.can_submit() {
            return Err(OnboardingError::Auth(
                auth.message
                    .unwrap_or_else(|| AUTH_REQUIRED_MESSAGE.to_string()),
            ));
        }

        let uid = self
            .params
            .uid
            .as_deref()
            .ok_or_else(|| OnboardingError::Validation(MISSING_UID_MESSAGE.to_string()))?;

        let form = self.form().await;
        let missing = form.missing_fields();
        if !missing.is_empty() {
            debug!(uid = %uid, missing = ?missing, "Onboarding form incomplete");
            return Err(OnboardingError::Validation(MISSING_FIELDS_MESSAGE.to_string()));
        }

        let profile = UserProfileDocument::from_form(uid, &form, Utc::now());
        self.deps
            .store
            .save_profile(uid, &profile)
            .await
            .map_err(|e| {
                error!(uid = %uid, error = %e, "Profile write failed");
                OnboardingError::from(e)
            })?;
        info!(uid = %uid, "Onboarding profile saved");

        let destination = Destination::select(&self.params);
        let navigation = destination
            .resolve(uid, self.deps.checkout.as_ref())
            .await?;
        info!(
            uid = %uid,
            destination = destination.kind(),
            target = %navigation.target(),
            "Onboarding complete"
        );
        Ok(navigation)
    }

    /// Run [`submit`](Self::submit), turning any failure into a notification.
    pub async fn submit_and_notify(&self) -> SubmitOutcome {
        match self.submit().await {
            Ok(navigation) => SubmitOutcome::Navigate { navigation },
            Err(e) => {
                error!(kind = e.kind(), error = %e, "Error saving onboarding data");
                let message = e.to_string();
                if message.is_empty() {
                    SubmitOutcome::Notification(Notification::error(FALLBACK_SUBMIT_MESSAGE))
                } else {
                    SubmitOutcome::Notification(Notification::error(message))
                }
            }
        }
    }
}

impl Drop for OnboardingSession {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.listener.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}

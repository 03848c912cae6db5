//! Onboarding form: the post-sign-up profile step.
//!
//! A session is opened per page load from the navigation parameters. Its
//! identity gate follows the auth provider and only shows the form to the
//! principal whose email the link was issued for. Submitting saves the
//! profile document and resolves the next destination: a shared agent,
//! a paid checkout, agent creation from a prompt, or the default flow.

pub mod auth;
pub mod destination;
pub mod manager;
pub mod model;
pub mod params;
pub mod routes;
pub mod session;

pub use auth::{
    AuthEvent, AuthSnapshot, AuthStatus, ChannelIdentityProvider, IdentityGate, IdentityProvider,
    Principal,
};
pub use destination::{Destination, Navigation};
pub use manager::OnboardingManager;
pub use model::{FormField, LeadSource, OnboardingForm, UserProfileDocument};
pub use params::NavigationParams;
pub use routes::{OnboardingRouteState, onboarding_routes};
pub use session::{
    Notification, OnboardingSession, OnboardingView, Screen, SessionDeps, SubmitOutcome,
};

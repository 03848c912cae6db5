//! OnboardingManager owns the live onboarding sessions served over HTTP.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use super::auth::{AuthEvent, AuthEventSender, AuthSnapshot, ChannelIdentityProvider};
use super::params::NavigationParams;
use super::session::{OnboardingSession, SessionDeps};

/// How long a pushed auth event may take to reach the gate.
const AUTH_APPLY_TIMEOUT: Duration = Duration::from_secs(2);

struct SessionEntry {
    session: Arc<OnboardingSession>,
    events: AuthEventSender,
}

/// Registry of onboarding sessions keyed by id.
///
/// Each session is fed auth events through its own channel-backed identity
/// provider.
pub struct OnboardingManager {
    deps: SessionDeps,
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
}

impl OnboardingManager {
    pub fn new(deps: SessionDeps) -> Self {
        Self {
            deps,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Open a session for one page load.
    pub async fn create(&self, params: NavigationParams) -> (Uuid, Arc<OnboardingSession>) {
        let (provider, events) = ChannelIdentityProvider::new();
        let session = OnboardingSession::start(params, self.deps.clone(), &provider).await;
        let id = Uuid::new_v4();

        self.sessions.write().await.insert(
            id,
            SessionEntry {
                session: Arc::clone(&session),
                events,
            },
        );
        info!(session_id = %id, uid = ?session.params().uid, "Onboarding session opened");
        (id, session)
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<OnboardingSession>> {
        self.sessions
            .read()
            .await
            .get(&id)
            .map(|entry| Arc::clone(&entry.session))
    }

    /// Forget a session. Its auth listener stops once the last handle to the
    /// session is dropped.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!(session_id = %id, "Onboarding session closed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Push an auth event into a session and wait until its gate has applied
    /// it. Returns `None` for an unknown session.
    pub async fn push_auth_event(&self, id: Uuid, event: AuthEvent) -> Option<AuthSnapshot> {
        let (session, events) = {
            let sessions = self.sessions.read().await;
            let entry = sessions.get(&id)?;
            (Arc::clone(&entry.session), entry.events.clone())
        };

        let mut watcher = session.gate().watch();
        if events.send(event).await.is_err() {
            warn!(session_id = %id, "Auth listener is gone; event dropped");
            return Some(session.auth());
        }
        if tokio::time::timeout(AUTH_APPLY_TIMEOUT, watcher.changed())
            .await
            .is_err()
        {
            warn!(session_id = %id, "Timed out waiting for auth event to apply");
        }
        Some(session.auth())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::HttpCheckoutClient;
    use crate::onboarding::auth::{AuthStatus, Principal};
    use crate::store::MemoryProfileStore;

    fn manager() -> OnboardingManager {
        OnboardingManager::new(SessionDeps {
            store: Arc::new(MemoryProfileStore::new()),
            checkout: Arc::new(HttpCheckoutClient::new("http://127.0.0.1:9")),
        })
    }

    #[tokio::test]
    async fn create_get_remove() {
        let manager = manager();
        let (id, session) = manager
            .create(NavigationParams::from_query("email=a@x.com&uid=u1"))
            .await;
        assert_eq!(session.params().uid.as_deref(), Some("u1"));
        assert!(manager.get(id).await.is_some());
        assert_eq!(manager.len().await, 1);

        assert!(manager.remove(id).await);
        assert!(manager.get(id).await.is_none());
        assert!(manager.is_empty().await);
    }

    #[tokio::test]
    async fn removed_session_stops_its_listener() {
        let manager = manager();
        let (id, session) = manager
            .create(NavigationParams::from_query("email=a@x.com&uid=u1"))
            .await;
        let events = manager.sessions.read().await[&id].events.clone();
        assert!(!events.is_closed());

        assert!(manager.remove(id).await);
        drop(session);
        tokio::time::timeout(Duration::from_secs(1), events.closed())
            .await
            .expect("listener still running after removal");
        assert!(!manager.remove(id).await);
    }

    #[tokio::test]
    async fn pushed_events_reach_the_gate() {
        let manager = manager();
        let (id, _session) = manager
            .create(NavigationParams::from_query("email=a@x.com&uid=u1"))
            .await;

        let snap = manager
            .push_auth_event(
                id,
                AuthEvent::SignedIn(Principal {
                    uid: "u1".into(),
                    email: Some("a@x.com".into()),
                }),
            )
            .await
            .unwrap();
        assert_eq!(snap.status, AuthStatus::AuthenticatedMatching);

        let snap = manager
            .push_auth_event(id, AuthEvent::SignedOut)
            .await
            .unwrap();
        assert_eq!(snap.status, AuthStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn unknown_session_is_none() {
        let manager = manager();
        assert!(manager
            .push_auth_event(Uuid::new_v4(), AuthEvent::SignedOut)
            .await
            .is_none());
    }
}

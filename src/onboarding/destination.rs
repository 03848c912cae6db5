//! Post-onboarding destinations and where they lead.

use serde::{Deserialize, Serialize};

use super::params::NavigationParams;
use crate::checkout::CheckoutClient;
use crate::error::CheckoutError;

pub const SHARED_AGENT_PATH: &str = "/shared-agent";
pub const ALL_AGENTS_PATH: &str = "/all-agents";
pub const LINK_GITHUB_PATH: &str = "/link-github";
pub const SIGN_IN_PATH: &str = "/sign-in";

/// Where the user goes once the profile is saved.
///
/// Chosen by priority: agent share, then paid plan, then agent prompt,
/// then the default flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    SharedAgent { agent_id: String },
    Checkout { plan: String },
    CreateAgent { prompt: String },
    LinkGithub,
}

impl Destination {
    pub fn select(params: &NavigationParams) -> Self {
        if let Some(agent_id) = &params.agent_id {
            Self::SharedAgent {
                agent_id: agent_id.clone(),
            }
        } else if let Some(plan) = &params.plan {
            Self::Checkout { plan: plan.clone() }
        } else if let Some(prompt) = &params.prompt {
            Self::CreateAgent {
                prompt: prompt.clone(),
            }
        } else {
            Self::LinkGithub
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::SharedAgent { .. } => "shared_agent",
            Self::Checkout { .. } => "checkout",
            Self::CreateAgent { .. } => "create_agent",
            Self::LinkGithub => "link_github",
        }
    }

    /// Turn the destination into a navigation. Checkout asks the billing
    /// backend for the redirect target; every other destination is an
    /// in-app route.
    ///
    /// Both `agent_id` and `prompt` are percent-encoded into the query, so an
    /// agent id containing `&`, `#` or spaces arrives intact rather than being
    /// interpolated raw.
    pub async fn resolve(
        &self,
        uid: &str,
        checkout: &dyn CheckoutClient,
    ) -> Result<Navigation, CheckoutError> {
        let path = match self {
            Self::SharedAgent { agent_id } => format!(
                "{SHARED_AGENT_PATH}?agent_id={}",
                urlencoding::encode(agent_id)
            ),
            Self::Checkout { plan } => {
                let url = checkout.create_checkout_session(uid, plan).await?;
                return Ok(Navigation::redirect(url));
            }
            Self::CreateAgent { prompt } => format!(
                "{ALL_AGENTS_PATH}?createAgent=true&prompt={}",
                urlencoding::encode(prompt)
            ),
            Self::LinkGithub => LINK_GITHUB_PATH.to_string(),
        };
        Ok(Navigation::push(path))
    }
}

/// A navigation the client should perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Navigation {
    /// Client-side route change.
    Push { path: String },
    /// Full page navigation to an external URL.
    Redirect { url: String },
}

impl Navigation {
    pub fn push(path: impl Into<String>) -> Self {
        Self::Push { path: path.into() }
    }

    pub fn redirect(url: impl Into<String>) -> Self {
        Self::Redirect { url: url.into() }
    }

    pub fn target(&self) -> &str {
        match self {
            Self::Push { path } => path,
            Self::Redirect { url } => url,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// Records checkout calls and answers with a fixed URL.
    struct StubCheckout {
        calls: Mutex<Vec<(String, String)>>,
    }

    impl StubCheckout {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CheckoutClient for StubCheckout {
        async fn create_checkout_session(
            &self,
            uid: &str,
            plan: &str,
        ) -> Result<String, CheckoutError> {
            self.calls
                .lock()
                .unwrap()
                .push((uid.to_string(), plan.to_string()));
            Ok(format!("https://pay.example/{plan}"))
        }
    }

    fn params(agent_id: bool, plan: bool, prompt: bool) -> NavigationParams {
        NavigationParams {
            agent_id: agent_id.then(|| "g7".to_string()),
            plan: plan.then(|| "pro".to_string()),
            prompt: prompt.then(|| "make it so".to_string()),
            ..NavigationParams::default()
        }
    }

    #[test]
    fn priority_holds_for_every_combination() {
        for bits in 0u8..8 {
            let (a, p, q) = (bits & 1 != 0, bits & 2 != 0, bits & 4 != 0);
            let expected = if a {
                "shared_agent"
            } else if p {
                "checkout"
            } else if q {
                "create_agent"
            } else {
                "link_github"
            };
            assert_eq!(
                Destination::select(&params(a, p, q)).kind(),
                expected,
                "agent_id={a} plan={p} prompt={q}"
            );
        }
    }

    #[tokio::test]
    async fn shared_agent_skips_checkout() {
        let checkout = StubCheckout::new();
        let nav = Destination::select(&params(true, true, true))
            .resolve("u1", &checkout)
            .await
            .unwrap();
        assert_eq!(nav, Navigation::push("/shared-agent?agent_id=g7"));
        assert!(checkout.calls().is_empty());
    }

    #[tokio::test]
    async fn plan_redirects_to_checkout_url() {
        let checkout = StubCheckout::new();
        let nav = Destination::select(&params(false, true, true))
            .resolve("u1", &checkout)
            .await
            .unwrap();
        assert_eq!(nav, Navigation::redirect("https://pay.example/pro"));
        assert_eq!(checkout.calls(), vec![("u1".to_string(), "pro".to_string())]);
    }

    #[tokio::test]
    async fn prompt_is_url_encoded() {
        let checkout = StubCheckout::new();
        let nav = Destination::CreateAgent {
            prompt: "a bot & more?".to_string(),
        }
        .resolve("u1", &checkout)
        .await
        .unwrap();
        assert_eq!(
            nav.target(),
            "/all-agents?createAgent=true&prompt=a%20bot%20%26%20more%3F"
        );
    }

    #[tokio::test]
    async fn agent_id_is_url_encoded() {
        let checkout = StubCheckout::new();
        let nav = Destination::SharedAgent {
            agent_id: "team a&b".to_string(),
        }
        .resolve("u1", &checkout)
        .await
        .unwrap();
        assert_eq!(nav.target(), "/shared-agent?agent_id=team%20a%26b");
    }

    #[tokio::test]
    async fn default_is_link_github() {
        let checkout = StubCheckout::new();
        let nav = Destination::select(&NavigationParams::default())
            .resolve("u1", &checkout)
            .await
            .unwrap();
        assert_eq!(nav, Navigation::push("/link-github"));
        assert!(checkout.calls().is_empty());
    }

    #[test]
    fn navigation_serializes_with_mode_tag() {
        let json = serde_json::to_value(Navigation::redirect("https://pay/x")).unwrap();
        assert_eq!(json["mode"], "redirect");
        assert_eq!(json["url"], "https://pay/x");
    }
}

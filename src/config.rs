//! Configuration types.

use secrecy::SecretString;

use crate::error::ConfigError;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";

/// Firestore connection settings. Present only when a project is configured.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub base_url: String,
    /// Bearer token sent with every write, if any.
    pub token: Option<SecretString>,
}

/// Service configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct OnboardingConfig {
    /// Base URL of the subscription service that issues checkout sessions.
    pub subscription_base_url: String,
    /// Port for the HTTP surface.
    pub port: u16,
    /// Document store settings; `None` selects the in-memory store.
    pub firestore: Option<FirestoreConfig>,
}

impl OnboardingConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let subscription_base_url = lookup("SUBSCRIPTION_BASE_URL")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("SUBSCRIPTION_BASE_URL".to_string()))?;

        let port = match lookup("ONBOARDING_PORT") {
            Some(raw) => raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: "ONBOARDING_PORT".to_string(),
                message: format!("{e}"),
            })?,
            None => DEFAULT_PORT,
        };

        let firestore = lookup("FIRESTORE_PROJECT_ID")
            .filter(|s| !s.trim().is_empty())
            .map(|project_id| FirestoreConfig {
                project_id: project_id.trim().to_string(),
                base_url: lookup("FIRESTORE_BASE_URL")
                    .map(|s| s.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| DEFAULT_FIRESTORE_BASE_URL.to_string()),
                token: lookup("FIRESTORE_TOKEN")
                    .filter(|s| !s.is_empty())
                    .map(SecretString::from),
            });

        Ok(Self {
            subscription_base_url,
            port,
            firestore,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_subscription_url_is_an_error() {
        let err = OnboardingConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "SUBSCRIPTION_BASE_URL"));
    }

    #[test]
    fn defaults_apply() {
        let config =
            OnboardingConfig::from_lookup(lookup_from(&[("SUBSCRIPTION_BASE_URL", "https://subs.example/")]))
                .unwrap();
        assert_eq!(config.subscription_base_url, "https://subs.example");
        assert_eq!(config.port, 8080);
        assert!(config.firestore.is_none());
    }

    #[test]
    fn firestore_selected_by_project() {
        let config = OnboardingConfig::from_lookup(lookup_from(&[
            ("SUBSCRIPTION_BASE_URL", "https://subs.example"),
            ("ONBOARDING_PORT", "9090"),
            ("FIRESTORE_PROJECT_ID", "demo"),
            ("FIRESTORE_TOKEN", "tok"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9090);
        let fs = config.firestore.unwrap();
        assert_eq!(fs.project_id, "demo");
        assert_eq!(fs.base_url, "https://firestore.googleapis.com");
        assert!(fs.token.is_some());
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = OnboardingConfig::from_lookup(lookup_from(&[
            ("SUBSCRIPTION_BASE_URL", "https://subs.example"),
            ("ONBOARDING_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}

//! Navigation parameters the onboarding page is opened with.

use serde::{Deserialize, Deserializer, Serialize};

/// Identifying parameters taken from the page location.
///
/// Empty values are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationParams {
    #[serde(default, deserialize_with = "non_empty")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub plan: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub prompt: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub agent_id: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub uid: Option<String>,
}

impl NavigationParams {
    /// Parse a URL query string (with or without the leading `?`).
    ///
    /// Unknown keys are ignored. For repeated keys the first value wins.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match &*key {
                "email" => &mut params.email,
                "name" => &mut params.name,
                "plan" => &mut params.plan,
                "prompt" => &mut params.prompt,
                "agent_id" => &mut params.agent_id,
                "uid" => &mut params.uid,
                _ => continue,
            };
            if slot.is_none() && !value.is_empty() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }
}

fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_known_keys() {
        let params = NavigationParams::from_query(
            "?email=a%40x.com&name=Ada+L&plan=pro&prompt=build%20a%20bot&agent_id=g7&uid=u1&utm=x",
        );
        assert_eq!(params.email.as_deref(), Some("a@x.com"));
        assert_eq!(params.name.as_deref(), Some("Ada L"));
        assert_eq!(params.plan.as_deref(), Some("pro"));
        assert_eq!(params.prompt.as_deref(), Some("build a bot"));
        assert_eq!(params.agent_id.as_deref(), Some("g7"));
        assert_eq!(params.uid.as_deref(), Some("u1"));
    }

    #[test]
    fn empty_values_are_absent() {
        let params = NavigationParams::from_query("plan=&uid=u1");
        assert_eq!(params.plan, None);
        assert_eq!(params.uid.as_deref(), Some("u1"));
    }

    #[test]
    fn first_value_wins() {
        let params = NavigationParams::from_query("uid=first&uid=second");
        assert_eq!(params.uid.as_deref(), Some("first"));
    }

    #[test]
    fn json_empty_strings_are_absent() {
        let params: NavigationParams =
            serde_json::from_str(r#"{"email":"a@x.com","plan":"","uid":"u1"}"#).unwrap();
        assert_eq!(params.plan, None);
        assert_eq!(params.prompt, None);
        assert_eq!(params.email.as_deref(), Some("a@x.com"));
    }
}

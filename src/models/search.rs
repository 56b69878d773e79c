use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

/// Account platforms listed under `identity.alternate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    WbNetwork,
    Steam,
    Epic,
    Xbox,
    PlayStation4,
    PlayStation5,
    Switch,
}

impl Platform {
    pub const ALL: [Platform; 7] = [
        Platform::WbNetwork,
        Platform::Steam,
        Platform::Epic,
        Platform::Xbox,
        Platform::PlayStation4,
        Platform::PlayStation5,
        Platform::Switch,
    ];

    /// Key used in `identity.alternate`
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::WbNetwork => "wb_network",
            Platform::Steam => "steam",
            Platform::Epic => "epic",
            Platform::Xbox => "xb1",
            Platform::PlayStation4 => "ps4",
            Platform::PlayStation5 => "ps5",
            Platform::Switch => "switch",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == lower)
            .ok_or_else(|| ApiError::Validation(format!("Unknown platform: {}", s)))
    }
}

/// One page of search results
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchPage {
    pub results: Vec<Value>,
    /// Continuation cursor; `None` when there are no more pages
    pub cursor: Option<String>,
}

impl SearchPage {
    /// Decode `{"results": [...], "cursor": "..."}`; missing fields are treated as empty
    pub fn from_value(value: Value) -> Self {
        let results = match value.get("results") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        let cursor = value
            .get("cursor")
            .and_then(Value::as_str)
            .filter(|c| !c.trim().is_empty())
            .map(str::to_string);

        Self { results, cursor }
    }
}

/// Username of `entry` on `platform`:
/// `result.account.identity.alternate[<platform>][0].username`
pub fn platform_username<'a>(entry: &'a Value, platform: Platform) -> Option<&'a str> {
    alternates(entry)?
        .get(platform.as_str())?
        .get(0)?
        .get("username")?
        .as_str()
}

/// First alternate username on every platform the entry lists
pub fn all_usernames(entry: &Value) -> Vec<&str> {
    match alternates(entry).and_then(Value::as_object) {
        Some(map) => map
            .values()
            .filter_map(|accounts| accounts.get(0)?.get("username")?.as_str())
            .collect(),
        None => Vec::new(),
    }
}

fn alternates(entry: &Value) -> Option<&Value> {
    entry
        .get("result")?
        .get("account")?
        .get("identity")?
        .get("alternate")
}

/// Case-insensitive exact match against the platform username, or any platform when `None`
pub fn matches_exact(entry: &Value, query: &str, platform: Option<Platform>) -> bool {
    let query = query.to_lowercase();
    match platform {
        Some(p) => platform_username(entry, p).is_some_and(|u| u.to_lowercase() == query),
        None => all_usernames(entry)
            .into_iter()
            .any(|u| u.to_lowercase() == query),
    }
}

/// Case-insensitive substring match against the platform username
pub fn matches_prefix(entry: &Value, query: &str, platform: Platform) -> bool {
    let query = query.to_lowercase();
    platform_username(entry, platform).is_some_and(|u| u.to_lowercase().contains(&query))
}

#[cfg(test)]
pub(crate) fn search_entry(platform: &str, username: &str) -> Value {
    serde_json::json!({
        "result": {
            "account": {
                "identity": {
                    "alternate": {
                        (platform): [{"username": username, "id": format!("{}-id", username)}]
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_platform_parsing() {
        assert_eq!("steam".parse::<Platform>().unwrap(), Platform::Steam);
        assert_eq!("XB1".parse::<Platform>().unwrap(), Platform::Xbox);
        assert_eq!("wb_network".parse::<Platform>().unwrap(), Platform::WbNetwork);
        assert!(matches!(
            "gamecube".parse::<Platform>(),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_page_decoding() {
        let page = SearchPage::from_value(json!({
            "results": [search_entry("steam", "bob")],
            "cursor": "abc"
        }));
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.cursor.as_deref(), Some("abc"));
    }

    #[test]
    fn test_blank_cursor_means_no_more_pages() {
        assert_eq!(SearchPage::from_value(json!({"results": [], "cursor": ""})).cursor, None);
        assert_eq!(SearchPage::from_value(json!({"results": [], "cursor": "  "})).cursor, None);
        assert_eq!(SearchPage::from_value(json!({"results": [], "cursor": null})).cursor, None);
        assert_eq!(SearchPage::from_value(json!({})), SearchPage::default());
    }

    #[test]
    fn test_platform_username_is_null_safe() {
        assert_eq!(platform_username(&json!({}), Platform::Steam), None);
        assert_eq!(
            platform_username(&json!({"result": {"account": null}}), Platform::Steam),
            None
        );
        assert_eq!(
            platform_username(
                &json!({"result": {"account": {"identity": {"alternate": {"steam": []}}}}}),
                Platform::Steam
            ),
            None
        );
        assert_eq!(
            platform_username(&search_entry("steam", "Bob"), Platform::Steam),
            Some("Bob")
        );
        assert_eq!(platform_username(&search_entry("steam", "Bob"), Platform::Epic), None);
    }

    #[test]
    fn test_exact_match_without_platform_checks_all() {
        let entry = search_entry("epic", "Bob");
        assert!(matches_exact(&entry, "bob", None));
        assert!(!matches_exact(&entry, "bob", Some(Platform::Steam)));
        assert!(!matches_exact(&entry, "bobby", None));
    }

    #[test]
    fn test_prefix_match() {
        let entry = search_entry("steam", "TheBobster");
        assert!(matches_prefix(&entry, "bob", Platform::Steam));
        assert!(!matches_prefix(&entry, "bob", Platform::Epic));
        assert!(!matches_prefix(&entry, "alice", Platform::Steam));
    }

    proptest! {
        #[test]
        fn prop_exact_match_ignores_case(name in "[a-zA-Z0-9_]{1,16}") {
            let entry = search_entry("steam", &name);
            prop_assert!(matches_exact(&entry, &name.to_uppercase(), Some(Platform::Steam)));
            prop_assert!(matches_exact(&entry, &name.to_lowercase(), None));
        }

        #[test]
        fn prop_exact_match_rejects_extensions(name in "[a-z]{1,12}", suffix in "[a-z]{1,4}") {
            let entry = search_entry("steam", &format!("{}{}", name, suffix));
            prop_assert!(!matches_exact(&entry, &name, Some(Platform::Steam)));
            prop_assert!(matches_prefix(&entry, &name, Platform::Steam));
        }
    }
}

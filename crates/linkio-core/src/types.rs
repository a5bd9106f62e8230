use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A resolved deep link, ready to hand to the host application.
///
/// Produced either by classifying a navigation URI (`is_deferred = false`)
/// or by decoding a pending-link response from the backend
/// (`is_deferred = true`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeepLink {
    /// The full URI as received.
    pub url: String,

    /// Query parameters. Keys are unique; a repeated key keeps its last value.
    #[serde(default, deserialize_with = "lenient_params")]
    pub params: HashMap<String, String>,

    /// Whether this link was captured before install and fetched later.
    #[serde(default)]
    pub is_deferred: bool,
}

impl DeepLink {
    pub fn new(url: impl Into<String>, params: HashMap<String, String>, is_deferred: bool) -> Self {
        Self {
            url: url.into(),
            params,
            is_deferred,
        }
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Backends send `params` as `null`, or with numeric and boolean values.
/// `null` decodes to an empty map, scalars to their string form, null
/// entries are dropped, and nested values keep their JSON text.
fn lenient_params<'de, D>(deserializer: D) -> std::result::Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<HashMap<String, Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::Null => return None,
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                nested => nested.to_string(),
            };
            Some((key, value))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_backend_payload() {
        let json = r#"{"url":"https://example.com/promo","params":{"ref":"abc"},"isDeferred":true}"#;
        let link: DeepLink = serde_json::from_str(json).unwrap();
        assert_eq!(link.url, "https://example.com/promo");
        assert_eq!(link.param("ref"), Some("abc"));
        assert!(link.is_deferred);
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let link: DeepLink = serde_json::from_str(r#"{"url":"https://example.com/"}"#).unwrap();
        assert!(link.params.is_empty());
        assert!(!link.is_deferred);
    }

    #[test]
    fn test_null_params_decode_as_empty() {
        let link: DeepLink =
            serde_json::from_str(r#"{"url":"https://example.com/x","params":null}"#).unwrap();
        assert!(link.params.is_empty());
    }

    #[test]
    fn test_scalar_params_become_strings() {
        let json = r#"{"url":"https://example.com/x","params":{"id":42,"ratio":0.5,"vip":true,"ref":"abc","gone":null}}"#;
        let link: DeepLink = serde_json::from_str(json).unwrap();
        assert_eq!(link.param("id"), Some("42"));
        assert_eq!(link.param("ratio"), Some("0.5"));
        assert_eq!(link.param("vip"), Some("true"));
        assert_eq!(link.param("ref"), Some("abc"));
        assert_eq!(link.param("gone"), None);
        assert_eq!(link.params.len(), 4);
    }

    #[test]
    fn test_params_must_be_an_object() {
        assert!(serde_json::from_str::<DeepLink>(r#"{"url":"https://example.com/x","params":[1]}"#).is_err());
    }

    #[test]
    fn test_missing_url_is_rejected() {
        assert!(serde_json::from_str::<DeepLink>(r#"{"params":{}}"#).is_err());
    }

    #[test]
    fn test_serializes_camel_case() {
        let link = DeepLink::new("https://example.com/", HashMap::new(), false);
        let value = serde_json::to_value(&link).unwrap();
        assert_eq!(value["isDeferred"], serde_json::Value::Bool(false));
    }
}

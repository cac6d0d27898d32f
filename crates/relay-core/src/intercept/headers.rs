//! Header normalization.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// A normalized header set: lowercase name to value.
///
/// Built once from the host's raw header sequence and never mutated
/// afterwards; its lifetime is one network request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HeaderSet {
    entries: BTreeMap<String, String>,
}

impl HeaderSet {
    /// Look up a header by name (matched case-insensitively).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Number of distinct headers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate headers in lowercase-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for HeaderSet {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let entries =
            iter.into_iter().map(|(name, value)| (name.to_ascii_lowercase(), value)).collect();
        Self { entries }
    }
}

/// Normalize a host-provided raw header sequence.
///
/// The input is expected to be an ordered sequence of `{name, value}`
/// records; later duplicate names overwrite earlier ones. Hosts vary, so a
/// value that is not such a sequence yields `None` and the caller leaves
/// the raw value untouched. Records missing a string `name` or `value` are
/// skipped. Never an error.
pub fn normalize(raw: &Value) -> Option<HeaderSet> {
    let items = raw.as_array()?;
    let mut entries = BTreeMap::new();
    for item in items {
        let Some(name) = item.get("name").and_then(Value::as_str) else {
            continue;
        };
        let Some(value) = item.get("value").and_then(Value::as_str) else {
            continue;
        };
        entries.insert(name.to_ascii_lowercase(), value.to_owned());
    }
    Some(HeaderSet { entries })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    #[test]
    fn lowercases_and_overwrites_duplicates() {
        let raw = json!([
            {"name": "Accept-Charset", "value": "iso-8859-1"},
            {"name": "Content-Type", "value": "text/html"},
            {"name": "ACCEPT-CHARSET", "value": "utf-8"},
        ]);
        let headers = normalize(&raw).unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("accept-charset"), Some("utf-8"));
        assert_eq!(headers.get("Content-Type"), Some("text/html"));
    }

    #[test]
    fn non_sequence_input_passes_through() {
        assert_eq!(normalize(&json!("opaque host value")), None);
        assert_eq!(normalize(&json!({"name": "x", "value": "y"})), None);
        assert_eq!(normalize(&Value::Null), None);
    }

    #[test]
    fn malformed_records_are_skipped() {
        let raw = json!([
            {"name": "Host", "value": "example.org"},
            {"name": "X-Binary"},
            {"value": "orphan"},
            {"name": 42, "value": "nope"},
        ]);
        let headers = normalize(&raw).unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("host"), Some("example.org"));
    }

    proptest! {
        /// Duplicates collapse and every key is lowercase.
        #[test]
        fn normalized_size_and_case(
            pairs in prop::collection::vec(("[A-Za-z-]{1,12}", "[ -~]{0,16}"), 0..16)
        ) {
            let raw = Value::Array(
                pairs
                    .iter()
                    .map(|(name, value)| json!({"name": name, "value": value}))
                    .collect(),
            );
            let headers = normalize(&raw).unwrap();
            prop_assert!(headers.len() <= pairs.len());
            for (name, _) in headers.iter() {
                prop_assert_eq!(name, name.to_ascii_lowercase());
            }
        }
    }
}

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

/// A header value as callers supply it: one text, or several for a header
/// that was repeated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderField {
    Single(String),
    Multiple(Vec<String>),
}

impl From<&str> for HeaderField {
    fn from(value: &str) -> Self {
        HeaderField::Single(value.to_string())
    }
}

impl From<String> for HeaderField {
    fn from(value: String) -> Self {
        HeaderField::Single(value)
    }
}

impl From<Vec<String>> for HeaderField {
    fn from(values: Vec<String>) -> Self {
        HeaderField::Multiple(values)
    }
}

impl From<Vec<&str>> for HeaderField {
    fn from(values: Vec<&str>) -> Self {
        HeaderField::Multiple(values.into_iter().map(str::to_string).collect())
    }
}

/// Read-only, case-insensitive view over response headers in the order the
/// response carried them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderView {
    entries: Vec<(String, String)>,
}

impl HeaderView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every value of a repeated header is kept as its own entry. Values that
    /// are not visible ASCII are rendered as `<binary>`.
    pub fn from_header_map(headers: &HeaderMap) -> Self {
        headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.to_str().unwrap_or("<binary>")))
            .collect()
    }

    /// First header whose name matches, ignoring case.
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Every header whose name matches, ignoring case, in original order.
    pub fn values_of(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for HeaderView
where
    K: Into<String>,
    V: Into<HeaderField>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut entries = Vec::new();
        for (name, field) in iter {
            let name = name.into();
            match field.into() {
                HeaderField::Single(value) => entries.push((name, value)),
                HeaderField::Multiple(values) => {
                    entries.extend(values.into_iter().map(|value| (name.clone(), value)));
                }
            }
        }
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderValue, SET_COOKIE};

    use super::*;

    #[test]
    fn value_of_returns_first_match_ignoring_case() {
        let headers: HeaderView = [("Content-Type", "json"), ("content-type", "text")].into_iter().collect();

        assert_eq!(headers.value_of("CONTENT-TYPE"), Some("json"));
        assert_eq!(headers.values_of("content-type"), vec!["json", "text"]);
    }

    #[test]
    fn missing_header() {
        let headers: HeaderView = [("Accept", "*/*")].into_iter().collect();

        assert_eq!(headers.value_of("Authorization"), None);
        assert!(headers.values_of("Authorization").is_empty());
    }

    #[test]
    fn multiple_values_expand_in_order() {
        let headers: HeaderView = [
            ("Set-Cookie", HeaderField::from(vec!["a=1", "b=2"])),
            ("X-Trace", HeaderField::from("t1")),
            ("set-cookie", HeaderField::from("c=3")),
        ]
        .into_iter()
        .collect();

        assert_eq!(headers.values_of("SET-COOKIE"), vec!["a=1", "b=2", "c=3"]);
        assert_eq!(headers.value_of("set-cookie"), Some("a=1"));
        assert_eq!(headers.len(), 4);
    }

    #[test]
    fn header_fields_deserialize_from_text_or_list() {
        let fields: Vec<HeaderField> = serde_json::from_str(r#"["one", ["two", "three"]]"#).unwrap();
        assert_eq!(fields[0], HeaderField::from("one"));
        assert_eq!(fields[1], HeaderField::from(vec!["two", "three"]));
    }

    #[test]
    fn from_header_map_keeps_repeated_values() {
        let mut map = HeaderMap::new();
        map.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        map.append(SET_COOKIE, HeaderValue::from_static("b=2"));
        map.insert("x-raw", HeaderValue::from_bytes(b"\xff").unwrap());

        let headers = HeaderView::from_header_map(&map);
        assert_eq!(headers.values_of("Set-Cookie"), vec!["a=1", "b=2"]);
        assert_eq!(headers.value_of("X-Raw"), Some("<binary>"));
    }
}

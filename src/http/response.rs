use serde::{Deserialize, Serialize};

use super::headers::HeaderView;
use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::value::Value;

/// A finished HTTP exchange as the harness receives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseInput {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl ResponseInput {
    /// Drain a reqwest response. The body is decoded as lossy UTF-8.
    pub async fn from_reqwest(response: reqwest::Response) -> Result<Self, HarnessError> {
        let status = response.status().as_u16();
        let headers = HeaderView::from_header_map(response.headers())
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        let bytes = response.bytes().await?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        Ok(Self { status, headers, body })
    }

    pub fn header_view(&self) -> HeaderView {
        self.headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect()
    }

    /// Media type of the body without parameters such as `charset`.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.split(';').next().unwrap_or_default().trim())
    }

    pub fn is_json(&self, config: &HarnessConfig) -> bool {
        self.content_type()
            .is_some_and(|content_type| config.is_json_content_type(content_type))
    }
}

/// What a script sees as `response`. Lives only for one harness call.
#[derive(Debug, Clone)]
pub struct ResponseView {
    body: Value,
    status: u16,
    headers: HeaderView,
}

impl ResponseView {
    pub fn new(body: Value, status: u16, headers: HeaderView) -> Self {
        Self { body, status, headers }
    }

    /// Parsed body in JSON mode, raw text otherwise.
    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HeaderView {
        &self.headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(content_type: Option<&str>) -> ResponseInput {
        ResponseInput {
            status: 200,
            headers: content_type
                .map(|value| vec![("Content-Type".to_string(), value.to_string())])
                .unwrap_or_default(),
            body: "{}".to_string(),
        }
    }

    #[test]
    fn content_type_strips_parameters() {
        assert_eq!(
            input(Some("application/json; charset=utf-8")).content_type(),
            Some("application/json")
        );
        assert_eq!(input(Some("text/plain")).content_type(), Some("text/plain"));
        assert_eq!(input(None).content_type(), None);
    }

    #[test]
    fn is_json_uses_configured_media_types() {
        let config = HarnessConfig::default();
        assert!(input(Some("application/json;charset=utf-8")).is_json(&config));
        assert!(input(Some("Application/JSON")).is_json(&config));
        assert!(!input(Some("application/problem+json")).is_json(&config));
        assert!(!input(None).is_json(&config));

        let config = HarnessConfig {
            json_content_types: vec!["application/problem+json".to_string()],
            ..HarnessConfig::default()
        };
        assert!(input(Some("application/problem+json")).is_json(&config));
    }

    #[tokio::test]
    async fn from_reqwest_captures_status_headers_and_body() {
        let response = http::Response::builder()
            .status(201)
            .header("Content-Type", "application/json; charset=utf-8")
            .header("X-Trace", "a")
            .header("x-trace", "b")
            .body(r#"{"ok":true}"#)
            .unwrap();

        let input = ResponseInput::from_reqwest(reqwest::Response::from(response)).await.unwrap();

        assert_eq!(input.status, 201);
        assert_eq!(input.body, r#"{"ok":true}"#);
        assert!(input.is_json(&HarnessConfig::default()));
        assert_eq!(input.header_view().values_of("X-Trace"), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn from_reqwest_decodes_invalid_utf8_lossily() {
        let response = http::Response::builder()
            .status(500)
            .body(vec![0xff, b'o', b'k'])
            .unwrap();

        let input = ResponseInput::from_reqwest(reqwest::Response::from(response)).await.unwrap();

        assert_eq!(input.status, 500);
        assert_eq!(input.body, "\u{fffd}ok");
        assert!(input.headers.is_empty());
    }

    #[test]
    fn header_view_keeps_order() {
        let input = ResponseInput {
            status: 204,
            headers: vec![
                ("X-A".to_string(), "1".to_string()),
                ("x-a".to_string(), "2".to_string()),
            ],
            body: String::new(),
        };
        assert_eq!(input.header_view().values_of("X-A"), vec!["1", "2"]);
    }
}

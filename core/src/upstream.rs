//! Upstream addressing and response normalization.
//!
//! Mailchimp API keys end in a data-center suffix (`<key>-us21`) that selects
//! the regional host. `UpstreamBase` turns a key into a base URL from a
//! `{dc}` template; `interpret_response` turns a raw upstream response into
//! either the JSON payload or an `UpstreamFailure`.

use serde_json::Value;

use crate::error::{RouteError, UpstreamFailure};
use crate::http::HttpResponse;
use crate::types::MailchimpErrorBody;

pub const DEFAULT_DATA_CENTER: &str = "us13";
pub const DEFAULT_BASE_TEMPLATE: &str = "https://{dc}.api.mailchimp.com/3.0";

const DC_PLACEHOLDER: &str = "{dc}";

/// Data-center segment of an API key: the part after the first hyphen, up to
/// the next one. Falls back to `DEFAULT_DATA_CENTER`.
pub fn data_center(api_key: &str) -> &str {
    api_key
        .split('-')
        .nth(1)
        .filter(|dc| !dc.is_empty())
        .unwrap_or(DEFAULT_DATA_CENTER)
}

/// Base URL template for the upstream API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamBase {
    template: String,
}

impl UpstreamBase {
    pub fn new(template: &str) -> Self {
        Self {
            template: template.trim_end_matches('/').to_string(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Resolve the base URL for `api_key`.
    pub fn base_url(&self, api_key: &str) -> Result<String, RouteError> {
        let dc = data_center(api_key);
        if !dc.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(RouteError::InvalidDataCenter);
        }
        Ok(self.template.replace(DC_PLACEHOLDER, dc))
    }
}

impl Default for UpstreamBase {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_TEMPLATE)
    }
}

/// Normalize an upstream response.
///
/// A successful empty body, as sent by the campaign actions and deletes,
/// yields `null` whatever its content type. JSON bodies are returned on
/// success and turned into `UpstreamFailure::Application` (carrying `detail`)
/// otherwise. Everything else is an unexpected response carrying the raw text.
pub fn interpret_response(response: &HttpResponse) -> Result<Value, UpstreamFailure> {
    let status = response.status;

    if response.is_success() && response.body.trim().is_empty() {
        return Ok(Value::Null);
    }

    if response.is_json() {
        let data: Value = serde_json::from_str(&response.body).map_err(|_| {
            UpstreamFailure::UnexpectedResponse {
                status,
                body: response.body.clone(),
            }
        })?;
        if !response.is_success() {
            return Err(UpstreamFailure::Application {
                status,
                detail: error_detail(data, &response.body),
            });
        }
        return Ok(data);
    }

    Err(UpstreamFailure::UnexpectedResponse {
        status,
        body: response.body.clone(),
    })
}

/// `detail`, then `title`, then the raw body.
fn error_detail(data: Value, raw: &str) -> String {
    match serde_json::from_value::<MailchimpErrorBody>(data) {
        Ok(err) if !err.detail.is_empty() => err.detail,
        Ok(err) if !err.title.is_empty() => err.title,
        _ => raw.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn json_response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.to_string(),
        }
    }

    #[test]
    fn data_center_from_key_suffix() {
        assert_eq!(data_center("abc123-us21"), "us21");
        assert_eq!(data_center("abc123"), "us13");
        assert_eq!(data_center("abc123-"), "us13");
        assert_eq!(data_center("abc-us5-extra"), "us5");
    }

    #[test]
    fn base_url_substitutes_data_center() {
        let base = UpstreamBase::default();
        assert_eq!(
            base.base_url("abc123-us21").unwrap(),
            "https://us21.api.mailchimp.com/3.0"
        );
        assert_eq!(
            base.base_url("abc123").unwrap(),
            "https://us13.api.mailchimp.com/3.0"
        );
    }

    #[test]
    fn base_url_rejects_host_injection() {
        let base = UpstreamBase::default();
        assert_eq!(
            base.base_url("abc-evil.com#"),
            Err(RouteError::InvalidDataCenter)
        );
    }

    #[test]
    fn template_trailing_slash_is_stripped() {
        let base = UpstreamBase::new("http://127.0.0.1:9000/{dc}/");
        assert_eq!(base.base_url("k-us2").unwrap(), "http://127.0.0.1:9000/us2");
    }

    #[test]
    fn success_json_is_returned() {
        let data = interpret_response(&json_response(200, r#"{"id":"1"}"#)).unwrap();
        assert_eq!(data, json!({"id": "1"}));
    }

    #[test]
    fn error_json_carries_detail() {
        let err = interpret_response(&json_response(
            404,
            r#"{"type":"t","title":"Resource Not Found","status":404,"detail":"not found"}"#,
        ))
        .unwrap_err();
        assert_eq!(
            err,
            UpstreamFailure::Application {
                status: 404,
                detail: "not found".to_string()
            }
        );
        assert_eq!(err.to_string(), "Mailchimp API error: not found");
    }

    #[test]
    fn error_json_without_detail_falls_back_to_title() {
        let err = interpret_response(&json_response(401, r#"{"title":"API Key Invalid"}"#))
            .unwrap_err();
        assert!(err.to_string().contains("API Key Invalid"));
    }

    #[test]
    fn non_json_is_unexpected() {
        let response = HttpResponse {
            status: 502,
            headers: vec![("content-type".to_string(), "text/html".to_string())],
            body: "<html>bad gateway</html>".to_string(),
        };
        let err = interpret_response(&response).unwrap_err();
        assert_eq!(err.to_string(), "Unexpected response: <html>bad gateway</html>");
    }

    #[test]
    fn empty_success_is_null() {
        let response = HttpResponse {
            status: 204,
            headers: Vec::new(),
            body: String::new(),
        };
        assert_eq!(interpret_response(&response).unwrap(), Value::Null);
    }

    #[test]
    fn empty_success_with_json_content_type_is_null() {
        let response = HttpResponse {
            status: 204,
            headers: vec![(
                "content-type".to_string(),
                "application/json; charset=utf-8".to_string(),
            )],
            body: String::new(),
        };
        assert_eq!(interpret_response(&response).unwrap(), Value::Null);
    }

    #[test]
    fn empty_error_with_json_content_type_is_unexpected() {
        let err = interpret_response(&json_response(500, "")).unwrap_err();
        assert!(matches!(err, UpstreamFailure::UnexpectedResponse { status: 500, .. }));
    }

    #[test]
    fn error_json_without_detail_or_title_carries_raw_body() {
        let err = interpret_response(&json_response(400, r#"{"errors":["bad email"]}"#))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"Mailchimp API error: {"errors":["bad email"]}"#
        );
    }

    #[test]
    fn malformed_json_is_unexpected() {
        let err = interpret_response(&json_response(200, "{not json")).unwrap_err();
        assert!(matches!(err, UpstreamFailure::UnexpectedResponse { status: 200, .. }));
    }
}

//! The closed dispatch table from envelope `(endpoint, method)` to an
//! upstream Mailchimp request.
//!
//! # Design
//! `Route::resolve` is the only place endpoint strings are compared. Each
//! `Route` then builds its upstream call as a pure function of the envelope
//! body and the base URL, so the whole table can be checked without I/O.

use serde_json::Value;

use crate::error::RouteError;
use crate::http::{HttpMethod, HttpRequest};
use crate::types::{CreateSegment, Envelope, SegmentDefinition};
use crate::upstream::UpstreamBase;

/// Every logical route the proxy accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Ping,
    ListLists,
    ListCampaigns,
    CreateCampaign,
    GetCampaign,
    UpdateCampaign,
    DeleteCampaign,
    ReplicateCampaign,
    SendCampaign,
    ListSegments,
    CreateSegment,
    GetSegment,
    UpdateSegment,
    DeleteSegment,
    UpdateContact,
}

/// Method and URL of the upstream call, plus its JSON body if any.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamCall {
    pub method: HttpMethod,
    pub url: String,
    pub body: Option<Value>,
}

impl UpstreamCall {
    fn new(method: HttpMethod, url: String) -> Self {
        Self {
            method,
            url,
            body: None,
        }
    }

    fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

pub const PING: &str = "/ping";
pub const LISTS: &str = "/lists";
pub const CAMPAIGNS: &str = "/campaigns";
pub const CAMPAIGN: &str = "/campaigns/:id";
pub const CAMPAIGN_REPLICATE: &str = "/campaigns/replicate";
pub const CAMPAIGN_SEND: &str = "/campaigns/send";
pub const SEGMENTS: &str = "/lists/:listId/segments";
pub const SEGMENT: &str = "/lists/:listId/segments/:segmentId";
pub const UPDATE_CONTACT: &str = "/lists/update-contact";

const ENDPOINTS: [&str; 9] = [
    PING,
    LISTS,
    CAMPAIGNS,
    CAMPAIGN,
    CAMPAIGN_REPLICATE,
    CAMPAIGN_SEND,
    SEGMENTS,
    SEGMENT,
    UPDATE_CONTACT,
];

impl Route {
    pub const ALL: [Route; 15] = [
        Route::Ping,
        Route::ListLists,
        Route::ListCampaigns,
        Route::CreateCampaign,
        Route::GetCampaign,
        Route::UpdateCampaign,
        Route::DeleteCampaign,
        Route::ReplicateCampaign,
        Route::SendCampaign,
        Route::ListSegments,
        Route::CreateSegment,
        Route::GetSegment,
        Route::UpdateSegment,
        Route::DeleteSegment,
        Route::UpdateContact,
    ];

    /// Whether `endpoint` is one of the tags in the table, for any method.
    pub fn is_known_endpoint(endpoint: &str) -> bool {
        ENDPOINTS.contains(&endpoint)
    }

    /// Look up the route for an envelope.
    ///
    /// The campaign actions and contact update accept any envelope method;
    /// their upstream verb is fixed.
    pub fn resolve(endpoint: &str, method: HttpMethod) -> Result<Route, RouteError> {
        use HttpMethod::*;

        let route = match (endpoint, method) {
            (PING, Get) => Route::Ping,
            (LISTS, Get) => Route::ListLists,
            (CAMPAIGNS, Get) => Route::ListCampaigns,
            (CAMPAIGNS, Post) => Route::CreateCampaign,
            (CAMPAIGN, Get) => Route::GetCampaign,
            (CAMPAIGN, Patch) => Route::UpdateCampaign,
            (CAMPAIGN, Delete) => Route::DeleteCampaign,
            (CAMPAIGN_REPLICATE, _) => Route::ReplicateCampaign,
            (CAMPAIGN_SEND, _) => Route::SendCampaign,
            (SEGMENTS, Get) => Route::ListSegments,
            (SEGMENTS, Post) => Route::CreateSegment,
            (SEGMENT, Get) => Route::GetSegment,
            (SEGMENT, Patch) => Route::UpdateSegment,
            (SEGMENT, Delete) => Route::DeleteSegment,
            (UPDATE_CONTACT, _) => Route::UpdateContact,
            _ if Route::is_known_endpoint(endpoint) => {
                return Err(RouteError::UnsupportedMethod {
                    endpoint: endpoint.to_string(),
                    method: method.to_string(),
                });
            }
            _ => return Err(RouteError::InvalidEndpoint(endpoint.to_string())),
        };
        Ok(route)
    }

    /// The envelope endpoint tag for this route.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Route::Ping => PING,
            Route::ListLists => LISTS,
            Route::ListCampaigns | Route::CreateCampaign => CAMPAIGNS,
            Route::GetCampaign | Route::UpdateCampaign | Route::DeleteCampaign => CAMPAIGN,
            Route::ReplicateCampaign => CAMPAIGN_REPLICATE,
            Route::SendCampaign => CAMPAIGN_SEND,
            Route::ListSegments | Route::CreateSegment => SEGMENTS,
            Route::GetSegment | Route::UpdateSegment | Route::DeleteSegment => SEGMENT,
            Route::UpdateContact => UPDATE_CONTACT,
        }
    }

    /// The method a client should put in the envelope for this route.
    pub fn envelope_method(&self) -> HttpMethod {
        match self {
            Route::CreateCampaign
            | Route::ReplicateCampaign
            | Route::SendCampaign
            | Route::CreateSegment => HttpMethod::Post,
            Route::UpdateCampaign | Route::UpdateSegment | Route::UpdateContact => {
                HttpMethod::Patch
            }
            Route::DeleteCampaign | Route::DeleteSegment => HttpMethod::Delete,
            Route::Ping
            | Route::ListLists
            | Route::ListCampaigns
            | Route::GetCampaign
            | Route::ListSegments
            | Route::GetSegment => HttpMethod::Get,
        }
    }

    /// Build the upstream call for this route.
    pub fn build(&self, base_url: &str, body: Option<&Value>) -> Result<UpstreamCall, RouteError> {
        use HttpMethod::*;

        let call = match self {
            Route::Ping => UpstreamCall::new(Get, format!("{base_url}/ping")),
            Route::ListLists => UpstreamCall::new(Get, format!("{base_url}/lists")),
            Route::ListCampaigns => UpstreamCall::new(Get, format!("{base_url}/campaigns")),
            Route::CreateCampaign => {
                let campaign = body
                    .filter(|b| b.is_object())
                    .cloned()
                    .ok_or(RouteError::MissingField("body"))?;
                UpstreamCall::new(Post, format!("{base_url}/campaigns")).with_body(campaign)
            }
            Route::GetCampaign => {
                let id = path_param(body, "campaignId")?;
                UpstreamCall::new(Get, format!("{base_url}/campaigns/{id}"))
            }
            Route::UpdateCampaign => {
                let id = path_param(body, "campaignId")?;
                let data = payload(body, "data")?;
                UpstreamCall::new(Patch, format!("{base_url}/campaigns/{id}")).with_body(data)
            }
            Route::DeleteCampaign => {
                let id = path_param(body, "campaignId")?;
                UpstreamCall::new(Delete, format!("{base_url}/campaigns/{id}"))
            }
            Route::ReplicateCampaign => {
                let id = path_param(body, "campaignId")?;
                UpstreamCall::new(Post, format!("{base_url}/campaigns/{id}/actions/replicate"))
            }
            Route::SendCampaign => {
                let id = path_param(body, "campaignId")?;
                UpstreamCall::new(Post, format!("{base_url}/campaigns/{id}/actions/send"))
            }
            Route::ListSegments => {
                let list_id = path_param(body, "listId")?;
                UpstreamCall::new(Get, format!("{base_url}/lists/{list_id}/segments"))
            }
            Route::CreateSegment => {
                let list_id = path_param(body, "listId")?;
                let definition = segment_definition(body)?;
                let segment = serde_json::to_value(&definition)
                    .map_err(|e| RouteError::SerializationError(e.to_string()))?;
                UpstreamCall::new(Post, format!("{base_url}/lists/{list_id}/segments"))
                    .with_body(segment)
            }
            Route::GetSegment => {
                let (list_id, segment_id) = segment_params(body)?;
                UpstreamCall::new(
                    Get,
                    format!("{base_url}/lists/{list_id}/segments/{segment_id}"),
                )
            }
            Route::UpdateSegment => {
                let (list_id, segment_id) = segment_params(body)?;
                let data = payload(body, "data")?;
                UpstreamCall::new(
                    Patch,
                    format!("{base_url}/lists/{list_id}/segments/{segment_id}"),
                )
                .with_body(data)
            }
            Route::DeleteSegment => {
                let (list_id, segment_id) = segment_params(body)?;
                UpstreamCall::new(
                    Delete,
                    format!("{base_url}/lists/{list_id}/segments/{segment_id}"),
                )
            }
            Route::UpdateContact => {
                let list_id = path_param(body, "listId")?;
                let hash = path_param(body, "subscriberHash")?;
                let data = payload(body, "data")?;
                UpstreamCall::new(Patch, format!("{base_url}/lists/{list_id}/members/{hash}"))
                    .with_body(data)
            }
        };
        Ok(call)
    }
}

/// Map an envelope to the complete upstream request, auth headers included.
///
/// The route is resolved before the API key is looked at, so an unknown
/// endpoint is always reported as such.
pub fn upstream_request(
    envelope: &Envelope,
    base: &UpstreamBase,
) -> Result<HttpRequest, RouteError> {
    let route = Route::resolve(&envelope.endpoint, envelope.method)?;
    let base_url = base.base_url(&envelope.api_key)?;
    let call = route.build(&base_url, envelope.body.as_ref())?;
    let body = call
        .body
        .map(|b| serde_json::to_string(&b))
        .transpose()
        .map_err(|e| RouteError::SerializationError(e.to_string()))?;

    Ok(HttpRequest {
        method: call.method,
        path: call.url,
        headers: vec![
            (
                "authorization".to_string(),
                format!("Bearer {}", envelope.api_key),
            ),
            ("content-type".to_string(), "application/json".to_string()),
        ],
        body,
    })
}

/// A non-empty string or number usable as a single URL path segment.
fn path_param(body: Option<&Value>, field: &'static str) -> Result<String, RouteError> {
    let value = match body.and_then(|b| b.get(field)) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Null) | None => return Err(RouteError::MissingField(field)),
        Some(_) => return Err(RouteError::InvalidField(field)),
    };
    if value.is_empty() {
        return Err(RouteError::MissingField(field));
    }
    if value
        .chars()
        .any(|c| matches!(c, '/' | '?' | '#' | '%' | '\\') || c.is_whitespace())
    {
        return Err(RouteError::InvalidField(field));
    }
    Ok(value)
}

fn payload(body: Option<&Value>, field: &'static str) -> Result<Value, RouteError> {
    body.and_then(|b| b.get(field))
        .filter(|v| !v.is_null())
        .cloned()
        .ok_or(RouteError::MissingField(field))
}

fn segment_params(body: Option<&Value>) -> Result<(String, String), RouteError> {
    Ok((path_param(body, "listId")?, path_param(body, "segmentId")?))
}

fn segment_definition(body: Option<&Value>) -> Result<SegmentDefinition, RouteError> {
    let name = body
        .and_then(|b| b.get("segmentName"))
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or(RouteError::MissingField("segmentName"))?;
    let mut request: CreateSegment = body
        .cloned()
        .map(serde_json::from_value::<CreateSegment>)
        .transpose()
        .map_err(|e| RouteError::InvalidBody(e.to_string()))?
        .unwrap_or_default();
    request.name = name.to_string();
    Ok(request.into())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const BASE: &str = "https://us21.api.mailchimp.com/3.0";

    #[test]
    fn every_route_resolves_from_its_own_tag() {
        for route in Route::ALL {
            assert_eq!(
                Route::resolve(route.endpoint(), route.envelope_method()),
                Ok(route),
                "{route:?}"
            );
        }
    }

    #[test]
    fn unknown_endpoint_is_invalid() {
        let err = Route::resolve("/automations", HttpMethod::Get).unwrap_err();
        assert_eq!(err, RouteError::InvalidEndpoint("/automations".to_string()));
        assert_eq!(err.to_string(), "Invalid endpoint");
    }

    #[test]
    fn known_endpoint_with_wrong_method_is_unsupported() {
        let err = Route::resolve(CAMPAIGNS, HttpMethod::Delete).unwrap_err();
        assert!(matches!(err, RouteError::UnsupportedMethod { .. }));
        let err = Route::resolve(SEGMENTS, HttpMethod::Patch).unwrap_err();
        assert!(matches!(err, RouteError::UnsupportedMethod { .. }));
    }

    #[test]
    fn actions_accept_any_method() {
        for method in [HttpMethod::Get, HttpMethod::Post, HttpMethod::Patch, HttpMethod::Delete] {
            assert_eq!(Route::resolve(CAMPAIGN_SEND, method), Ok(Route::SendCampaign));
            assert_eq!(Route::resolve(UPDATE_CONTACT, method), Ok(Route::UpdateContact));
        }
    }

    #[test]
    fn replicate_builds_action_url() {
        let call = Route::ReplicateCampaign
            .build(BASE, Some(&json!({"campaignId": "abc"})))
            .unwrap();
        assert_eq!(call.method, HttpMethod::Post);
        assert_eq!(call.url, format!("{BASE}/campaigns/abc/actions/replicate"));
        assert!(call.body.is_none());
    }

    #[test]
    fn missing_campaign_id_is_reported() {
        let err = Route::GetCampaign.build(BASE, Some(&json!({}))).unwrap_err();
        assert_eq!(err, RouteError::MissingField("campaignId"));
        let err = Route::SendCampaign.build(BASE, None).unwrap_err();
        assert_eq!(err, RouteError::MissingField("campaignId"));
        let err = Route::GetCampaign
            .build(BASE, Some(&json!({"campaignId": ""})))
            .unwrap_err();
        assert_eq!(err, RouteError::MissingField("campaignId"));
    }

    #[test]
    fn path_traversal_is_rejected() {
        let err = Route::GetCampaign
            .build(BASE, Some(&json!({"campaignId": "../lists"})))
            .unwrap_err();
        assert_eq!(err, RouteError::InvalidField("campaignId"));
    }

    #[test]
    fn numeric_segment_id_is_accepted() {
        let call = Route::GetSegment
            .build(BASE, Some(&json!({"listId": "l1", "segmentId": 77})))
            .unwrap();
        assert_eq!(call.url, format!("{BASE}/lists/l1/segments/77"));
    }

    #[test]
    fn static_segment_payload() {
        let call = Route::CreateSegment
            .build(
                BASE,
                Some(&json!({
                    "listId": "l1",
                    "segmentName": "VIP",
                    "emails": ["a@x.com", "b@x.com"]
                })),
            )
            .unwrap();
        let body = call.body.unwrap();
        assert_eq!(body["static_segment"], json!(["a@x.com", "b@x.com"]));
        assert!(body.get("options").is_none());
    }

    #[test]
    fn dynamic_segment_payload() {
        let call = Route::CreateSegment
            .build(
                BASE,
                Some(&json!({
                    "listId": "l1",
                    "segmentName": "Lapsed",
                    "emails": [],
                    "conditions": [{"field": "x"}]
                })),
            )
            .unwrap();
        let body = call.body.unwrap();
        assert_eq!(body["options"], json!({"match": "any", "conditions": [{"field": "x"}]}));
        assert!(body.get("static_segment").is_none());
    }

    #[test]
    fn null_emails_selects_dynamic_segment() {
        let call = Route::CreateSegment
            .build(
                BASE,
                Some(&json!({
                    "listId": "l1",
                    "segmentName": "S",
                    "emails": null,
                    "conditions": [{"field": "x"}]
                })),
            )
            .unwrap();
        let body = call.body.unwrap();
        assert_eq!(body["options"], json!({"match": "any", "conditions": [{"field": "x"}]}));
        assert!(body.get("static_segment").is_none());
    }

    #[test]
    fn null_conditions_sends_empty_list() {
        let call = Route::CreateSegment
            .build(
                BASE,
                Some(&json!({"listId": "l1", "segmentName": "S", "conditions": null})),
            )
            .unwrap();
        assert_eq!(
            call.body.unwrap(),
            json!({"name": "S", "options": {"match": "any", "conditions": []}})
        );
    }

    #[test]
    fn known_endpoints_ignore_method() {
        assert!(Route::is_known_endpoint(SEGMENT));
        assert!(Route::is_known_endpoint(UPDATE_CONTACT));
        assert!(!Route::is_known_endpoint("/automations"));
        assert!(!Route::is_known_endpoint("/campaigns/"));
    }

    #[test]
    fn segment_with_bad_match_mode_is_invalid_body() {
        let err = Route::CreateSegment
            .build(
                BASE,
                Some(&json!({"listId": "l1", "segmentName": "S", "match": "some"})),
            )
            .unwrap_err();
        assert!(matches!(err, RouteError::InvalidBody(_)));
    }

    #[test]
    fn update_contact_forwards_data() {
        let call = Route::UpdateContact
            .build(
                BASE,
                Some(&json!({
                    "listId": "l1",
                    "subscriberHash": "f1e2",
                    "data": {"status": "unsubscribed"}
                })),
            )
            .unwrap();
        assert_eq!(call.method, HttpMethod::Patch);
        assert_eq!(call.url, format!("{BASE}/lists/l1/members/f1e2"));
        assert_eq!(call.body, Some(json!({"status": "unsubscribed"})));
    }

    #[test]
    fn upstream_request_attaches_bearer_auth() {
        let envelope = Envelope {
            api_key: "abc123-us21".to_string(),
            method: HttpMethod::Get,
            endpoint: CAMPAIGNS.to_string(),
            body: None,
        };
        let req = upstream_request(&envelope, &UpstreamBase::default()).unwrap();
        assert_eq!(req.path, "https://us21.api.mailchimp.com/3.0/campaigns");
        assert_eq!(req.header("Authorization"), Some("Bearer abc123-us21"));
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert!(req.body.is_none());
    }

    #[test]
    fn invalid_endpoint_wins_over_bad_key() {
        let envelope = Envelope {
            api_key: "abc-evil.com#".to_string(),
            method: HttpMethod::Get,
            endpoint: "/nope".to_string(),
            body: None,
        };
        let err = upstream_request(&envelope, &UpstreamBase::default()).unwrap_err();
        assert!(matches!(err, RouteError::InvalidEndpoint(_)));
    }
}

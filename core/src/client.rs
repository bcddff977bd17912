//! Stateless request builder and response parser for the proxy endpoint.
//!
//! # Design
//! `ProxyClient` holds only the proxy base URL and the API key. Each logical
//! operation is split into a `build_*` method that produces the envelope
//! `HttpRequest` and a `parse_*` method that consumes the proxy's
//! `HttpResponse`. The caller executes the round-trip in between.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::route::Route;
use crate::types::{
    Campaign, CampaignList, CreateCampaign, CreateSegment, Envelope, MailingListCollection, Ping,
    ProxyFailure, ProxySuccess, Segment, SegmentList, UpdateCampaign, UpdateSegment,
};

/// Path of the dispatch endpoint on the proxy.
pub const PROXY_PATH: &str = "/api/mailchimp";

const FALLBACK_MESSAGE: &str = "An error occurred";

/// Envelope builder and parser bound to one proxy and one API key.
#[derive(Clone)]
pub struct ProxyClient {
    base_url: String,
    api_key: String,
}

impl fmt::Debug for ProxyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ProxyClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn endpoint_url(&self) -> String {
        format!("{}{PROXY_PATH}", self.base_url)
    }

    // --- build ---

    pub fn build_ping(&self) -> Result<HttpRequest, ApiError> {
        self.envelope(Route::Ping, None)
    }

    pub fn build_get_lists(&self) -> Result<HttpRequest, ApiError> {
        self.envelope(Route::ListLists, None)
    }

    pub fn build_get_campaigns(&self) -> Result<HttpRequest, ApiError> {
        self.envelope(Route::ListCampaigns, None)
    }

    pub fn build_get_campaign(&self, campaign_id: &str) -> Result<HttpRequest, ApiError> {
        self.envelope(Route::GetCampaign, Some(json!({ "campaignId": campaign_id })))
    }

    pub fn build_create_campaign(&self, input: &CreateCampaign) -> Result<HttpRequest, ApiError> {
        self.envelope(Route::CreateCampaign, Some(to_value(input)?))
    }

    pub fn build_update_campaign(
        &self,
        campaign_id: &str,
        input: &UpdateCampaign,
    ) -> Result<HttpRequest, ApiError> {
        let body = json!({ "campaignId": campaign_id, "data": to_value(input)? });
        self.envelope(Route::UpdateCampaign, Some(body))
    }

    pub fn build_delete_campaign(&self, campaign_id: &str) -> Result<HttpRequest, ApiError> {
        self.envelope(Route::DeleteCampaign, Some(json!({ "campaignId": campaign_id })))
    }

    pub fn build_replicate_campaign(&self, campaign_id: &str) -> Result<HttpRequest, ApiError> {
        self.envelope(Route::ReplicateCampaign, Some(json!({ "campaignId": campaign_id })))
    }

    pub fn build_send_campaign(&self, campaign_id: &str) -> Result<HttpRequest, ApiError> {
        self.envelope(Route::SendCampaign, Some(json!({ "campaignId": campaign_id })))
    }

    pub fn build_get_segments(&self, list_id: &str) -> Result<HttpRequest, ApiError> {
        self.envelope(Route::ListSegments, Some(json!({ "listId": list_id })))
    }

    pub fn build_get_segment(
        &self,
        list_id: &str,
        segment_id: &str,
    ) -> Result<HttpRequest, ApiError> {
        let body = json!({ "listId": list_id, "segmentId": segment_id });
        self.envelope(Route::GetSegment, Some(body))
    }

    pub fn build_create_segment(
        &self,
        list_id: &str,
        input: &CreateSegment,
    ) -> Result<HttpRequest, ApiError> {
        let mut body = match to_value(input)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        body.insert("listId".to_string(), Value::String(list_id.to_string()));
        self.envelope(Route::CreateSegment, Some(Value::Object(body)))
    }

    pub fn build_update_segment(
        &self,
        list_id: &str,
        segment_id: &str,
        input: &UpdateSegment,
    ) -> Result<HttpRequest, ApiError> {
        let body = json!({ "listId": list_id, "segmentId": segment_id, "data": to_value(input)? });
        self.envelope(Route::UpdateSegment, Some(body))
    }

    pub fn build_delete_segment(
        &self,
        list_id: &str,
        segment_id: &str,
    ) -> Result<HttpRequest, ApiError> {
        let body = json!({ "listId": list_id, "segmentId": segment_id });
        self.envelope(Route::DeleteSegment, Some(body))
    }

    pub fn build_update_contact(
        &self,
        list_id: &str,
        subscriber_hash: &str,
        data: &Value,
    ) -> Result<HttpRequest, ApiError> {
        let body = json!({ "listId": list_id, "subscriberHash": subscriber_hash, "data": data });
        self.envelope(Route::UpdateContact, Some(body))
    }

    // --- parse ---

    pub fn parse_ping(&self, response: HttpResponse) -> Result<Ping, ApiError> {
        parse_data(response)
    }

    pub fn parse_get_lists(
        &self,
        response: HttpResponse,
    ) -> Result<MailingListCollection, ApiError> {
        parse_data(response)
    }

    pub fn parse_get_campaigns(&self, response: HttpResponse) -> Result<CampaignList, ApiError> {
        parse_data(response)
    }

    pub fn parse_get_campaign(&self, response: HttpResponse) -> Result<Campaign, ApiError> {
        parse_data(response)
    }

    pub fn parse_create_campaign(&self, response: HttpResponse) -> Result<Campaign, ApiError> {
        parse_data(response)
    }

    pub fn parse_update_campaign(&self, response: HttpResponse) -> Result<Campaign, ApiError> {
        parse_data(response)
    }

    pub fn parse_delete_campaign(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn parse_replicate_campaign(&self, response: HttpResponse) -> Result<Campaign, ApiError> {
        parse_data(response)
    }

    pub fn parse_send_campaign(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn parse_get_segments(&self, response: HttpResponse) -> Result<SegmentList, ApiError> {
        parse_data(response)
    }

    pub fn parse_get_segment(&self, response: HttpResponse) -> Result<Segment, ApiError> {
        parse_data(response)
    }

    pub fn parse_create_segment(&self, response: HttpResponse) -> Result<Segment, ApiError> {
        parse_data(response)
    }

    pub fn parse_update_segment(&self, response: HttpResponse) -> Result<Segment, ApiError> {
        parse_data(response)
    }

    pub fn parse_delete_segment(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn parse_update_contact(&self, response: HttpResponse) -> Result<Value, ApiError> {
        parse_data(response)
    }

    fn envelope(&self, route: Route, body: Option<Value>) -> Result<HttpRequest, ApiError> {
        let envelope = Envelope {
            api_key: self.api_key.clone(),
            method: route.envelope_method(),
            endpoint: route.endpoint().to_string(),
            body,
        };
        let body = serde_json::to_string(&envelope)
            .map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: self.endpoint_url(),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }
}

fn to_value<T: serde::Serialize>(input: &T) -> Result<Value, ApiError> {
    serde_json::to_value(input).map_err(|e| ApiError::SerializationError(e.to_string()))
}

/// Unwrap `{"data": ...}` from a successful proxy response.
fn parse_data<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_str::<ProxySuccess<T>>(&response.body)
        .map(|success| success.data)
        .map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map a non-2xx proxy response to `ApiError::Proxy`, using the proxy's
/// `error` text when there is one.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let message = serde_json::from_str::<ProxyFailure>(&response.body)
        .map(|failure| failure.error)
        .ok()
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
    Err(ApiError::Proxy {
        status: response.status,
        message,
    })
}

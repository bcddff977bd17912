//! One function per logical operation, hiding the envelope and transport.
//!
//! Every action is build → execute → parse on top of `ProxyClient`. Failures
//! propagate, except in `validate_credentials`, which reports a boolean.

use serde_json::Value;
use tracing::{debug, warn};

use crate::client::ProxyClient;
use crate::error::ApiError;
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    Campaign, CampaignList, CreateCampaign, CreateSegment, MailingListCollection, Segment,
    SegmentList, UpdateCampaign, UpdateSegment,
};

/// Client action layer over the proxy endpoint.
#[derive(Debug, Clone)]
pub struct MailchimpActions<T = UreqTransport> {
    client: ProxyClient,
    transport: T,
}

impl MailchimpActions<UreqTransport> {
    /// Actions against the proxy at `proxy_url`, using a blocking `ureq` agent.
    pub fn new(proxy_url: &str, api_key: &str) -> Self {
        Self::with_transport(ProxyClient::new(proxy_url, api_key), UreqTransport::new())
    }
}

impl<T: Transport> MailchimpActions<T> {
    pub fn with_transport(client: ProxyClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &ProxyClient {
        &self.client
    }

    /// Ping through the proxy. Any failure is logged and reported as `false`.
    pub fn validate_credentials(&self) -> bool {
        let outcome = self
            .client
            .build_ping()
            .and_then(|req| self.transport.execute(req))
            .and_then(|resp| self.client.parse_ping(resp));
        match outcome {
            Ok(ping) => {
                debug!(health_status = %ping.health_status, "credentials validated");
                true
            }
            Err(err) => {
                warn!(error = %err, "credential validation failed");
                false
            }
        }
    }

    pub fn get_lists(&self) -> Result<MailingListCollection, ApiError> {
        let req = self.client.build_get_lists()?;
        self.client.parse_get_lists(self.transport.execute(req)?)
    }

    pub fn get_campaigns(&self) -> Result<CampaignList, ApiError> {
        let req = self.client.build_get_campaigns()?;
        self.client.parse_get_campaigns(self.transport.execute(req)?)
    }

    pub fn get_campaign(&self, campaign_id: &str) -> Result<Campaign, ApiError> {
        let req = self.client.build_get_campaign(campaign_id)?;
        self.client.parse_get_campaign(self.transport.execute(req)?)
    }

    pub fn create_campaign(&self, input: &CreateCampaign) -> Result<Campaign, ApiError> {
        let req = self.client.build_create_campaign(input)?;
        self.client.parse_create_campaign(self.transport.execute(req)?)
    }

    pub fn update_campaign(
        &self,
        campaign_id: &str,
        input: &UpdateCampaign,
    ) -> Result<Campaign, ApiError> {
        let req = self.client.build_update_campaign(campaign_id, input)?;
        self.client.parse_update_campaign(self.transport.execute(req)?)
    }

    pub fn delete_campaign(&self, campaign_id: &str) -> Result<(), ApiError> {
        let req = self.client.build_delete_campaign(campaign_id)?;
        self.client.parse_delete_campaign(self.transport.execute(req)?)
    }

    pub fn replicate_campaign(&self, campaign_id: &str) -> Result<Campaign, ApiError> {
        let req = self.client.build_replicate_campaign(campaign_id)?;
        self.client.parse_replicate_campaign(self.transport.execute(req)?)
    }

    /// Not idempotent: every call asks Mailchimp to send the campaign.
    pub fn send_campaign(&self, campaign_id: &str) -> Result<(), ApiError> {
        let req = self.client.build_send_campaign(campaign_id)?;
        self.client.parse_send_campaign(self.transport.execute(req)?)
    }

    pub fn get_segments(&self, list_id: &str) -> Result<SegmentList, ApiError> {
        let req = self.client.build_get_segments(list_id)?;
        self.client.parse_get_segments(self.transport.execute(req)?)
    }

    pub fn get_segment(&self, list_id: &str, segment_id: &str) -> Result<Segment, ApiError> {
        let req = self.client.build_get_segment(list_id, segment_id)?;
        self.client.parse_get_segment(self.transport.execute(req)?)
    }

    pub fn create_segment(
        &self,
        list_id: &str,
        input: &CreateSegment,
    ) -> Result<Segment, ApiError> {
        let req = self.client.build_create_segment(list_id, input)?;
        self.client.parse_create_segment(self.transport.execute(req)?)
    }

    pub fn update_segment(
        &self,
        list_id: &str,
        segment_id: &str,
        input: &UpdateSegment,
    ) -> Result<Segment, ApiError> {
        let req = self.client.build_update_segment(list_id, segment_id, input)?;
        self.client.parse_update_segment(self.transport.execute(req)?)
    }

    pub fn delete_segment(&self, list_id: &str, segment_id: &str) -> Result<(), ApiError> {
        let req = self.client.build_delete_segment(list_id, segment_id)?;
        self.client.parse_delete_segment(self.transport.execute(req)?)
    }

    pub fn update_contact(
        &self,
        list_id: &str,
        subscriber_hash: &str,
        data: &Value,
    ) -> Result<Value, ApiError> {
        let req = self.client.build_update_contact(list_id, subscriber_hash, data)?;
        self.client.parse_update_contact(self.transport.execute(req)?)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::http::{HttpRequest, HttpResponse};

    /// Replays canned results and records what was sent.
    struct Scripted {
        replies: RefCell<Vec<Result<HttpResponse, ApiError>>>,
        sent: RefCell<Vec<HttpRequest>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<HttpResponse, ApiError>>) -> Self {
            Self {
                replies: RefCell::new(replies),
                sent: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for Scripted {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.sent.borrow_mut().push(request);
            self.replies.borrow_mut().remove(0)
        }
    }

    fn reply(status: u16, body: &str) -> Result<HttpResponse, ApiError> {
        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        })
    }

    fn actions(replies: Vec<Result<HttpResponse, ApiError>>) -> MailchimpActions<Scripted> {
        MailchimpActions::with_transport(
            ProxyClient::new("http://proxy", "key-us21"),
            Scripted::new(replies),
        )
    }

    #[test]
    fn validate_credentials_true_on_pong() {
        let pong = r#"{"data":{"health_status":"Everything's Chimpy!"}}"#;
        let actions = actions(vec![reply(200, pong)]);
        assert!(actions.validate_credentials());
        let sent = actions.transport.sent.borrow();
        let envelope: Value = serde_json::from_str(sent[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(envelope["endpoint"], "/ping");
    }

    #[test]
    fn validate_credentials_false_on_transport_failure() {
        let actions = actions(vec![Err(ApiError::Transport("connection refused".to_string()))]);
        assert!(!actions.validate_credentials());
    }

    #[test]
    fn validate_credentials_false_on_rejection() {
        let actions = actions(vec![reply(
            401,
            r#"{"error":"Mailchimp API error: Your API key may be invalid","status":401}"#,
        )]);
        assert!(!actions.validate_credentials());
    }

    #[test]
    fn validate_credentials_false_on_malformed_json() {
        let actions = actions(vec![reply(200, "{{{")]);
        assert!(!actions.validate_credentials());
    }

    #[test]
    fn get_campaign_propagates_proxy_error() {
        let actions = actions(vec![reply(
            404,
            r#"{"error":"Mailchimp API error: not found","status":404}"#,
        )]);
        let err = actions.get_campaign("missing").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn repeated_reads_issue_independent_calls() {
        let body = r#"{"data":{"id":"1"}}"#;
        let actions = actions(vec![reply(200, body), reply(200, body)]);
        let first = actions.get_campaign("1").unwrap();
        let second = actions.get_campaign("1").unwrap();
        assert_eq!(first, second);
        assert_eq!(actions.transport.sent.borrow().len(), 2);
    }

    #[test]
    fn transport_error_propagates_from_regular_actions() {
        let actions = actions(vec![Err(ApiError::Transport("timed out".to_string()))]);
        assert!(matches!(actions.get_lists(), Err(ApiError::Transport(_))));
    }
}

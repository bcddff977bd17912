//! Domain DTOs for the Mailchimp Marketing API and the proxy envelope.
//!
//! # Design
//! Upstream-owned entities (`Campaign`, `Segment`, `MailingList`) are carried
//! through unchanged; fields Mailchimp omits on some resources default rather
//! than fail, and unknown fields are ignored.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::http::HttpMethod;

// ---------------------------------------------------------------------------
// Campaigns
// ---------------------------------------------------------------------------

/// A campaign as returned by `GET /campaigns/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Campaign {
    pub id: String,
    #[serde(default)]
    pub web_id: u64,
    #[serde(rename = "type", default)]
    pub campaign_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_time: Option<String>,
    #[serde(default)]
    pub emails_sent: u64,
    #[serde(default)]
    pub settings: CampaignSettings,
    #[serde(default)]
    pub recipients: Recipients,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_summary: Option<ReportSummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CampaignSettings {
    #[serde(default)]
    pub subject_line: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub from_name: String,
    #[serde(default)]
    pub reply_to: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recipients {
    #[serde(default)]
    pub list_id: String,
    #[serde(default)]
    pub list_name: String,
    #[serde(default)]
    pub segment_text: String,
    #[serde(default)]
    pub recipient_count: u64,
}

/// Engagement numbers attached to sent campaigns. Rates are fractions in `0..=1`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReportSummary {
    #[serde(default)]
    pub opens: u64,
    #[serde(default)]
    pub unique_opens: u64,
    #[serde(default)]
    pub open_rate: f64,
    #[serde(default)]
    pub clicks: u64,
    #[serde(default)]
    pub subscriber_clicks: u64,
    #[serde(default)]
    pub click_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CampaignList {
    #[serde(default)]
    pub campaigns: Vec<Campaign>,
    #[serde(default)]
    pub total_items: u64,
}

/// Payload for `POST /campaigns`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateCampaign {
    #[serde(rename = "type")]
    pub campaign_type: String,
    pub settings: CampaignSettings,
    pub recipients: RecipientsInput,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecipientsInput {
    pub list_id: String,
}

/// Partial update for `PATCH /campaigns/{id}`. Omitted fields stay unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateCampaign {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<UpdateCampaignSettings>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateCampaignSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

/// An audience. Read-only from this crate's perspective.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MailingList {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub contact: ListContact,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListContact {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub address1: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MailingListCollection {
    #[serde(default)]
    pub lists: Vec<MailingList>,
    #[serde(default)]
    pub total_items: u64,
}

// ---------------------------------------------------------------------------
// Segments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Any,
    All,
}

/// Rule of a dynamic segment, evaluated by Mailchimp.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SegmentRule {
    #[serde(rename = "match", default)]
    pub match_mode: MatchMode,
    #[serde(default)]
    pub conditions: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub member_count: u64,
    #[serde(rename = "type", default)]
    pub segment_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<SegmentRule>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SegmentList {
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub total_items: u64,
}

/// Segment creation request as carried in the envelope body.
///
/// A non-empty `emails` makes a static segment; otherwise `match_mode` and
/// `conditions` describe a dynamic one. `null` reads as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CreateSegment {
    #[serde(rename = "segmentName")]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub emails: Vec<String>,
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub match_mode: Option<MatchMode>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub conditions: Vec<Value>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Partial update for `PATCH /lists/{list_id}/segments/{segment_id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateSegment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_segment: Option<Vec<String>>,
}

/// The body forwarded to `POST /lists/{list_id}/segments`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SegmentDefinition {
    pub name: String,
    #[serde(flatten)]
    pub kind: SegmentKind,
}

/// Exactly one of `static_segment` or `options` appears on the wire.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum SegmentKind {
    #[serde(rename = "static_segment")]
    Static(Vec<String>),
    #[serde(rename = "options")]
    Dynamic(SegmentRule),
}

impl From<CreateSegment> for SegmentDefinition {
    fn from(input: CreateSegment) -> Self {
        let kind = if input.emails.is_empty() {
            SegmentKind::Dynamic(SegmentRule {
                match_mode: input.match_mode.unwrap_or_default(),
                conditions: input.conditions,
            })
        } else {
            SegmentKind::Static(input.emails)
        };
        Self {
            name: input.name,
            kind,
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope and response shapes
// ---------------------------------------------------------------------------

/// The sole message format between client and proxy.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub api_key: String,
    pub method: HttpMethod,
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("api_key", &"<redacted>")
            .field("method", &self.method)
            .field("endpoint", &self.endpoint)
            .field("body", &self.body)
            .finish()
    }
}

/// Successful proxy response: `{"data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProxySuccess<T> {
    pub data: T,
}

/// Failed proxy response: `{"error": "...", "status": 500}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProxyFailure {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

/// Mailchimp's problem-details error object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MailchimpErrorBody {
    #[serde(rename = "type", default)]
    pub error_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub detail: String,
}

/// Response of `GET /ping`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ping {
    pub health_status: String,
}

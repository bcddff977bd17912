//! Client core for the Mailchimp forwarding proxy.
//!
//! # Overview
//! Everything here is plain data in, plain data out. The client side builds
//! envelope requests for the proxy and parses its responses; the proxy side
//! maps an envelope onto one upstream Mailchimp request through a closed
//! dispatch table and normalizes what comes back. Network I/O lives behind
//! the `Transport` trait (client) or in the proxy crate (upstream).
//!
//! # Design
//! - `ProxyClient` is stateless: proxy base URL plus API key.
//! - Each operation is split into `build_*` and `parse_*`, so the I/O
//!   boundary is explicit; `MailchimpActions` composes them over a transport.
//! - `Route` is an exhaustive enum; adding an endpoint means adding a
//!   variant, and the compiler points at every match that needs it.

pub mod actions;
pub mod client;
pub mod error;
pub mod http;
pub mod route;
pub mod transport;
pub mod types;
pub mod upstream;

pub use actions::MailchimpActions;
pub use client::{ProxyClient, PROXY_PATH};
pub use error::{ApiError, RouteError, UpstreamFailure};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use route::{upstream_request, Route, UpstreamCall};
pub use transport::{Transport, UreqTransport};
pub use types::{
    Campaign, CampaignList, CampaignSettings, CreateCampaign, CreateSegment, Envelope,
    MailchimpErrorBody, MailingList, MailingListCollection, MatchMode, Ping, ProxyFailure,
    ProxySuccess, Recipients, RecipientsInput, ReportSummary, Segment, SegmentDefinition,
    SegmentKind, SegmentList, SegmentRule, UpdateCampaign, UpdateCampaignSettings, UpdateSegment,
};
pub use upstream::{data_center, interpret_response, UpstreamBase};

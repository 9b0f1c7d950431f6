//! Embedded messaging HTTP client
//!
//! Implements [`MessageFetcher`] and [`TelemetryReporter`] against the REST API.
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use log::debug;
use serde::Serialize;
use url::Url;

use super::wire::{EmbeddedMessagesResponse, ErrorBody};
use super::{FetchRequest, MessageFetcher, TelemetryReporter};
use crate::config::SdkConfig;
use crate::error::FetchError;
use crate::models::{EmbeddedImpression, EmbeddedSession, Identity, MessageId};

pub const MESSAGES_PATH: &str = "/embedded-messaging/messages";
pub const RECEIVED_EVENT_PATH: &str = "/embedded-messaging/events/received";
pub const CLICK_EVENT_PATH: &str = "/embedded-messaging/events/click";
pub const DISMISS_EVENT_PATH: &str = "/embedded-messaging/events/dismiss";
pub const SESSION_EVENT_PATH: &str = "/embedded-messaging/events/session";

/// Per-request ceiling; retry and backoff are left to the caller
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeviceInfo<'a> {
    platform: &'a str,
    device_id: &'a str,
    app_package_name: &'a str,
}

/// Identity, device and timestamp fields wrapped around every event body
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a, T> {
    #[serde(flatten)]
    event: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    device_info: DeviceInfo<'a>,
    /// Received events carry no timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReceivedEvent<'a> {
    message_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClickEvent<'a> {
    message_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    button_identifier: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    clicked_url: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DismissEvent<'a> {
    message_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    button_identifier: Option<&'a str>,
}

#[derive(Serialize)]
struct SessionEvent<'a> {
    session: &'a EmbeddedSession,
    impressions: &'a [EmbeddedImpression],
}

/// Blocking client for the embedded messaging endpoints
pub struct ApiClient {
    config: SdkConfig,
    agent: ureq::Agent,
}

impl ApiClient {
    /// Create a new client
    pub fn new(config: SdkConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .http_status_as_error(false)
            .build()
            .into();
        Self { config, agent }
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        Url::parse(&format!("{}{}", self.config.base_url.trim_end_matches('/'), path))
    }

    /// Build the messages request URL
    pub(crate) fn messages_url(&self, request: &FetchRequest) -> Result<Url, url::ParseError> {
        let mut url = self.endpoint(MESSAGES_PATH)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair(request.identity.field_name(), request.identity.as_str());
            query.append_pair("platform", &self.config.platform);
            query.append_pair("sdkVersion", &self.config.sdk_version);
            query.append_pair("packageName", &self.config.package_name);
            for placement_id in &request.placement_ids {
                query.append_pair("placementIds", &placement_id.to_string());
            }
            for message_id in &request.current_message_ids {
                query.append_pair("currentMessageId", message_id.as_str());
            }
        }
        Ok(url)
    }

    fn device_info(&self) -> DeviceInfo<'_> {
        DeviceInfo {
            platform: &self.config.platform,
            device_id: &self.config.device_id,
            app_package_name: &self.config.package_name,
        }
    }

    fn envelope<'a, T>(
        &'a self,
        identity: &'a Identity,
        event: T,
        created_at: Option<i64>,
    ) -> Envelope<'a, T> {
        let (user_id, email) = match identity {
            Identity::UserId(id) => (Some(id.as_str()), None),
            Identity::Email(email) => (None, Some(email.as_str())),
        };
        Envelope {
            event,
            user_id,
            email,
            device_info: self.device_info(),
            created_at,
        }
    }

    fn post_event<T: Serialize>(&self, path: &str, event: &T) -> Result<()> {
        let url = self.endpoint(path).context("Failed to build event URL")?;

        let mut response = self
            .agent
            .post(url.as_str())
            .header("Api-Key", &self.config.api_key)
            .send_json(event)
            .with_context(|| format!("Failed to send event to {}", path))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .body_mut()
                .read_json::<ErrorBody>()
                .ok()
                .and_then(|body| body.msg);
            return Err(anyhow::Error::new(FetchError::Http { status, message })
                .context(format!("Event {} rejected", path)));
        }
        Ok(())
    }

    /// Report that the user tapped a message or one of its buttons
    pub fn track_click(
        &self,
        identity: &Identity,
        message_id: &MessageId,
        button_identifier: Option<&str>,
        clicked_url: Option<&str>,
    ) -> Result<()> {
        let event = ClickEvent {
            message_id: message_id.as_str(),
            button_identifier,
            clicked_url,
        };
        let body = self.envelope(identity, event, Some(Utc::now().timestamp_millis()));
        self.post_event(CLICK_EVENT_PATH, &body)
    }

    /// Report that the user dismissed a message
    pub fn track_dismiss(
        &self,
        identity: &Identity,
        message_id: &MessageId,
        button_identifier: Option<&str>,
    ) -> Result<()> {
        let event = DismissEvent {
            message_id: message_id.as_str(),
            button_identifier,
        };
        let body = self.envelope(identity, event, Some(Utc::now().timestamp_millis()));
        self.post_event(DISMISS_EVENT_PATH, &body)
    }

    /// Report a display session and the impressions recorded during it
    pub fn track_session(
        &self,
        identity: &Identity,
        session: &EmbeddedSession,
        impressions: &[EmbeddedImpression],
    ) -> Result<()> {
        anyhow::ensure!(!session.id.is_empty(), "Session id must not be empty");

        let event = SessionEvent {
            session,
            impressions,
        };
        let body = self.envelope(identity, event, Some(Utc::now().timestamp_millis()));
        self.post_event(SESSION_EVENT_PATH, &body)
    }
}

impl MessageFetcher for ApiClient {
    fn fetch(&self, request: &FetchRequest) -> Result<EmbeddedMessagesResponse, FetchError> {
        let url = self
            .messages_url(request)
            .map_err(|e| FetchError::Transport(format!("Invalid messages URL: {}", e)))?;

        debug!(
            "Fetching embedded messages for {} ({} placements, {} known)",
            request.identity,
            request.placement_ids.len(),
            request.current_message_ids.len()
        );

        let mut response = self
            .agent
            .get(url.as_str())
            .header("Api-Key", &self.config.api_key)
            .call()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .body_mut()
                .read_json::<ErrorBody>()
                .ok()
                .and_then(|body| body.msg);
            return Err(FetchError::Http { status, message });
        }

        response
            .body_mut()
            .read_json::<EmbeddedMessagesResponse>()
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))
    }
}

impl TelemetryReporter for ApiClient {
    fn report_received(&self, identity: &Identity, message_id: &MessageId) -> Result<()> {
        let event = ReceivedEvent {
            message_id: message_id.as_str(),
        };
        self.post_event(RECEIVED_EVENT_PATH, &self.envelope(identity, event, None))
    }
}

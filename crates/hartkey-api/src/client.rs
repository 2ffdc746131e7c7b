// Async HTTP client for the Hartkey cloud API.
//
// Two services are involved: the household service (device list, door
// opening) and the events service (open history). Auth is a bearer token
// supplied per call so the caller stays in charge of token validity.

use chrono::{Duration as ChronoDuration, Utc};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{DevicesResponse, EventsResponse, OPEN_EVENT_TYPES, RawDevice, RawEvent};
use crate::transport::TransportConfig;

pub const DEFAULT_HOUSEHOLD_URL: &str = "https://household.key.rt.ru/api/v2/app/";
pub const DEFAULT_EVENTS_URL: &str = "https://events.key.rt.ru/api/v2/";

/// Largest page the events service is known to honor.
pub const MAX_EVENT_PAGE: u32 = 100;

/// How far back the events query looks.
const EVENT_WINDOW_DAYS: i64 = 7;

const BODY_PREVIEW_LEN: usize = 200;

// ── Endpoints ────────────────────────────────────────────────────────

/// Base URLs of the two remote services.
///
/// Both are normalized to end with `/` so relative paths join correctly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub household: Url,
    pub events: Url,
}

impl Endpoints {
    pub fn new(household: &str, events: &str) -> Result<Self, Error> {
        Ok(Self {
            household: normalize_base_url(household)?,
            events: normalize_base_url(events)?,
        })
    }

    /// Serve both services from one base URL (reverse proxies, test servers).
    pub fn single(base: &str) -> Result<Self, Error> {
        Self::new(base, base)
    }

    /// The production Hartkey cloud services.
    pub fn cloud() -> Result<Self, Error> {
        Self::new(DEFAULT_HOUSEHOLD_URL, DEFAULT_EVENTS_URL)
    }
}

/// Same as [`Endpoints::cloud`].
///
/// # Panics
///
/// Only if [`DEFAULT_HOUSEHOLD_URL`] or [`DEFAULT_EVENTS_URL`] stop being
/// valid base URLs, which the unit tests pin down.
impl Default for Endpoints {
    fn default() -> Self {
        Self::cloud().expect("built-in endpoint URLs parse")
    }
}

fn normalize_base_url(raw: &str) -> Result<Url, Error> {
    let mut url = Url::parse(raw)?;
    if url.cannot_be_a_base() {
        return Err(Error::InvalidUrl(
            url::ParseError::RelativeUrlWithCannotBeABaseBase,
        ));
    }
    let path = url.path().trim_end_matches('/').to_owned();
    url.set_path(&format!("{path}/"));
    Ok(url)
}

// ── Client ───────────────────────────────────────────────────────────

/// Raw client for the three remote operations.
///
/// Performs no retries and keeps no auth state: every method takes the
/// bearer token explicitly and reports failures exactly once.
pub struct HartkeyClient {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl HartkeyClient {
    /// Build a client with its own `reqwest::Client`.
    pub fn new(endpoints: Endpoints, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, endpoints })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, endpoints: Endpoints) -> Self {
        Self { http, endpoints }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    // ── Operations ──────────────────────────────────────────────────

    /// List all devices attached to the account, in the order the service
    /// reports them.
    pub async fn list_devices(&self, token: &SecretString) -> Result<Vec<RawDevice>, Error> {
        let url = self.household_url(&["devices", "intercom"])?;
        debug!("GET {url}");

        let resp = self
            .http
            .get(url)
            .bearer_auth(token.expose_secret())
            .send()
            .await?;
        let envelope: DevicesResponse = Self::handle_response(resp).await?;
        Ok(envelope.data.devices)
    }

    /// List the most recent open events of one device, newest first.
    ///
    /// `limit` is clamped to `1..=MAX_EVENT_PAGE`. A page larger than what
    /// was asked for means the service ignored the limit, which is reported
    /// as a deserialization error rather than silently truncated.
    pub async fn list_recent_events(
        &self,
        token: &SecretString,
        device_id: &str,
        limit: u32,
    ) -> Result<Vec<RawEvent>, Error> {
        let limit = limit.clamp(1, MAX_EVENT_PAGE);
        let url = self.events_url(&["events", "list"])?;

        let end = Utc::now();
        let begin = end - ChronoDuration::days(EVENT_WINDOW_DAYS);
        let params = [
            ("begin_raised_at", begin.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
            ("end_raised_at", end.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
            ("device_ids", device_id.to_owned()),
            ("event_types", OPEN_EVENT_TYPES.join(",")),
            ("sort_by", "raised_at".to_owned()),
            ("sort_order", "desc".to_owned()),
            ("offset", "0".to_owned()),
            ("limit", limit.to_string()),
        ];
        debug!(device_id, limit, "GET {url}");

        let resp = self
            .http
            .get(url)
            .bearer_auth(token.expose_secret())
            .query(&params)
            .send()
            .await?;
        let envelope: EventsResponse = Self::handle_response(resp).await?;
        let items = envelope.data.items;

        if items.len() > limit as usize {
            return Err(Error::Deserialization {
                message: format!(
                    "events page overflow: asked for at most {limit}, got {}",
                    items.len()
                ),
                body: String::new(),
            });
        }

        let total = items.len();
        let mut events: Vec<RawEvent> = items
            .into_iter()
            .filter(|e| e.device_id == device_id)
            .collect();
        if events.len() != total {
            trace!(
                device_id,
                dropped = total - events.len(),
                "ignoring events for other devices"
            );
        }
        events.sort_by(|a, b| b.raised_at.cmp(&a.raised_at));
        Ok(events)
    }

    /// Ask the service to open the door or gate behind `device_id`.
    pub async fn open(&self, token: &SecretString, device_id: &str) -> Result<(), Error> {
        let url = self.household_url(&["devices", device_id, "open"])?;
        debug!("POST {url}");

        let resp = self
            .http
            .post(url)
            .bearer_auth(token.expose_secret())
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp, Some(device_id)).await)
        }
    }

    // ── URL builders ────────────────────────────────────────────────

    fn household_url(&self, segments: &[&str]) -> Result<Url, Error> {
        append_segments(&self.endpoints.household, segments)
    }

    fn events_url(&self, segments: &[&str]) -> Result<Url, Error> {
        append_segments(&self.endpoints.events, segments)
    }

    // ── Response handling ───────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::parse_error(status, resp, None).await);
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview = &body[..floor_char_boundary(&body, BODY_PREVIEW_LEN)];
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }

    async fn parse_error(
        status: StatusCode,
        resp: reqwest::Response,
        device_id: Option<&str>,
    ) -> Error {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Error::Authentication {
                status: status.as_u16(),
            };
        }

        let raw = resp.text().await.unwrap_or_default();
        let message = if raw.is_empty() {
            status.to_string()
        } else {
            raw[..floor_char_boundary(&raw, BODY_PREVIEW_LEN)].to_owned()
        };

        match (status, device_id) {
            (StatusCode::CONFLICT | StatusCode::LOCKED, Some(id)) => Error::DeviceBusy {
                device_id: id.to_owned(),
                message,
            },
            (s, _) if s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS => {
                Error::Server {
                    status: s.as_u16(),
                    message,
                }
            }
            (s, _) => Error::Api {
                status: s.as_u16(),
                message,
            },
        }
    }
}

fn append_segments(base: &Url, segments: &[&str]) -> Result<Url, Error> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Largest index `<= max` that falls on a char boundary of `s`.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

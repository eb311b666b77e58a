//! HTTP client for the remote log service.
//!
//! The service stores one log per identity and always exchanges the whole
//! collection:
//!
//! - `POST {base}/log/save` with `{"email", "apiKey", "log": [record..]}`
//! - `POST {base}/log/load` with `{"email", "apiKey"}`, answered by `[record..]`
//!
//! where a record is `{"id", "category", "start", "end"}` with every value a
//! string and timestamps in RFC 3339. Loaded records that are incomplete or
//! unparseable are skipped one by one; only an unusable envelope fails the
//! whole load.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Url;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use tm_core::{EntryId, Identity, RemoteError, RemoteLog, TimeEntry};

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const SAVE_PATH: &str = "log/save";
const LOAD_PATH: &str = "log/load";

/// Errors constructing a [`HttpRemoteLog`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The base URL could not be parsed.
    #[error("invalid base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

/// [`RemoteLog`] over HTTP.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone)]
pub struct HttpRemoteLog {
    http: reqwest::Client,
    base_url: Url,
}

impl fmt::Debug for HttpRemoteLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRemoteLog")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpRemoteLog {
    /// Creates a client for the service rooted at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = parse_base_url(base_url)?;
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(ClientError::ClientBuild)?;
        Ok(Self { http, base_url })
    }

    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
        self.base_url
            .join(path)
            .map_err(|err| RemoteError::Network(format!("invalid endpoint {path}: {err}")))
    }

    async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<String, RemoteError> {
        let url = self.endpoint(path)?;
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        let text = response.text().await.map_err(network_error)?;
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl RemoteLog for HttpRemoteLog {
    async fn push(&self, identity: &Identity, entries: &[TimeEntry]) -> Result<(), RemoteError> {
        let body = SaveRequest {
            email: identity.email(),
            api_key: identity.api_key(),
            log: entries.iter().map(WireRecord::from).collect(),
        };
        self.post(SAVE_PATH, &body).await?;
        tracing::debug!(entries = entries.len(), "saved log remotely");
        Ok(())
    }

    async fn pull(&self, identity: &Identity) -> Result<Vec<TimeEntry>, RemoteError> {
        let body = LoadRequest {
            email: identity.email(),
            api_key: identity.api_key(),
        };
        let text = self.post(LOAD_PATH, &body).await?;
        decode_log(&text)
    }
}

#[derive(Debug, Serialize)]
struct SaveRequest<'a> {
    email: &'a str,
    #[serde(rename = "apiKey")]
    api_key: &'a str,
    log: Vec<WireRecord>,
}

#[derive(Debug, Serialize)]
struct LoadRequest<'a> {
    email: &'a str,
    #[serde(rename = "apiKey")]
    api_key: &'a str,
}

#[derive(Debug, Serialize)]
struct WireRecord {
    id: String,
    category: String,
    start: String,
    end: String,
}

impl From<&TimeEntry> for WireRecord {
    fn from(entry: &TimeEntry) -> Self {
        Self {
            id: entry.id().to_string(),
            category: entry.category().to_string(),
            start: format_timestamp(entry.start()),
            end: format_timestamp(entry.end()),
        }
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn network_error(err: reqwest::Error) -> RemoteError {
    RemoteError::Network(err.to_string())
}

fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };
    let mut url = Url::parse(raw.trim()).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    // Endpoints are joined relative to the base, which needs a trailing slash
    // to keep its last path segment.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Decodes a load response, skipping records that do not parse.
pub fn decode_log(body: &str) -> Result<Vec<TimeEntry>, RemoteError> {
    let records: Vec<Value> =
        serde_json::from_str(body).map_err(|err| RemoteError::Decode(err.to_string()))?;

    let total = records.len();
    let entries: Vec<TimeEntry> = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| match decode_record(record) {
            Ok(entry) => Some(entry),
            Err(reason) => {
                tracing::debug!(index, %reason, "skipping remote record");
                None
            }
        })
        .collect();

    if entries.len() < total {
        tracing::warn!(
            skipped = total - entries.len(),
            total,
            "skipped undecodable remote records"
        );
    }
    Ok(entries)
}

fn decode_record(record: &Value) -> Result<TimeEntry, String> {
    let fields = record.as_object().ok_or("record is not an object")?;
    let id = EntryId::from_str(string_field(fields, "id")?).map_err(|err| err.to_string())?;
    let category = string_field(fields, "category")?;
    let start = timestamp_field(fields, "start")?;
    let end = timestamp_field(fields, "end")?;
    TimeEntry::with_id(id, category, start, end).map_err(|err| err.to_string())
}

fn string_field<'a>(fields: &'a Map<String, Value>, name: &str) -> Result<&'a str, String> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("missing string field {name}"))
}

fn timestamp_field(fields: &Map<String, Value>, name: &str) -> Result<DateTime<Utc>, String> {
    let raw = string_field(fields, name)?;
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| format!("invalid {name} timestamp {raw}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ID_A: &str = "67e55044-10b1-426f-9247-bb680e5fe0c8";
    const ID_B: &str = "3f2b1c4e-9a6d-4e1b-8c7f-2d5e6a7b8c9d";

    fn identity() -> Identity {
        Identity::new("me@example.com", "key-123").unwrap()
    }

    fn work_entry() -> TimeEntry {
        TimeEntry::with_id(
            ID_A.parse().unwrap(),
            "Work",
            Utc.with_ymd_and_hms(2025, 5, 17, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 5, 17, 9, 30, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_invalid_base_urls() {
        assert!(matches!(
            HttpRemoteLog::new("not a url"),
            Err(ClientError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            HttpRemoteLog::new("ftp://example.com"),
            Err(ClientError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn base_url_keeps_path_prefix() {
        let client = HttpRemoteLog::new("https://example.com/api").unwrap();
        assert_eq!(
            client.endpoint(SAVE_PATH).unwrap().as_str(),
            "https://example.com/api/log/save"
        );
    }

    #[test]
    fn decode_skips_record_missing_end() {
        let body = format!(
            r#"[
                {{"id":"{ID_A}","category":"Work","start":"2025-05-17T09:00:00Z","end":"2025-05-17T09:30:00Z"}},
                {{"id":"{ID_B}","category":"Rest","start":"2025-05-17T10:00:00Z"}}
            ]"#
        );
        let entries = decode_log(&body).unwrap();
        assert_eq!(entries, vec![work_entry()]);
    }

    #[test]
    fn decode_skips_unparseable_fields() {
        let body = format!(
            r#"[
                {{"id":"nope","category":"Work","start":"2025-05-17T09:00:00Z","end":"2025-05-17T09:30:00Z"}},
                {{"id":"{ID_B}","category":"Work","start":"yesterday","end":"2025-05-17T09:30:00Z"}},
                {{"id":"{ID_B}","category":7,"start":"2025-05-17T09:00:00Z","end":"2025-05-17T09:30:00Z"}},
                {{"id":"{ID_B}","category":"Work","start":"2025-05-17T10:00:00Z","end":"2025-05-17T09:30:00Z"}},
                "not an object"
            ]"#
        );
        assert!(decode_log(&body).unwrap().is_empty());
    }

    #[test]
    fn decode_accepts_offsets_and_fractional_seconds() {
        let body = format!(
            r#"[{{"id":"{ID_A}","category":"Work","start":"2025-05-17T11:00:00.000+02:00","end":"2025-05-17T09:30:00Z"}}]"#
        );
        assert_eq!(decode_log(&body).unwrap(), vec![work_entry()]);
    }

    #[test]
    fn pushed_records_decode_to_equal_entries() {
        let start = Utc.with_ymd_and_hms(2025, 5, 17, 9, 0, 0).unwrap();
        let entry = TimeEntry::with_id(
            ID_A.parse().unwrap(),
            "Work",
            start + chrono::TimeDelta::milliseconds(700),
            start + chrono::TimeDelta::milliseconds(2300),
        )
        .unwrap();

        let body = serde_json::to_string(&[WireRecord::from(&entry)]).unwrap();
        let pulled = decode_log(&body).unwrap();

        assert_eq!(pulled, vec![entry]);
        assert_eq!(pulled[0].duration_secs(), 2);
    }

    #[test]
    fn decode_rejects_non_array_envelope() {
        assert!(matches!(
            decode_log(r#"{"error":"unauthorized"}"#),
            Err(RemoteError::Decode(_))
        ));
        assert!(matches!(decode_log("<html>"), Err(RemoteError::Decode(_))));
    }

    #[test]
    fn repeated_decodes_are_identical() {
        let body = format!(
            r#"[{{"id":"{ID_A}","category":"Work","start":"2025-05-17T09:00:00Z","end":"2025-05-17T09:30:00Z"}}]"#
        );
        assert_eq!(decode_log(&body).unwrap(), decode_log(&body).unwrap());
    }

    #[tokio::test]
    async fn push_sends_full_log_with_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/log/save"))
            .and(body_json(serde_json::json!({
                "email": "me@example.com",
                "apiKey": "key-123",
                "log": [{
                    "id": ID_A,
                    "category": "Work",
                    "start": "2025-05-17T09:00:00Z",
                    "end": "2025-05-17T09:30:00Z",
                }],
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpRemoteLog::new(&server.uri()).unwrap();
        client.push(&identity(), &[work_entry()]).await.unwrap();
    }

    #[tokio::test]
    async fn push_surfaces_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/log/save"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let client = HttpRemoteLog::new(&server.uri()).unwrap();
        let err = client.push(&identity(), &[]).await.unwrap_err();
        assert!(matches!(
            err,
            RemoteError::Status { status: 401, ref body } if body == "bad key"
        ));
    }

    #[tokio::test]
    async fn pull_posts_identity_and_decodes_records() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/log/load"))
            .and(body_json(serde_json::json!({
                "email": "me@example.com",
                "apiKey": "key-123",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": ID_A, "category": "Work", "start": "2025-05-17T09:00:00Z", "end": "2025-05-17T09:30:00Z"},
                {"id": ID_B, "category": "Rest", "start": "2025-05-17T10:00:00Z"},
            ])))
            .mount(&server)
            .await;

        let client = HttpRemoteLog::new(&server.uri()).unwrap();
        let entries = client.pull(&identity()).await.unwrap();
        assert_eq!(entries, vec![work_entry()]);
    }

    #[tokio::test]
    async fn pull_from_unreachable_host_is_network_error() {
        let client = HttpRemoteLog::new("http://127.0.0.1:1").unwrap();
        let err = client.pull(&identity()).await.unwrap_err();
        assert!(matches!(err, RemoteError::Network(_)));
    }
}

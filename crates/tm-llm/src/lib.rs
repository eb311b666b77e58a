//! AI insight integration for the Time Machine logger.
//!
//! Turns the entry log into a prompt for a remote text-generation service and
//! splits the answer into display lines. Three kinds of insight exist:
//! - Tips: daily optimization advice with time gained/lost estimates
//! - Scenarios: the present self and three possible future selves
//! - Timeline: dated milestones the current habits lead to

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tm_core::TimeEntry;

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const GENERATE_PATH: &str = "gemini";
const ENTRY_TIME_FORMAT: &str = "%b %-d, %Y at %-I:%M %p";

/// LLM client errors.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The base URL could not be parsed.
    #[error("invalid base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// API returned an error response.
    #[error("API error: {message}")]
    Api { message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Unknown insight kind name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown insight kind: {0}")]
pub struct UnknownInsightKind(pub String);

/// What the generated text should be about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsightKind {
    Tips,
    Scenarios,
    Timeline,
}

impl InsightKind {
    pub const ALL: [Self; 3] = [Self::Tips, Self::Scenarios, Self::Timeline];

    /// Stable name, also used as the cache key.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tips => "tips",
            Self::Scenarios => "scenarios",
            Self::Timeline => "timeline",
        }
    }

    const fn instructions(self) -> &'static str {
        match self {
            Self::Tips => {
                "You are a productivity assistant. Using the time log below, give daily \
                 optimization tips and productivity insights as bullet points. Estimate how much \
                 time the user gains or loses through specific habits, for example: \
                 \"Losing 10 hours/week to distractions -> project deadline slips by 3 weeks\" or \
                 \"Studying 2 hours a day -> fluent in 6 months\"."
            }
            Self::Scenarios => {
                "Answer with bullet points only and no preamble. You are a fortune teller \
                 reading someone's future from their time log; \"you\" means that person. \
                 Predict things like family life and happiness out of 10. Write each bullet as a \
                 plain paragraph without titles:\n\
                 - 5-6 sentences about your present self.\n\
                 - Your future self if you keep your current habits.\n\
                 - Your future self if your habits get worse.\n\
                 - Your future self if your habits improve."
            }
            Self::Timeline => {
                "Answer with one line per milestone and no preamble. Based on the time log \
                 below, sketch a timeline of where the user's current habits lead: one, three \
                 and six months, then one and five years from now. Start each line with the \
                 point in time, then a short concrete prediction."
            }
        }
    }
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InsightKind {
    type Err = UnknownInsightKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tips" => Ok(Self::Tips),
            "scenarios" => Ok(Self::Scenarios),
            "timeline" => Ok(Self::Timeline),
            _ => Err(UnknownInsightKind(s.to_string())),
        }
    }
}

/// Text-generation client.
///
/// # Thread Safety
///
/// The client is safe to clone and share across threads. Each clone shares
/// the underlying HTTP connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client for the service rooted at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, LlmError> {
        let invalid = |reason: String| LlmError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };
        let mut url = Url::parse(base_url.trim()).map_err(|err| invalid(err.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {}", url.scheme())));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        // Build HTTP client with timeout
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(LlmError::ClientBuild)?;

        Ok(Self {
            http,
            base_url: url,
        })
    }

    /// Generates an insight of `kind` for `entries`, rendering times in `tz`.
    ///
    /// Returns the answer split into trimmed, non-empty lines.
    pub async fn generate<Tz>(
        &self,
        kind: InsightKind,
        entries: &[TimeEntry],
        tz: &Tz,
    ) -> Result<Vec<String>, LlmError>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let prompt = build_prompt(kind, entries, tz);
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };
        let url = self
            .base_url
            .join(GENERATE_PATH)
            .map_err(|err| LlmError::InvalidResponse(format!("invalid endpoint: {err}")))?;

        tracing::debug!(%kind, entries = entries.len(), "requesting insight");
        let response = self.http.post(url).json(&request).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(parse_api_error(&body).unwrap_or_else(|| LlmError::Api {
                message: format!("status {status}: {body}"),
            }));
        }

        let payload: GenerateResponse = serde_json::from_str(&body)
            .map_err(|err| LlmError::InvalidResponse(err.to_string()))?;
        let text = extract_text(payload)?;
        Ok(split_lines(&text))
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

fn extract_text(payload: GenerateResponse) -> Result<String, LlmError> {
    payload
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content.parts.into_iter().next())
        .map(|part| part.text)
        .ok_or_else(|| LlmError::InvalidResponse("missing text content".to_string()))
}

fn parse_api_error(body: &str) -> Option<LlmError> {
    #[derive(Deserialize)]
    struct ErrorPayload {
        error: ErrorDetails,
    }

    #[derive(Deserialize)]
    struct ErrorDetails {
        message: String,
    }

    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .map(|payload| LlmError::Api {
            message: payload.error.message,
        })
}

/// Renders one entry as `category: start - end (N minutes)`.
pub fn render_entry<Tz>(entry: &TimeEntry, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    format!(
        "{}: {} - {} ({} minutes)",
        entry.category(),
        format_local(entry.start(), tz),
        format_local(entry.end(), tz),
        entry.duration().num_minutes()
    )
}

fn format_local<Tz>(ts: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    ts.with_timezone(tz).format(ENTRY_TIME_FORMAT).to_string()
}

/// Builds the full prompt: instructions, a blank line, then the log.
pub fn build_prompt<Tz>(kind: InsightKind, entries: &[TimeEntry], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut lines = vec![kind.instructions().to_string(), String::new()];
    lines.push("Time log:".to_string());
    lines.extend(entries.iter().map(|entry| render_entry(entry, tz)));
    lines.join("\n")
}

/// Splits generated text into trimmed, non-empty lines.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

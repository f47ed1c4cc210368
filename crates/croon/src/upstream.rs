//! HTTP client for the song generation API.
//!
//! Two calls matter: submit a generation, and read back the feed entries for
//! the clips it produced. Every request carries the session cookie.

use reqwest::header::{HeaderMap, HeaderValue, COOKIE, USER_AGENT};
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use croonconf::{ConfigError, SessionToken, UpstreamConfig};

use crate::error::SongError;
use crate::job::{Clip, GenerationJob};
use crate::types::GenerationRequest;

const GENERATE_PATH: &str = "/api/generate/v2/";
const FEED_PATH: &str = "/api/feed/";

/// Longest upstream error body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeneratePayload<'a> {
    Simple {
        gpt_description_prompt: &'a str,
        prompt: &'a str,
        mv: &'a str,
        make_instrumental: bool,
    },
    Custom {
        prompt: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        tags: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<&'a str>,
        mv: &'a str,
        make_instrumental: bool,
    },
}

impl<'a> GeneratePayload<'a> {
    fn new(request: &'a GenerationRequest, model: &'a str) -> Self {
        match request {
            GenerationRequest::SimplePrompt {
                prompt,
                instrumental,
            } => GeneratePayload::Simple {
                gpt_description_prompt: prompt,
                prompt: "",
                mv: model,
                make_instrumental: *instrumental,
            },
            GenerationRequest::CustomLyrics {
                lyrics,
                style,
                title,
                instrumental,
            } => GeneratePayload::Custom {
                prompt: lyrics,
                tags: style.as_deref(),
                title: title.as_deref(),
                mv: model,
                make_instrumental: *instrumental,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    clips: Vec<SubmittedClip>,
}

#[derive(Debug, Deserialize)]
struct SubmittedClip {
    id: String,
}

/// Cookie-authenticated client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SunoClient {
    base_url: String,
    client: reqwest::Client,
}

impl SunoClient {
    pub fn new(config: &UpstreamConfig, token: &SessionToken) -> Result<Self, SongError> {
        let mut cookie = HeaderValue::from_str(token.expose()).map_err(|_| {
            ConfigError::InvalidSessionToken("contains characters not allowed in a header".into())
        })?;
        cookie.set_sensitive(true);

        let user_agent = HeaderValue::from_str(&config.user_agent).map_err(|_| {
            ConfigError::Invalid("upstream.user_agent contains characters not allowed in a header".into())
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, cookie);
        headers.insert(USER_AGENT, user_agent);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit a generation request and return the job it started.
    #[tracing::instrument(skip(self, request), fields(mode = %request.mode()))]
    pub async fn submit(
        &self,
        request: &GenerationRequest,
        model: &str,
    ) -> Result<GenerationJob, SongError> {
        let payload = GeneratePayload::new(request, model);
        let resp = self
            .client
            .post(format!("{}{}", self.base_url, GENERATE_PATH))
            .json(&payload)
            .send()
            .await?;

        let resp = check_status(resp).await?;
        let body: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| SongError::upstream(None, format!("malformed submission response: {}", e)))?;

        let clip_ids = body.clips.into_iter().map(|c| c.id).collect();
        let job = GenerationJob::from_clip_ids(clip_ids)
            .ok_or_else(|| SongError::upstream(None, "submission response contained no clips"))?;

        debug!(job_id = %job, clips = job.clip_ids().len(), "generation submitted");
        Ok(job)
    }

    /// Read the current feed entries for every clip in `job`.
    #[tracing::instrument(skip(self, job), fields(job_id = %job))]
    pub async fn status(&self, job: &GenerationJob) -> Result<Vec<Clip>, SongError> {
        let ids = job.clip_ids().join(",");
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, FEED_PATH))
            .query(&[("ids", ids.as_str())])
            .send()
            .await?;

        let resp = check_status(resp).await?;
        let clips: Vec<Clip> = resp
            .json()
            .await
            .map_err(|e| SongError::upstream(None, format!("malformed feed response: {}", e)))?;

        debug!(clips = clips.len(), "feed read");
        Ok(clips)
    }
}

async fn check_status(resp: Response) -> Result<Response, SongError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(SongError::UpstreamAuth {
            status: status.as_u16(),
        });
    }

    let body = resp
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());
    let message = match status {
        // Captcha challenges are not solved here
        StatusCode::PAYMENT_REQUIRED => format!("captcha or credit check required: {}", truncate(&body)),
        _ => truncate(&body),
    };

    Err(SongError::upstream(Some(status.as_u16()), message))
}

fn truncate(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return "<empty body>".to_string();
    }
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

//! [`AgentApi`] over HTTP, using [`reqwest`].
//!
//! Every endpoint answers JSON. A non-2xx status or a body with
//! `"success": false` becomes [`BankrError::Remote`], carrying the best
//! message the body offers.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use reqwest::Url;
use serde_json::Value;

use super::AgentApi;
use crate::config::ClientConfig;
use crate::consts::API_KEY_HEADER;
use crate::error::{BankrError, Result, UNKNOWN_ERROR};
use crate::job::{Job, JobStatus, PromptResponse};

/// HTTP client for the hosted agent API.
pub struct HttpAgentApi {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpAgentApi {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// Reuse an existing [`reqwest::Client`] (shared connection pool).
    pub fn with_client(client: reqwest::Client, config: ClientConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The key is checked before every request so a missing credential
    /// never reaches the network.
    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(BankrError::missing_api_key)
    }

    /// Append `segments` to the base URL. Each segment is percent-encoded,
    /// so a job id can never add path components, a query or a fragment.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        if let Some(bad) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(BankrError::Validation(format!("invalid path segment: {bad:?}")));
        }
        let base = &self.config.api_url;
        let mut url = Url::parse(base)
            .map_err(|e| BankrError::Validation(format!("invalid API URL {base:?}: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| BankrError::Validation(format!("invalid API URL {base:?}")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Read status + body. The body is consumed as text so that error
    /// payloads which are not valid JSON still produce a sensible error.
    async fn read(response: reqwest::Response) -> Result<(u16, String)> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok((status, body))
    }
}

#[async_trait]
impl AgentApi for HttpAgentApi {
    async fn submit(&self, prompt: &str) -> Result<Job> {
        let key = self.api_key()?;
        tracing::debug!(url = %self.config.api_url, "submitting prompt");

        let response = self
            .client
            .post(self.url(&["agent", "prompt"])?)
            .header(API_KEY_HEADER, key)
            .json(&serde_json::json!({ "prompt": prompt }))
            .send()
            .await?;
        let (status, body) = Self::read(response).await?;
        let accepted: PromptResponse = decode(status, &body)?;

        let job_id = accepted
            .job_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| BankrError::Remote {
                status_code: status,
                message: "no job ID received from API".to_string(),
            })?;

        Ok(Job {
            id: job_id,
            status: accepted.status.unwrap_or(JobStatus::Pending),
            prompt: prompt.to_string(),
            ..Job::default()
        })
    }

    async fn fetch_status(&self, job_id: &str) -> Result<Job> {
        let key = self.api_key()?;
        let response = self
            .client
            .get(self.url(&["agent", "job", job_id])?)
            .header(API_KEY_HEADER, key)
            .send()
            .await?;
        let (status, body) = Self::read(response).await?;
        decode_job(job_id, status, &body)
    }

    async fn cancel(&self, job_id: &str) -> Result<Job> {
        let key = self.api_key()?;
        let response = self
            .client
            .post(self.url(&["agent", "job", job_id, "cancel"])?)
            .header(API_KEY_HEADER, key)
            .header("content-type", "application/json")
            .send()
            .await?;
        let (status, body) = Self::read(response).await?;
        decode_job(job_id, status, &body)
    }
}

fn decode_job(job_id: &str, status: u16, body: &str) -> Result<Job> {
    if status == 404 {
        return Err(BankrError::NotFound {
            job_id: job_id.to_string(),
        });
    }
    decode(status, body)
}

/// Turn a raw response into `T`, or into the matching [`BankrError`].
pub(crate) fn decode<T: DeserializeOwned>(status: u16, body: &str) -> Result<T> {
    let value: Option<Value> = serde_json::from_str(body).ok();
    let success = value
        .as_ref()
        .and_then(|v| v.get("success"))
        .and_then(Value::as_bool);

    if !(200..300).contains(&status) || success == Some(false) {
        return Err(BankrError::Remote {
            status_code: status,
            message: error_message(value.as_ref()),
        });
    }

    let value = value.ok_or_else(|| BankrError::Remote {
        status_code: status,
        message: "malformed response: body is not JSON".to_string(),
    })?;
    serde_json::from_value(value).map_err(|e| BankrError::Remote {
        status_code: status,
        message: format!("malformed response: {e}"),
    })
}

/// `error`, else `message`, else a generic fallback.
fn error_message(body: Option<&Value>) -> String {
    let field = |name: &str| {
        body.and_then(|v| v.get(name))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    field("error")
        .or_else(|| field("message"))
        .unwrap_or_else(|| UNKNOWN_ERROR.to_string())
}

//! HTTP client for the X (Twitter) v2 create-post endpoint

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{OAuthCredentials, PostTransport};
use crate::config::TwitterConfig;
use crate::types::{PublishAttempt, PublishFailure, PublishSuccess};
use crate::{Error, Result};

/// Body of a 201 response
#[derive(Debug, Deserialize)]
struct CreatedPost {
    data: CreatedPostData,
}

#[derive(Debug, Deserialize)]
struct CreatedPostData {
    id: String,
    text: String,
    #[serde(default)]
    edit_history_tweet_ids: Vec<String>,
}

/// RFC 7807-style problem report returned on rejection
#[derive(Debug, Deserialize)]
struct Problem {
    title: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    detail: String,
    status: i32,
}

/// Posting client authenticated as a single user
pub struct XClient {
    http: reqwest::Client,
    credentials: OAuthCredentials,
    endpoint: String,
}

impl XClient {
    /// Create a client from configuration
    pub fn new(config: &TwitterConfig) -> Result<Self> {
        url::Url::parse(&config.endpoint).map_err(|e| {
            Error::config(
                "twitter.endpoint",
                format!("invalid URL {:?}: {}", config.endpoint, e),
            )
        })?;

        Ok(Self {
            http: reqwest::Client::new(),
            credentials: OAuthCredentials::from(config),
            endpoint: config.endpoint.clone(),
        })
    }

    async fn send(&self, text: &str) -> Result<reqwest::Response> {
        let authorization = self
            .credentials
            .authorization_header("POST", &self.endpoint)?;

        let response = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?;
        Ok(response)
    }
}

/// Classify a response into the three publish outcomes
fn interpret(status: StatusCode, body: &str) -> PublishAttempt {
    if status.is_success() {
        return match serde_json::from_str::<CreatedPost>(body) {
            Ok(created) => PublishAttempt::Published(PublishSuccess {
                posted_at: Utc::now(),
                text: created.data.text,
                post_id: created.data.id,
                edit_history_ids: created.data.edit_history_tweet_ids,
            }),
            Err(_) => PublishAttempt::Failed(Error::UnexpectedResponse {
                status: status.as_u16(),
                body: body.to_string(),
            }),
        };
    }

    match serde_json::from_str::<Problem>(body) {
        Ok(problem) => PublishAttempt::Rejected(PublishFailure {
            failed_at: Utc::now(),
            title: problem.title,
            kind: problem.kind,
            detail: problem.detail,
            status: problem.status,
        }),
        Err(_) => PublishAttempt::Failed(Error::UnexpectedResponse {
            status: status.as_u16(),
            body: body.to_string(),
        }),
    }
}

#[async_trait]
impl PostTransport for XClient {
    async fn publish(&self, text: &str) -> PublishAttempt {
        let response = match self.send(text).await {
            Ok(response) => response,
            Err(e) => return PublishAttempt::Failed(e),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return PublishAttempt::Failed(Error::Network(e)),
        };

        tracing::debug!(status = status.as_u16(), "Create-post response received");
        interpret(status, &body)
    }

    fn name(&self) -> &'static str {
        "x-api-v2"
    }
}

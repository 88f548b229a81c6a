use std::sync::Arc;
use std::time::Instant;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use triage_pipeline::{retry_with_policy, Attempt, RetryPolicy};

use crate::error::PlatformError;
use crate::metrics::PlatformMetrics;

#[derive(Debug, Clone, Deserialize)]
pub struct GroupMember {
    pub id: i64,
    pub email: Option<String>,
    pub access_level: i64,
}

/// Thin typed wrapper over the platform's HTTP API. Every call authorizes
/// with a private-token header and is retried under the exponential
/// policy (1s doubling to 32s, 5 attempts, 404 permanent).
pub struct PlatformClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    metrics: Option<Arc<PlatformMetrics>>,
}

impl PlatformClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, timeout: std::time::Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url: base_url.into(),
            token: token.into(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<PlatformMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    async fn get_once(&self, path: &str) -> Attempt<Value, PlatformError> {
        let url = format!("{}{}", self.base_url, path);
        let started = Instant::now();
        let response = match self
            .http
            .get(&url)
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                self.record("transient", started);
                return Attempt::Retryable(PlatformError::Transient(e.to_string()));
            }
        };

        match response.status().as_u16() {
            200..=299 => match response.json::<Value>().await {
                Ok(v) => {
                    self.record("success", started);
                    Attempt::Success(v)
                }
                Err(e) => {
                    self.record("decode_error", started);
                    Attempt::Permanent(PlatformError::Decode(e.to_string()))
                }
            },
            404 => {
                self.record("not_found", started);
                Attempt::Permanent(PlatformError::NotFound)
            }
            status => {
                self.record("transient", started);
                Attempt::Retryable(PlatformError::Transient(format!("status {status}")))
            }
        }
    }

    fn record(&self, outcome: &str, started: Instant) {
        if let Some(metrics) = &self.metrics {
            metrics.observe(outcome, started.elapsed().as_secs_f64());
        }
    }

    /// Fetches `path` under the exponential retry policy shared with
    /// every other platform API call.
    pub async fn fetch(&self, path: &str) -> Result<Value, PlatformError> {
        let policy = RetryPolicy::exponential();
        debug!(path, "fetching platform object");
        retry_with_policy(&policy, |_attempt| self.get_once(path)).await
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Value, PlatformError> {
        self.fetch(&format!("/api/v4/users/{user_id}")).await
    }

    pub async fn get_project(&self, project_id: i64) -> Result<Value, PlatformError> {
        self.fetch(&format!("/api/v4/projects/{project_id}")).await
    }

    pub async fn get_issue(&self, project_id: i64, issue_iid: i64) -> Result<Value, PlatformError> {
        self.fetch(&format!("/api/v4/projects/{project_id}/issues/{issue_iid}"))
            .await
    }

    pub async fn get_issue_note(
        &self,
        project_id: i64,
        issue_iid: i64,
        note_id: i64,
    ) -> Result<Value, PlatformError> {
        self.fetch(&format!(
            "/api/v4/projects/{project_id}/issues/{issue_iid}/notes/{note_id}"
        ))
        .await
    }

    pub async fn get_group(&self, group_id: i64) -> Result<Value, PlatformError> {
        self.fetch(&format!("/api/v4/groups/{group_id}")).await
    }

    pub async fn get_group_members(&self, group_id: i64) -> Result<Vec<GroupMember>, PlatformError> {
        let value = self
            .fetch(&format!("/api/v4/groups/{group_id}/members/all"))
            .await?;
        serde_json::from_value(value).map_err(|e| PlatformError::Decode(e.to_string()))
    }

    pub async fn list_public_snippets(&self) -> Result<Vec<Value>, PlatformError> {
        let value = self.fetch("/api/v4/snippets").await?;
        match value {
            Value::Array(items) => Ok(items),
            other => Ok(vec![other]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_member_deserializes_minimal_shape() {
        let json = serde_json::json!({"id": 3, "email": "a@b.com", "access_level": 40});
        let member: GroupMember = serde_json::from_value(json).unwrap();
        assert_eq!(member.access_level, 40);
        assert_eq!(member.email.as_deref(), Some("a@b.com"));
    }
}

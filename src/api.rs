use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::status::AgentStatusEvent;
use crate::stream::{decode_line, LineFramer, StreamLine, DATA_PREFIX};

/// One prior exchange entry sent with a chat request. Only role and content
/// travel to the backend; message ids and flags stay local.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize)]
struct ChatStreamRequest<'a> {
    message: &'a str,
    history: &'a [HistoryMessage],
}

/// A workflow definition as proxied from the n8n instance. The backend
/// passes raw n8n objects through, so unknown fields are ignored and
/// missing ones default.
#[derive(Debug, Clone, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default, rename = "updatedAt")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowNode {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub node_type: String,
}

/// Flat key/value settings held by the backend (connection URLs, API keys,
/// model name). Encryption at rest is the backend's concern.
pub type SettingsMap = BTreeMap<String, String>;

/// HTTP client for the agent backend.
#[derive(Clone)]
pub struct AgentClient {
    client: Client,
    base_url: String,
}

impl AgentClient {
    pub fn new(base_url: &str) -> Self {
        // No request timeout: chat responses stream for as long as the
        // agent keeps generating.
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn workflows(&self) -> Result<Vec<Workflow>> {
        let url = format!("{}/n8n/workflows", self.base_url);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "workflow list request failed with status: {}",
                response.status()
            ));
        }
        Ok(response.json().await?)
    }

    pub async fn workflow(&self, id: &str) -> Result<Workflow> {
        let url = format!("{}/n8n/workflows/{}", self.base_url, id);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "workflow {} request failed with status: {}",
                id,
                response.status()
            ));
        }
        Ok(response.json().await?)
    }

    pub async fn settings(&self) -> Result<SettingsMap> {
        let url = format!("{}/settings", self.base_url);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "settings request failed with status: {}",
                response.status()
            ));
        }
        Ok(response.json().await?)
    }

    pub async fn update_settings(&self, settings: &SettingsMap) -> Result<()> {
        let url = format!("{}/settings", self.base_url);
        let response = self.client.post(&url).json(settings).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "saving settings failed with status: {}",
                response.status()
            ));
        }
        Ok(())
    }

    /// Stream one chat completion.
    ///
    /// `on_token` is called once per fragment, strictly in arrival order.
    /// Returns when the response body ends; the caller finalizes the
    /// message at that point. One submission makes exactly one attempt.
    pub async fn stream_chat(
        &self,
        message: &str,
        history: &[HistoryMessage],
        mut on_token: impl FnMut(String),
    ) -> Result<()> {
        let url = format!("{}/ai/chat/stream", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&ChatStreamRequest { message, history })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "chat request failed with status: {}",
                response.status()
            ));
        }

        let mut body = response.bytes_stream();
        let mut framer = LineFramer::new();
        let mut done = false;
        let mut apply = |line: &str, done: &mut bool| match decode_line(line) {
            StreamLine::Token(token) => on_token(token),
            StreamLine::Done => *done = true,
            StreamLine::Ignored => {}
        };

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            for line in framer.push(&chunk) {
                apply(&line, &mut done);
            }
        }
        // A final data line without a trailing newline still counts.
        if let Some(line) = framer.finish() {
            apply(&line, &mut done);
        }

        if !done {
            tracing::warn!("chat stream ended without a {} sentinel", crate::stream::DONE_SENTINEL);
        }
        Ok(())
    }

    /// Read status events until the subscription drops.
    ///
    /// Malformed payloads are logged and skipped without affecting the
    /// subscription; reconnecting is the caller's job.
    pub async fn stream_status(&self, mut on_event: impl FnMut(AgentStatusEvent)) -> Result<()> {
        let url = format!("{}/ai/status", self.base_url);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "status subscription failed with status: {}",
                response.status()
            ));
        }

        let mut body = response.bytes_stream();
        let mut framer = LineFramer::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            for line in framer.push(&chunk) {
                let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
                    continue;
                };
                match serde_json::from_str::<AgentStatusEvent>(payload) {
                    Ok(event) => on_event(event),
                    Err(err) => tracing::warn!("dropping malformed status event: {err}"),
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = AgentClient::new("http://localhost:3001/");
        assert_eq!(client.base_url(), "http://localhost:3001");
    }

    #[test]
    fn test_chat_request_shape() {
        let history = vec![HistoryMessage {
            role: "assistant".to_string(),
            content: "Hello!".to_string(),
        }];
        let request = ChatStreamRequest {
            message: "List my workflows",
            history: &history,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["message"], "List my workflows");
        assert_eq!(json["history"][0]["role"], "assistant");
        assert_eq!(json["history"][0]["content"], "Hello!");
    }

    #[test]
    fn test_workflow_deserializes_n8n_shape() {
        let raw = r#"{
            "id": "wf-12",
            "name": "Daily Digest",
            "active": true,
            "nodes": [
                {"name": "Webhook", "type": "n8n-nodes-base.webhook", "position": [0, 0]},
                {"name": "Send Email", "type": "n8n-nodes-base.emailSend"}
            ],
            "connections": {},
            "updatedAt": "2025-11-02T09:30:00.000Z"
        }"#;
        let workflow: Workflow = serde_json::from_str(raw).unwrap();
        assert_eq!(workflow.id, "wf-12");
        assert!(workflow.active);
        assert_eq!(workflow.nodes.len(), 2);
        assert_eq!(workflow.nodes[1].node_type, "n8n-nodes-base.emailSend");
        assert_eq!(
            workflow.updated_at.as_deref(),
            Some("2025-11-02T09:30:00.000Z")
        );
    }

    #[test]
    fn test_workflow_defaults_missing_fields() {
        let workflow: Workflow =
            serde_json::from_str(r#"{"id": "wf-1", "name": "Bare"}"#).unwrap();
        assert!(!workflow.active);
        assert!(workflow.nodes.is_empty());
        assert_eq!(workflow.updated_at, None);
    }
}

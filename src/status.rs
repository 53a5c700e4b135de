use std::time::Duration;

use serde::Deserialize;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::api::AgentClient;
use crate::tui::AppEvent;

/// Fixed delay between reconnect attempts after the subscription drops.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// How long a terminal status stays visible before it is cleared.
pub const STATUS_LINGER: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Thinking,
    ToolCall,
    ToolResult,
    Responding,
    Complete,
    Error,
}

/// A transient notification describing the backend's current processing
/// phase. At most one is live at a time; each event supersedes the last.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentStatusEvent {
    #[serde(rename = "type")]
    pub kind: StatusKind,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "toolName")]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub timestamp: u64,
}

impl AgentStatusEvent {
    /// Terminal events schedule the status line to clear shortly after.
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, StatusKind::Complete | StatusKind::Error)
    }

    /// User-facing text for the status indicator.
    pub fn display(&self) -> String {
        match self.kind {
            StatusKind::Thinking | StatusKind::Error => self.message.clone(),
            StatusKind::ToolCall => {
                let tool = self.tool_name.as_deref().unwrap_or_default();
                match tool_display_name(tool) {
                    Some(label) => label.to_string(),
                    None => format!("Using {}...", tool),
                }
            }
            StatusKind::ToolResult => {
                format!("Completed: {}", self.tool_name.as_deref().unwrap_or_default())
            }
            StatusKind::Responding => "Generating response...".to_string(),
            StatusKind::Complete => "Done!".to_string(),
        }
    }
}

/// Friendly labels for the backend's known workflow tools.
fn tool_display_name(tool: &str) -> Option<&'static str> {
    Some(match tool {
        "search_nodes" => "Searching for nodes...",
        "get_node_details" => "Getting node details...",
        "get_node_parameters" => "Fetching node parameters...",
        "get_node_output_schema" => "Analyzing output schema...",
        "list_trigger_nodes" => "Finding trigger nodes...",
        "list_workflows" => "Listing workflows...",
        "get_workflow" => "Loading workflow...",
        "create_workflow" => "Creating workflow...",
        "update_workflow" => "Updating workflow...",
        "delete_workflow" => "Deleting workflow...",
        "execute_workflow" => "Executing workflow...",
        "activate_workflow" => "Activating workflow...",
        "deactivate_workflow" => "Deactivating workflow...",
        "list_executions" => "Checking executions...",
        "get_execution" => "Getting execution details...",
        "manage_variable" => "Managing variables...",
        _ => return None,
    })
}

/// Spawn the long-lived status subscription.
///
/// The subscription is best-effort UI sugar: any transport failure tears it
/// down and a fresh one is opened after a fixed delay, indefinitely. The
/// caller aborts the returned handle on shutdown.
pub fn spawn_subscriber(client: AgentClient, tx: UnboundedSender<AppEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let sender = tx.clone();
            let result = client
                .stream_status(move |event| {
                    let _ = sender.send(AppEvent::Status(event));
                })
                .await;

            match result {
                Ok(()) => tracing::debug!("status subscription ended, reconnecting"),
                Err(err) => tracing::warn!("status subscription error: {err:#}"),
            }

            if tx.is_closed() {
                break;
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: StatusKind, message: &str, tool: Option<&str>) -> AgentStatusEvent {
        AgentStatusEvent {
            kind,
            message: message.to_string(),
            tool_name: tool.map(str::to_string),
            timestamp: 0,
        }
    }

    #[test]
    fn test_parses_status_payload() {
        let parsed: AgentStatusEvent = serde_json::from_str(
            r#"{"type":"tool_call","message":"calling tool","toolName":"search_nodes","timestamp":1712000000000}"#,
        )
        .unwrap();
        assert_eq!(parsed.kind, StatusKind::ToolCall);
        assert_eq!(parsed.tool_name.as_deref(), Some("search_nodes"));
        assert_eq!(parsed.timestamp, 1712000000000);
    }

    #[test]
    fn test_parses_payload_without_tool_name() {
        let parsed: AgentStatusEvent =
            serde_json::from_str(r#"{"type":"thinking","message":"Analyzing your request..."}"#)
                .unwrap();
        assert_eq!(parsed.kind, StatusKind::Thinking);
        assert_eq!(parsed.tool_name, None);
    }

    #[test]
    fn test_rejects_unknown_kind() {
        assert!(serde_json::from_str::<AgentStatusEvent>(r#"{"type":"confused"}"#).is_err());
    }

    #[test]
    fn test_display_thinking_shows_message() {
        let e = event(StatusKind::Thinking, "Analyzing your request...", None);
        assert_eq!(e.display(), "Analyzing your request...");
    }

    #[test]
    fn test_display_known_tool_call() {
        let e = event(StatusKind::ToolCall, "", Some("search_nodes"));
        assert_eq!(e.display(), "Searching for nodes...");
    }

    #[test]
    fn test_display_unknown_tool_call() {
        let e = event(StatusKind::ToolCall, "", Some("summon_gremlins"));
        assert_eq!(e.display(), "Using summon_gremlins...");
    }

    #[test]
    fn test_display_tool_result() {
        let e = event(StatusKind::ToolResult, "", Some("get_workflow"));
        assert_eq!(e.display(), "Completed: get_workflow");
    }

    #[test]
    fn test_display_responding_and_complete() {
        assert_eq!(
            event(StatusKind::Responding, "", None).display(),
            "Generating response..."
        );
        assert_eq!(event(StatusKind::Complete, "", None).display(), "Done!");
    }

    #[test]
    fn test_terminal_kinds() {
        assert!(event(StatusKind::Complete, "", None).is_terminal());
        assert!(event(StatusKind::Error, "boom", None).is_terminal());
        assert!(!event(StatusKind::Thinking, "", None).is_terminal());
        assert!(!event(StatusKind::ToolCall, "", Some("get_workflow")).is_terminal());
    }
}

use std::time::{Duration, Instant};

use ratatui::widgets::{ListState, TableState};
use tokio::sync::mpsc::UnboundedSender;

use crate::api::{AgentClient, HistoryMessage, SettingsMap, Workflow};
use crate::status::{AgentStatusEvent, STATUS_LINGER};
use crate::stream::{ChatEvent, CHAT_ERROR_MESSAGE};
use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Chat,
    Workflows,
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

/// One entry in the append-only conversation list. User messages are
/// immutable once created; assistant messages grow by token appends and
/// finalize exactly once.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: u64,
    pub role: ChatRole,
    pub content: String,
    pub streaming: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved,
}

/// Summary numbers for the workflows dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub total: usize,
    pub active: usize,
    pub total_nodes: usize,
    pub monthly_usage: f64,
}

impl DashboardStats {
    pub fn from_workflows(workflows: &[Workflow]) -> Self {
        let active = workflows.iter().filter(|w| w.active).count();
        let total_nodes: usize = workflows.iter().map(|w| w.nodes.len()).sum();
        Self {
            total: workflows.len(),
            active,
            total_nodes,
            monthly_usage: active as f64 * 0.50 + total_nodes as f64 * 0.05,
        }
    }
}

pub const GREETING: &str = "Hello! I'm your n8n AI agent. I can help you research nodes, create workflows, review workflows, etc. What would you like to do today?";

/// Known settings keys, shown first in the configuration form.
pub const SETTINGS_FIELDS: [&str; 4] = [
    "N8N_BASE_URL",
    "N8N_API_KEY",
    "GEMINI_API_KEY",
    "MODEL_NAME",
];

/// How long the "Saved" badge lingers before reverting to Idle.
const SAVED_BADGE_LINGER: Duration = Duration::from_secs(4);

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,

    // Chat state
    pub messages: Vec<ChatMessage>,
    next_message_id: u64,
    pub chat_input: String,
    pub chat_cursor: usize, // cursor position in chat_input, in chars
    pub chat_in_flight: bool,
    pending_assistant: Option<u64>,
    pub chat_scroll: u16,
    pub chat_area_height: u16, // updated during render, for scroll math
    pub chat_area_width: u16,

    // Status indicator
    pub current_status: Option<AgentStatusEvent>,
    status_clear_at: Option<Instant>,

    // Workflows dashboard state
    pub workflows: Vec<Workflow>,
    pub workflows_loading: bool,
    pub workflows_error: Option<String>,
    pub workflows_state: TableState,
    pub detail_open: bool,
    pub detail_loading: bool,
    pub detail_error: Option<String>,
    pub workflow_detail: Option<Workflow>,

    // Settings form state
    pub settings_fields: Vec<(String, String)>,
    pub settings_loading: bool,
    pub settings_error: Option<String>,
    pub settings_state: ListState,
    pub settings_input: String,
    pub settings_cursor: usize,
    pub show_secrets: bool,
    pub save_status: SaveStatus,
    save_status_reset_at: Option<Instant>,

    // Animation state
    pub animation_frame: u8,

    // Wiring
    pub client: AgentClient,
    tx: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(client: AgentClient, tx: UnboundedSender<AppEvent>) -> Self {
        let mut app = Self {
            should_quit: false,
            screen: Screen::Chat,
            input_mode: InputMode::Normal,

            messages: Vec::new(),
            next_message_id: 0,
            chat_input: String::new(),
            chat_cursor: 0,
            chat_in_flight: false,
            pending_assistant: None,
            chat_scroll: 0,
            chat_area_height: 0,
            chat_area_width: 0,

            current_status: None,
            status_clear_at: None,

            workflows: Vec::new(),
            workflows_loading: false,
            workflows_error: None,
            workflows_state: TableState::default(),
            detail_open: false,
            detail_loading: false,
            detail_error: None,
            workflow_detail: None,

            settings_fields: Vec::new(),
            settings_loading: false,
            settings_error: None,
            settings_state: ListState::default(),
            settings_input: String::new(),
            settings_cursor: 0,
            show_secrets: false,
            save_status: SaveStatus::Idle,
            save_status_reset_at: None,

            animation_frame: 0,

            client,
            tx,
        };

        let id = app.next_id();
        app.messages.push(ChatMessage {
            id,
            role: ChatRole::Assistant,
            content: GREETING.to_string(),
            streaming: false,
        });
        app
    }

    fn next_id(&mut self) -> u64 {
        self.next_message_id += 1;
        self.next_message_id
    }

    pub fn set_screen(&mut self, screen: Screen) {
        self.screen = screen;
        self.input_mode = InputMode::Normal;
        match screen {
            Screen::Workflows if self.workflows.is_empty() && !self.workflows_loading => {
                self.reload_workflows();
            }
            Screen::Config if self.settings_fields.is_empty() && !self.settings_loading => {
                self.reload_settings();
            }
            _ => {}
        }
    }

    // --- Chat ---

    /// Conversation history sent with the next request: role and content
    /// of every finalized message, in order.
    pub fn chat_history(&self) -> Vec<HistoryMessage> {
        self.messages
            .iter()
            .map(|m| HistoryMessage {
                role: match m.role {
                    ChatRole::User => "user".to_string(),
                    ChatRole::Assistant => "assistant".to_string(),
                },
                content: m.content.clone(),
            })
            .collect()
    }

    /// Submit the input box as a new user message and start streaming the
    /// reply. At most one request may be outstanding; further sends are
    /// dropped until it finishes.
    pub fn send_chat(&mut self) {
        let text = self.chat_input.trim().to_string();
        if text.is_empty() {
            return;
        }
        if self.chat_in_flight {
            tracing::debug!("chat request already in flight, dropping send");
            return;
        }

        let history = self.chat_history();

        let user_id = self.next_id();
        self.messages.push(ChatMessage {
            id: user_id,
            role: ChatRole::User,
            content: text.clone(),
            streaming: false,
        });

        let assistant_id = self.next_id();
        self.messages.push(ChatMessage {
            id: assistant_id,
            role: ChatRole::Assistant,
            content: String::new(),
            streaming: true,
        });
        self.pending_assistant = Some(assistant_id);
        self.chat_in_flight = true;
        self.chat_input.clear();
        self.chat_cursor = 0;
        self.scroll_chat_to_bottom();

        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let sender = tx.clone();
            let result = client
                .stream_chat(&text, &history, move |token| {
                    let _ = sender.send(AppEvent::Chat(ChatEvent::Token(token)));
                })
                .await;
            let _ = match result {
                Ok(()) => tx.send(AppEvent::Chat(ChatEvent::Done)),
                Err(err) => tx.send(AppEvent::Chat(ChatEvent::Failed(format!("{err:#}")))),
            };
        });
    }

    pub fn on_chat_event(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::Token(token) => {
                if let Some(message) = self.pending_message_mut() {
                    message.content.push_str(&token);
                }
                self.scroll_chat_to_bottom();
            }
            ChatEvent::Done => {
                if let Some(message) = self.pending_message_mut() {
                    message.streaming = false;
                }
                self.pending_assistant = None;
                self.chat_in_flight = false;
            }
            ChatEvent::Failed(reason) => {
                tracing::error!("chat request failed: {reason}");
                if let Some(message) = self.pending_message_mut() {
                    message.content = CHAT_ERROR_MESSAGE.to_string();
                    message.streaming = false;
                }
                self.pending_assistant = None;
                self.chat_in_flight = false;
                self.scroll_chat_to_bottom();
            }
        }
    }

    fn pending_message_mut(&mut self) -> Option<&mut ChatMessage> {
        let id = self.pending_assistant?;
        self.messages.iter_mut().find(|m| m.id == id)
    }

    // --- Status indicator ---

    pub fn on_status(&mut self, event: AgentStatusEvent) {
        tracing::debug!("status event: {:?} at {}", event.kind, event.timestamp);
        // A terminal event schedules the clear; anything arriving before
        // the deadline supersedes it.
        self.status_clear_at = if event.is_terminal() {
            Some(Instant::now() + STATUS_LINGER)
        } else {
            None
        };
        self.current_status = Some(event);
    }

    /// Text for the status indicator, or None when it should be hidden.
    pub fn status_display(&self) -> Option<String> {
        if let Some(status) = &self.current_status {
            Some(status.display())
        } else if self.chat_in_flight {
            Some("Connecting to AI...".to_string())
        } else {
            None
        }
    }

    /// The status block renders while a request is pending and no reply
    /// content has arrived yet; once tokens flow, the growing message
    /// replaces it.
    pub fn status_block_visible(&self) -> bool {
        let streaming_content = self
            .messages
            .iter()
            .any(|m| m.streaming && !m.content.is_empty());
        (self.chat_in_flight || self.current_status.is_some()) && !streaming_content
    }

    /// Tick animation frame and expire timers (called by Tick event)
    pub fn tick(&mut self) {
        if self.chat_in_flight {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        self.expire_timers(Instant::now());
    }

    /// Clear timed-out transient state; `now` injected for tests.
    pub fn expire_timers(&mut self, now: Instant) {
        if self.status_clear_at.map_or(false, |at| now >= at) {
            self.current_status = None;
            self.status_clear_at = None;
        }
        if self.save_status_reset_at.map_or(false, |at| now >= at) {
            self.save_status = SaveStatus::Idle;
            self.save_status_reset_at = None;
        }
    }

    // --- Chat scrolling ---

    pub fn chat_scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn chat_scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    /// Scroll chat so the newest content is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_area_width > 0 {
            self.chat_area_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in &self.messages {
            // Empty streaming messages are hidden until content arrives
            if msg.streaming && msg.content.is_empty() {
                continue;
            }
            total_lines += 1; // Role line ("You:" or "Agent:")
            for line in msg.content.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1;
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // Blank line after message
        }

        if self.status_block_visible() {
            total_lines += 2; // "Agent:" + status line
        }

        let visible_height = if self.chat_area_height > 0 {
            self.chat_area_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        }
    }

    // --- Workflows dashboard ---

    pub fn reload_workflows(&mut self) {
        self.workflows_loading = true;
        self.workflows_error = None;
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.workflows().await.map_err(|e| format!("{e:#}"));
            let _ = tx.send(AppEvent::WorkflowsLoaded(result));
        });
    }

    pub fn on_workflows_loaded(&mut self, result: Result<Vec<Workflow>, String>) {
        self.workflows_loading = false;
        match result {
            Ok(workflows) => {
                self.workflows = workflows;
                let selected = self.workflows_state.selected().unwrap_or(0);
                if self.workflows.is_empty() {
                    self.workflows_state.select(None);
                } else {
                    self.workflows_state
                        .select(Some(selected.min(self.workflows.len() - 1)));
                }
            }
            Err(err) => {
                tracing::error!("failed to fetch workflows: {err}");
                self.workflows_error = Some(err);
            }
        }
    }

    pub fn dashboard_stats(&self) -> DashboardStats {
        DashboardStats::from_workflows(&self.workflows)
    }

    pub fn selected_workflow(&self) -> Option<&Workflow> {
        self.workflows_state
            .selected()
            .and_then(|i| self.workflows.get(i))
    }

    pub fn workflows_nav_down(&mut self) {
        let len = self.workflows.len();
        if len > 0 {
            let i = self.workflows_state.selected().unwrap_or(0);
            self.workflows_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn workflows_nav_up(&mut self) {
        let i = self.workflows_state.selected().unwrap_or(0);
        self.workflows_state.select(Some(i.saturating_sub(1)));
    }

    /// Fetch the selected workflow into the detail popup.
    pub fn open_workflow_detail(&mut self) {
        let Some(workflow) = self.selected_workflow() else {
            return;
        };
        let id = workflow.id.clone();
        self.detail_open = true;
        self.detail_loading = true;
        self.detail_error = None;
        self.workflow_detail = None;

        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.workflow(&id).await.map_err(|e| format!("{e:#}"));
            let _ = tx.send(AppEvent::WorkflowDetail(result));
        });
    }

    pub fn on_workflow_detail(&mut self, result: Result<Workflow, String>) {
        self.detail_loading = false;
        match result {
            Ok(workflow) => self.workflow_detail = Some(workflow),
            Err(err) => {
                tracing::error!("failed to fetch workflow detail: {err}");
                self.detail_error = Some(err);
            }
        }
    }

    pub fn close_workflow_detail(&mut self) {
        self.detail_open = false;
        self.detail_loading = false;
        self.detail_error = None;
        self.workflow_detail = None;
    }

    // --- Settings form ---

    pub fn reload_settings(&mut self) {
        self.settings_loading = true;
        self.settings_error = None;
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.settings().await.map_err(|e| format!("{e:#}"));
            let _ = tx.send(AppEvent::SettingsLoaded(result));
        });
    }

    pub fn on_settings_loaded(&mut self, result: Result<SettingsMap, String>) {
        self.settings_loading = false;
        match result {
            Ok(map) => {
                self.settings_fields = settings_fields_from_map(map);
                if self.settings_state.selected().is_none() {
                    self.settings_state.select(Some(0));
                }
            }
            Err(err) => {
                tracing::error!("failed to fetch settings: {err}");
                self.settings_error = Some(err);
            }
        }
    }

    pub fn settings_nav_down(&mut self) {
        let len = self.settings_fields.len();
        if len > 0 {
            let i = self.settings_state.selected().unwrap_or(0);
            self.settings_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn settings_nav_up(&mut self) {
        let i = self.settings_state.selected().unwrap_or(0);
        self.settings_state.select(Some(i.saturating_sub(1)));
    }

    pub fn begin_edit_setting(&mut self) {
        if let Some((_, value)) = self
            .settings_state
            .selected()
            .and_then(|i| self.settings_fields.get(i))
        {
            self.settings_input = value.clone();
            self.settings_cursor = self.settings_input.chars().count();
            self.input_mode = InputMode::Editing;
        }
    }

    pub fn commit_edit_setting(&mut self) {
        if let Some(field) = self
            .settings_state
            .selected()
            .and_then(|i| self.settings_fields.get_mut(i))
        {
            field.1 = self.settings_input.trim().to_string();
        }
        self.settings_input.clear();
        self.settings_cursor = 0;
        self.input_mode = InputMode::Normal;
    }

    pub fn cancel_edit_setting(&mut self) {
        self.settings_input.clear();
        self.settings_cursor = 0;
        self.input_mode = InputMode::Normal;
    }

    /// Post the full settings map back to the backend.
    pub fn save_settings(&mut self) {
        if self.save_status != SaveStatus::Idle {
            return;
        }
        self.save_status = SaveStatus::Saving;
        self.settings_error = None;
        let map: SettingsMap = self.settings_fields.iter().cloned().collect();

        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.update_settings(&map).await.map_err(|e| format!("{e:#}"));
            let _ = tx.send(AppEvent::SettingsSaved(result));
        });
    }

    pub fn on_settings_saved(&mut self, result: Result<(), String>) {
        match result {
            Ok(()) => {
                self.save_status = SaveStatus::Saved;
                self.save_status_reset_at = Some(Instant::now() + SAVED_BADGE_LINGER);
            }
            Err(err) => {
                tracing::error!("failed to save settings: {err}");
                self.settings_error = Some(err);
                self.save_status = SaveStatus::Idle;
            }
        }
    }
}

/// Secret-bearing values render masked unless toggled visible.
pub fn is_secret_field(key: &str) -> bool {
    key.ends_with("_API_KEY")
}

fn settings_fields_from_map(mut map: SettingsMap) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    for key in SETTINGS_FIELDS {
        let value = map
            .remove(key)
            .unwrap_or_else(|| default_setting(key).to_string());
        fields.push((key.to_string(), value));
    }
    // Unknown keys the backend returns are preserved after the known ones.
    for (key, value) in map {
        fields.push((key, value));
    }
    fields
}

fn default_setting(key: &str) -> &'static str {
    match key {
        "MODEL_NAME" => "gemini-3-flash-preview",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusKind;
    use tokio::sync::mpsc;

    fn test_app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        App::new(AgentClient::new("http://localhost:9"), tx)
    }

    fn status(kind: StatusKind) -> AgentStatusEvent {
        AgentStatusEvent {
            kind,
            message: "working".to_string(),
            tool_name: None,
            timestamp: 0,
        }
    }

    #[test]
    fn test_starts_with_greeting() {
        let app = test_app();
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].role, ChatRole::Assistant);
        assert!(!app.messages[0].streaming);
    }

    #[tokio::test]
    async fn test_send_chat_creates_pending_exchange() {
        let mut app = test_app();
        app.chat_input = "List my workflows".to_string();
        app.send_chat();

        assert_eq!(app.messages.len(), 3);
        let user = &app.messages[1];
        assert_eq!(user.role, ChatRole::User);
        assert_eq!(user.content, "List my workflows");
        let assistant = &app.messages[2];
        assert_eq!(assistant.role, ChatRole::Assistant);
        assert!(assistant.streaming);
        assert!(assistant.content.is_empty());
        assert!(app.chat_in_flight);
        assert!(app.chat_input.is_empty());
    }

    #[tokio::test]
    async fn test_message_ids_are_ordered_and_unique() {
        let mut app = test_app();
        app.chat_input = "one".to_string();
        app.send_chat();
        let ids: Vec<u64> = app.messages.iter().map(|m| m.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(ids, sorted);
    }

    #[tokio::test]
    async fn test_second_send_rejected_while_in_flight() {
        let mut app = test_app();
        app.chat_input = "first".to_string();
        app.send_chat();
        assert_eq!(app.messages.len(), 3);

        app.chat_input = "second".to_string();
        app.send_chat();
        // Nothing changed: no new messages, input untouched.
        assert_eq!(app.messages.len(), 3);
        assert_eq!(app.chat_input, "second");
    }

    #[tokio::test]
    async fn test_tokens_accumulate_in_arrival_order() {
        let mut app = test_app();
        app.chat_input = "hi".to_string();
        app.send_chat();

        app.on_chat_event(ChatEvent::Token("You have ".to_string()));
        app.on_chat_event(ChatEvent::Token("3 workflows.".to_string()));
        app.on_chat_event(ChatEvent::Done);

        let assistant = app.messages.last().unwrap();
        assert_eq!(assistant.content, "You have 3 workflows.");
        assert!(!assistant.streaming);
        assert!(!app.chat_in_flight);
    }

    #[tokio::test]
    async fn test_failed_chat_shows_apology() {
        let mut app = test_app();
        app.chat_input = "hi".to_string();
        app.send_chat();

        app.on_chat_event(ChatEvent::Token("partial".to_string()));
        app.on_chat_event(ChatEvent::Failed("connection reset".to_string()));

        let assistant = app.messages.last().unwrap();
        assert_eq!(assistant.content, CHAT_ERROR_MESSAGE);
        assert!(!assistant.streaming);
        assert!(!app.chat_in_flight);
    }

    #[test]
    fn test_chat_history_covers_prior_messages() {
        let app = test_app();
        let history = app.chat_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, "assistant");
        assert_eq!(history[0].content, GREETING);
    }

    #[test]
    fn test_terminal_status_clears_after_linger() {
        let mut app = test_app();
        app.on_status(status(StatusKind::Complete));
        assert!(app.current_status.is_some());

        app.expire_timers(Instant::now() + Duration::from_millis(1600));
        assert!(app.current_status.is_none());
    }

    #[test]
    fn test_non_terminal_status_stays() {
        let mut app = test_app();
        app.on_status(status(StatusKind::Thinking));
        app.expire_timers(Instant::now() + Duration::from_secs(60));
        assert!(app.current_status.is_some());
    }

    #[test]
    fn test_new_event_supersedes_scheduled_clear() {
        let mut app = test_app();
        app.on_status(status(StatusKind::Complete));
        app.on_status(status(StatusKind::Thinking));

        app.expire_timers(Instant::now() + Duration::from_secs(60));
        let current = app.current_status.expect("status should survive");
        assert_eq!(current.kind, StatusKind::Thinking);
    }

    #[test]
    fn test_dashboard_stats_usage_formula() {
        let workflows: Vec<Workflow> = serde_json::from_str(
            r#"[
                {"id":"1","name":"a","active":true,"nodes":[{},{},{}]},
                {"id":"2","name":"b","active":false,"nodes":[{},{}]},
                {"id":"3","name":"c","active":true,"nodes":[{},{}]}
            ]"#,
        )
        .unwrap();
        let stats = DashboardStats::from_workflows(&workflows);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.total_nodes, 7);
        assert!((stats.monthly_usage - 1.35).abs() < 1e-9);
    }

    #[test]
    fn test_settings_fields_order_and_defaults() {
        let mut map = SettingsMap::new();
        map.insert("GEMINI_API_KEY".to_string(), "AIzaSy-test".to_string());
        map.insert("CUSTOM_FLAG".to_string(), "on".to_string());

        let fields = settings_fields_from_map(map);
        let keys: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "N8N_BASE_URL",
                "N8N_API_KEY",
                "GEMINI_API_KEY",
                "MODEL_NAME",
                "CUSTOM_FLAG"
            ]
        );
        assert_eq!(fields[2].1, "AIzaSy-test");
        assert_eq!(fields[3].1, "gemini-3-flash-preview");
    }

    #[test]
    fn test_secret_fields_are_masked_keys() {
        assert!(is_secret_field("N8N_API_KEY"));
        assert!(is_secret_field("GEMINI_API_KEY"));
        assert!(!is_secret_field("N8N_BASE_URL"));
        assert!(!is_secret_field("MODEL_NAME"));
    }

    #[test]
    fn test_saved_badge_reverts_to_idle() {
        let mut app = test_app();
        app.on_settings_saved(Ok(()));
        assert_eq!(app.save_status, SaveStatus::Saved);

        app.expire_timers(Instant::now() + Duration::from_secs(5));
        assert_eq!(app.save_status, SaveStatus::Idle);
    }

    #[test]
    fn test_settings_save_failure_reverts_and_records_error() {
        let mut app = test_app();
        app.save_status = SaveStatus::Saving;
        app.on_settings_saved(Err("status 500".to_string()));
        assert_eq!(app.save_status, SaveStatus::Idle);
        assert!(app.settings_error.is_some());
    }
}

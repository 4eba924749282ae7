use super::backend::ChatBackend;
use super::error::ChatError;
use super::message::{BotMessage, ConversationHistory, Message};
use super::retry::RetryPolicy;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Per-session state handed to every backend call.
#[derive(Debug, Clone)]
pub struct SessionContext {
    server_url: String,
    sender_id: String,
    started_at: DateTime<Local>,
}

impl SessionContext {
    pub fn new(server_url: &str) -> Self {
        Self {
            server_url: clean_url(server_url),
            sender_id: uuid::Uuid::new_v4().to_string(),
            started_at: Local::now(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn sender_id(&self) -> &str {
        &self.sender_id
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn set_server_url(&mut self, url: &str) {
        self.server_url = clean_url(url);
        info!("Server URL set to {}", self.server_url);
    }

    /// Starts a fresh conversation on the backend side.
    pub fn renew(&mut self) {
        self.sender_id = uuid::Uuid::new_v4().to_string();
        self.started_at = Local::now();
        info!("New session {}", self.sender_id);
    }
}

fn clean_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Result of one send (or retry) cycle.
#[derive(Debug)]
pub struct Exchange {
    /// Index of the first history message produced by this exchange.
    pub first_new: usize,
    pub attempts: u32,
    pub error: Option<ChatError>,
}

#[derive(Serialize)]
struct ChatExport<'a> {
    user_id: &'a str,
    messages: &'a [Message],
    timestamp: String,
}

pub struct ChatSession {
    context: SessionContext,
    history: ConversationHistory,
    pending_retry: Option<String>,
}

impl ChatSession {
    pub fn new(server_url: &str) -> Self {
        Self {
            context: SessionContext::new(server_url),
            history: ConversationHistory::default(),
            pending_retry: None,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn set_server_url(&mut self, url: &str) {
        self.context.set_server_url(url);
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.pending_retry = None;
    }

    pub fn new_session(&mut self) {
        self.context.renew();
        self.clear_history();
    }

    pub fn messages_since(&self, exchange: &Exchange) -> &[Message] {
        &self.history.messages()[exchange.first_new.min(self.history.len())..]
    }

    /// Records the user's message and forwards it once.
    pub async fn send(&mut self, backend: &dyn ChatBackend, text: &str) -> Exchange {
        let first_new = self.history.len();
        self.history.push(Message::user(text));
        let result = backend.send(&self.context, text).await;
        self.record(text, result, first_new, 1)
    }

    /// Re-submits button `number` (1-based) of the latest assistant turn.
    pub async fn press_button(
        &mut self,
        backend: &dyn ChatBackend,
        number: usize,
    ) -> Option<Exchange> {
        let submission = self
            .history
            .active_buttons()?
            .get(number.checked_sub(1)?)?
            .submission()
            .to_string();
        Some(self.send(backend, &submission).await)
    }

    pub fn can_retry(&self) -> bool {
        self.pending_retry.is_some()
    }

    /// Resends the last failed message, backing off between attempts.
    /// Non-transient errors stop early.
    pub async fn retry(
        &mut self,
        backend: &dyn ChatBackend,
        policy: &RetryPolicy,
    ) -> Option<Exchange> {
        let text = self.pending_retry.clone()?;
        let first_new = self.history.len();
        let mut attempt = 0;

        loop {
            attempt += 1;
            tokio::time::sleep(policy.delay_for(attempt)).await;

            match backend.send(&self.context, &text).await {
                Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                    warn!("Retry {}/{} failed: {}", attempt, policy.max_attempts, e);
                }
                result => return Some(self.record(&text, result, first_new, attempt)),
            }
        }
    }

    fn record(
        &mut self,
        text: &str,
        result: Result<Vec<BotMessage>, ChatError>,
        first_new: usize,
        attempts: u32,
    ) -> Exchange {
        match result {
            Ok(replies) => {
                self.pending_retry = None;
                for reply in replies {
                    self.history.extend(Message::from_bot(reply));
                }
                Exchange {
                    first_new,
                    attempts,
                    error: None,
                }
            }
            Err(e) => {
                warn!("Backend request failed: {}", e);
                self.history.push(Message::assistant(e.user_message()));
                self.pending_retry = Some(text.to_string());
                Exchange {
                    first_new,
                    attempts,
                    error: Some(e),
                }
            }
        }
    }

    pub fn default_export_path(&self, dir: &Path) -> PathBuf {
        let short_id: String = self.context.sender_id.chars().take(8).collect();
        dir.join(format!(
            "chat_export_{}_{}.json",
            short_id,
            Local::now().format("%Y%m%d_%H%M%S")
        ))
    }

    /// Writes `{user_id, messages, timestamp}` as pretty JSON.
    pub fn export(&self, path: &Path) -> Result<()> {
        let export = ChatExport {
            user_id: &self.context.sender_id,
            messages: self.history.messages(),
            timestamp: Local::now().to_rfc3339(),
        };
        let json = serde_json::to_string_pretty(&export).context("Failed to serialize chat")?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write export file: {}", path.display()))?;

        info!(
            "Exported {} messages to {}",
            self.history.len(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::backend::HealthStatus;
    use crate::chat::message::{Button, Role};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays scripted results and records what it was sent.
    #[derive(Default)]
    struct ScriptedBackend {
        results: Mutex<VecDeque<Result<Vec<BotMessage>, ChatError>>>,
        sent: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedBackend {
        fn with(results: Vec<Result<Vec<BotMessage>, ChatError>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                sent: Mutex::default(),
            }
        }

        fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn send(
            &self,
            context: &SessionContext,
            message: &str,
        ) -> Result<Vec<BotMessage>, ChatError> {
            self.sent
                .lock()
                .unwrap()
                .push((context.sender_id().to_string(), message.to_string()));
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn health(&self, _context: &SessionContext) -> Result<HealthStatus, ChatError> {
            Err(ChatError::Request("not scripted".into()))
        }

        fn describe(&self, _context: &SessionContext) -> String {
            "scripted".into()
        }
    }

    fn server_error() -> ChatError {
        ChatError::Status {
            status: 500,
            body: "boom".into(),
        }
    }

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn replies_are_appended_in_order() {
        let backend = ScriptedBackend::with(vec![Ok(vec![
            BotMessage::text("first"),
            BotMessage::text("second"),
        ])]);
        let mut session = ChatSession::new("http://localhost:5005/");

        let exchange = session.send(&backend, "hello").await;
        assert!(exchange.error.is_none());
        let contents: Vec<_> = session
            .messages_since(&exchange)
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["hello", "first", "second"]);
        assert_eq!(backend.sent()[0].0, session.context().sender_id());
        assert_eq!(session.context().server_url(), "http://localhost:5005");
    }

    #[tokio::test]
    async fn failure_adds_exactly_one_synthetic_message() {
        let backend = ScriptedBackend::with(vec![
            Ok(vec![BotMessage::text("welcome")]),
            Err(server_error()),
        ]);
        let mut session = ChatSession::new("http://localhost:5005");
        session.send(&backend, "hi").await;
        let before: Vec<Message> = session.history().messages().to_vec();

        let exchange = session.send(&backend, "where is my order?").await;
        assert!(matches!(exchange.error, Some(ChatError::Status { status: 500, .. })));

        let messages = session.history().messages();
        assert_eq!(&messages[..before.len()], before.as_slice());
        assert_eq!(messages.len(), before.len() + 2);
        assert_eq!(messages[before.len()].content, "where is my order?");
        assert_eq!(messages[before.len() + 1].role, Role::Assistant);
        assert!(messages[before.len() + 1].content.contains("HTTP 500"));
        assert!(session.can_retry());
    }

    #[tokio::test]
    async fn retry_recovers_after_transient_failures() {
        let backend = ScriptedBackend::with(vec![
            Err(server_error()),
            Err(server_error()),
            Ok(vec![BotMessage::text("found it")]),
        ]);
        let mut session = ChatSession::new("http://localhost:5005");
        session.send(&backend, "order status").await;

        let exchange = session.retry(&backend, &instant_policy(3)).await.unwrap();
        assert!(exchange.error.is_none());
        assert_eq!(exchange.attempts, 2);
        assert_eq!(session.messages_since(&exchange)[0].content, "found it");
        assert!(!session.can_retry());
        assert!(backend.sent().iter().all(|(_, m)| m == "order status"));
    }

    #[tokio::test]
    async fn retry_gives_up_after_max_attempts() {
        let backend = ScriptedBackend::with(
            std::iter::repeat_with(|| Err(server_error())).take(5).collect(),
        );
        let mut session = ChatSession::new("http://localhost:5005");
        session.send(&backend, "anyone?").await;
        let len_before = session.history().len();

        let exchange = session.retry(&backend, &instant_policy(2)).await.unwrap();
        assert_eq!(exchange.attempts, 2);
        assert!(exchange.error.is_some());
        assert_eq!(session.history().len(), len_before + 1);
        assert_eq!(backend.sent().len(), 3);
    }

    #[tokio::test]
    async fn retry_stops_on_client_errors() {
        let backend = ScriptedBackend::with(vec![
            Err(server_error()),
            Err(ChatError::Status {
                status: 400,
                body: String::new(),
            }),
        ]);
        let mut session = ChatSession::new("http://localhost:5005");
        session.send(&backend, "x").await;

        let exchange = session.retry(&backend, &instant_policy(5)).await.unwrap();
        assert_eq!(exchange.attempts, 1);
        assert!(session.retry(&backend, &instant_policy(5)).await.is_some());
    }

    #[tokio::test]
    async fn nothing_to_retry_after_success() {
        let backend = ScriptedBackend::with(vec![Ok(vec![BotMessage::text("ok")])]);
        let mut session = ChatSession::new("http://localhost:5005");
        session.send(&backend, "x").await;
        assert!(session.retry(&backend, &instant_policy(3)).await.is_none());
    }

    #[tokio::test]
    async fn button_payload_is_resubmitted_as_user_input() {
        let backend = ScriptedBackend::with(vec![
            Ok(vec![BotMessage {
                text: Some("Was this helpful?".into()),
                buttons: Some(vec![
                    Button {
                        title: "Yes".into(),
                        payload: "/affirm".into(),
                    },
                    Button {
                        title: "No".into(),
                        payload: "/deny".into(),
                    },
                ]),
                ..Default::default()
            }]),
            Ok(vec![BotMessage::text("Sorry to hear that.")]),
        ]);
        let mut session = ChatSession::new("http://localhost:5005");
        session.send(&backend, "help").await;

        assert!(session.press_button(&backend, 3).await.is_none());
        assert!(session.press_button(&backend, 0).await.is_none());

        let exchange = session.press_button(&backend, 2).await.unwrap();
        let new = session.messages_since(&exchange);
        assert_eq!(new[0].role, Role::User);
        assert_eq!(new[0].content, "/deny");
        assert_eq!(new[1].content, "Sorry to hear that.");
        assert_eq!(backend.sent()[1].1, "/deny");
    }

    #[tokio::test]
    async fn new_session_changes_sender_and_clears_history() {
        let backend = ScriptedBackend::with(vec![Ok(vec![BotMessage::text("hi")])]);
        let mut session = ChatSession::new("http://localhost:5005");
        session.send(&backend, "hello").await;
        let old_id = session.context().sender_id().to_string();

        session.new_session();
        assert_ne!(session.context().sender_id(), old_id);
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn export_writes_user_id_and_messages() {
        let backend = ScriptedBackend::with(vec![Ok(vec![BotMessage::text("hi there")])]);
        let mut session = ChatSession::new("http://localhost:5005");
        session.send(&backend, "hello").await;

        let dir = tempfile::tempdir().unwrap();
        let path = session.default_export_path(&dir.path().join("exports"));
        session.export(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["user_id"], session.context().sender_id());
        assert_eq!(json["messages"].as_array().unwrap().len(), 2);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "hi there");
        assert!(json["timestamp"].is_string());
    }
}

use super::error::ChatError;
use super::message::BotMessage;
use super::session::SessionContext;
use crate::fallback::FallbackResponder;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub endpoint: String,
    pub detail: Option<String>,
}

/// Where user messages go and replies come from.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(
        &self,
        context: &SessionContext,
        message: &str,
    ) -> Result<Vec<BotMessage>, ChatError>;

    async fn health(&self, context: &SessionContext) -> Result<HealthStatus, ChatError>;

    fn describe(&self, context: &SessionContext) -> String;
}

/// Answers from the local knowledge base without a backend server.
pub struct LocalBackend {
    responder: Arc<FallbackResponder>,
}

impl LocalBackend {
    pub fn new(responder: Arc<FallbackResponder>) -> Self {
        Self { responder }
    }
}

#[async_trait]
impl ChatBackend for LocalBackend {
    async fn send(
        &self,
        _context: &SessionContext,
        message: &str,
    ) -> Result<Vec<BotMessage>, ChatError> {
        let reply = self.responder.respond(message);
        Ok(vec![BotMessage::text(reply.into_text())])
    }

    async fn health(&self, _context: &SessionContext) -> Result<HealthStatus, ChatError> {
        Ok(HealthStatus {
            endpoint: "local knowledge base".to_string(),
            detail: Some(format!(
                "{} Q&A pairs",
                self.responder.knowledge_base().len()
            )),
        })
    }

    fn describe(&self, _context: &SessionContext) -> String {
        "local knowledge base".to_string()
    }
}

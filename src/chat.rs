mod backend;
mod error;
mod message;
pub mod render;
mod repl;
mod retry;
mod session;
mod webhook;

pub use backend::{ChatBackend, HealthStatus, LocalBackend};
pub use error::ChatError;
pub use message::{Attachment, BotMessage, Button, ConversationHistory, Message, Role};
pub use repl::{ChatApp, Command, parse_command};
pub use retry::RetryPolicy;
pub use session::{ChatSession, Exchange, SessionContext};
pub use webhook::{WEBHOOK_PATH, WebhookClient};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("cannot connect to {url}: {reason}")]
    Unavailable { url: String, reason: String },
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },
    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response from server: {0}")]
    Decode(String),
    #[error("request failed: {0}")]
    Request(String),
}

impl ChatError {
    /// Text shown to the user in place of a reply.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::Unavailable { .. } => "Sorry, the assistant is currently unavailable. \
                 Please make sure the server is running and try again."
                .to_string(),
            ChatError::Timeout { .. } => {
                "Sorry, the request took too long. Please try again.".to_string()
            }
            ChatError::Status { status: 404, .. } => {
                "Sorry, the chat endpoint was not found (HTTP 404). Please check the server URL."
                    .to_string()
            }
            ChatError::Status { status, .. } if *status >= 500 => format!(
                "Sorry, the server ran into a problem (HTTP {}). Please try again later.",
                status
            ),
            ChatError::Status { status, .. } => {
                format!("Sorry, the server rejected the request (HTTP {}).", status)
            }
            ChatError::Decode(_) => "Sorry, I couldn't understand the server's reply.".to_string(),
            ChatError::Request(_) => {
                "Sorry, something went wrong while sending your message.".to_string()
            }
        }
    }

    /// Whether trying again later can plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ChatError::Unavailable { .. } | ChatError::Timeout { .. } => true,
            ChatError::Status { status, .. } => *status >= 500,
            ChatError::Decode(_) | ChatError::Request(_) => false,
        }
    }
}

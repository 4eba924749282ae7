use serde::{Deserialize, Serialize};

/// Body the backend posts to the action server's `/webhook`.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionCall {
    pub next_action: String,
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub tracker: Tracker,
    #[serde(default)]
    pub domain: serde_json::Value,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Tracker {
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub latest_message: LatestMessage,
}

impl Tracker {
    pub fn latest_text(&self) -> &str {
        self.latest_message.text.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LatestMessage {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub intent: Option<Intent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Intent {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
}

impl Utterance {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    pub events: Vec<serde_json::Value>,
    pub responses: Vec<Utterance>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionError {
    pub error: String,
    pub action_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_call_parses() {
        let call: ActionCall =
            serde_json::from_str(r#"{"next_action": "action_default_fallback"}"#).unwrap();
        assert_eq!(call.next_action, "action_default_fallback");
        assert_eq!(call.tracker.latest_text(), "");
    }

    #[test]
    fn tracker_with_null_text_parses() {
        let call: ActionCall = serde_json::from_str(
            r#"{
                "next_action": "action_default_fallback",
                "sender_id": "abc",
                "tracker": {
                    "sender_id": "abc",
                    "latest_message": {
                        "text": null,
                        "intent": {"name": "nlu_fallback", "confidence": 0.21}
                    },
                    "events": []
                },
                "domain": {"intents": []},
                "version": "3.6.0"
            }"#,
        )
        .unwrap();
        assert_eq!(call.tracker.latest_text(), "");
        let intent = call.tracker.latest_message.intent.unwrap();
        assert_eq!(intent.name.as_deref(), Some("nlu_fallback"));
    }
}

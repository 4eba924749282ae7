use serde::{Deserialize, Serialize};

/// One element of the webhook's JSON array reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BotMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<Button>>,
}

impl BotMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Button {
    pub title: String,
    #[serde(default)]
    pub payload: String,
}

impl Button {
    /// What gets re-submitted when the button is chosen.
    pub fn submission(&self) -> &str {
        if self.payload.is_empty() {
            &self.title
        } else {
            &self.payload
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Attachment {
    Image { url: String },
    Buttons { buttons: Vec<Button> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: String,
    #[serde(flatten)]
    pub attachment: Option<Attachment>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>, attachment: Option<Attachment>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            attachment,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, None)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content, None)
    }

    /// Splits a webhook reply element into displayable messages:
    /// text (carrying any buttons) first, then the image.
    pub fn from_bot(reply: BotMessage) -> Vec<Self> {
        let mut out = Vec::new();
        let buttons = reply.buttons.filter(|b| !b.is_empty());

        match (reply.text, buttons) {
            (text, Some(buttons)) => out.push(Self::new(
                Role::Assistant,
                text.unwrap_or_default(),
                Some(Attachment::Buttons { buttons }),
            )),
            (Some(text), None) => out.push(Self::assistant(text)),
            (None, None) => {}
        }

        if let Some(url) = reply.image {
            out.push(Self::new(
                Role::Assistant,
                url.clone(),
                Some(Attachment::Image { url }),
            ));
        }

        out
    }

    pub fn buttons(&self) -> Option<&[Button]> {
        match &self.attachment {
            Some(Attachment::Buttons { buttons }) => Some(buttons),
            _ => None,
        }
    }
}

/// Append-only message log for one chat session.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    messages: Vec<Message>,
}

impl ConversationHistory {
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Buttons offered since the user last spoke.
    pub fn active_buttons(&self) -> Option<&[Button]> {
        self.messages
            .iter()
            .rev()
            .take_while(|m| m.role == Role::Assistant)
            .find_map(Message::buttons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_reply_parses_all_element_kinds() {
        let replies: Vec<BotMessage> = serde_json::from_str(
            r#"[
                {"recipient_id": "u1", "text": "Hi!"},
                {"recipient_id": "u1", "image": "https://example.com/cat.png"},
                {"recipient_id": "u1", "text": "Pick one",
                 "buttons": [{"title": "Yes", "payload": "/affirm"}, {"title": "No"}]}
            ]"#,
        )
        .unwrap();

        assert_eq!(replies.len(), 3);
        assert_eq!(replies[1].image.as_deref(), Some("https://example.com/cat.png"));
        let buttons = replies[2].buttons.as_ref().unwrap();
        assert_eq!(buttons[0].submission(), "/affirm");
        assert_eq!(buttons[1].submission(), "No");
    }

    #[test]
    fn text_with_image_becomes_two_messages() {
        let messages = Message::from_bot(BotMessage {
            text: Some("Here you go".into()),
            image: Some("https://example.com/map.png".into()),
            ..Default::default()
        });
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "Here you go");
        assert_eq!(
            messages[1].attachment,
            Some(Attachment::Image {
                url: "https://example.com/map.png".into()
            })
        );
    }

    #[test]
    fn empty_element_renders_nothing() {
        assert!(Message::from_bot(BotMessage::default()).is_empty());
    }

    #[test]
    fn buttons_expire_once_the_user_speaks() {
        let mut history = ConversationHistory::default();
        history.extend(Message::from_bot(BotMessage {
            text: Some("Pick".into()),
            buttons: Some(vec![Button {
                title: "A".into(),
                payload: "a".into(),
            }]),
            ..Default::default()
        }));
        history.push(Message::assistant("more text"));
        assert_eq!(history.active_buttons().map(|b| b.len()), Some(1));

        history.push(Message::user("something else"));
        assert!(history.active_buttons().is_none());
    }

    #[test]
    fn message_serializes_with_flat_type_tag() {
        let msg = Message::from_bot(BotMessage {
            text: Some("Pick".into()),
            buttons: Some(vec![Button {
                title: "A".into(),
                payload: "a".into(),
            }]),
            ..Default::default()
        })
        .remove(0);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["type"], "buttons");
        assert_eq!(value["buttons"][0]["payload"], "a");

        let plain = serde_json::to_value(Message::user("hi")).unwrap();
        assert!(plain.get("type").is_none());
    }
}

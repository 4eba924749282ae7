use super::protocol::{Tracker, Utterance};
use crate::fallback::FallbackResponder;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::info;

pub trait Action: Send + Sync {
    fn name(&self) -> &'static str;
    fn run(&self, tracker: &Tracker) -> Vec<Utterance>;
}

/// Answers from the knowledge base when the backend's classifier is unsure.
pub struct DefaultFallbackAction {
    pub responder: Arc<FallbackResponder>,
}

impl Action for DefaultFallbackAction {
    fn name(&self) -> &'static str {
        "action_default_fallback"
    }

    fn run(&self, tracker: &Tracker) -> Vec<Utterance> {
        let reply = self.responder.respond(tracker.latest_text());
        vec![Utterance::text(reply.into_text())]
    }
}

pub struct ProvideHelpAction {
    pub responder: Arc<FallbackResponder>,
}

impl Action for ProvideHelpAction {
    fn name(&self) -> &'static str {
        "action_provide_help"
    }

    fn run(&self, _tracker: &Tracker) -> Vec<Utterance> {
        vec![Utterance::text(self.responder.help())]
    }
}

#[derive(Default)]
pub struct ActionRegistry {
    actions: IndexMap<&'static str, Box<dyn Action>>,
}

impl ActionRegistry {
    pub fn with_defaults(responder: Arc<FallbackResponder>) -> Self {
        let mut registry = Self::default();
        registry.register(DefaultFallbackAction {
            responder: responder.clone(),
        });
        registry.register(ProvideHelpAction { responder });
        registry
    }

    pub fn register<A: Action + 'static>(&mut self, action: A) {
        info!("Registered action: {}", action.name());
        self.actions.insert(action.name(), Box::new(action));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Action> {
        self.actions.get(name).map(|a| a.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.actions.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::FallbackOptions;
    use crate::knowledge::{KnowledgeBase, QaPair};

    fn registry() -> ActionRegistry {
        let kb = KnowledgeBase::from_pairs([QaPair {
            question: "How do I reset my password?".into(),
            answer: "Use the 'Forgot password' link.".into(),
        }]);
        let responder = FallbackResponder::new(Arc::new(kb), FallbackOptions::default());
        ActionRegistry::with_defaults(Arc::new(responder))
    }

    #[test]
    fn defaults_are_registered_in_order() {
        let names: Vec<_> = registry().names().collect();
        assert_eq!(names, vec!["action_default_fallback", "action_provide_help"]);
    }

    #[test]
    fn fallback_answers_from_latest_message() {
        let registry = registry();
        let mut tracker = Tracker::default();
        tracker.latest_message.text = Some("reset my password".into());

        let out = registry.get("action_default_fallback").unwrap().run(&tracker);
        assert_eq!(out, vec![Utterance::text("Use the 'Forgot password' link.")]);
    }

    #[test]
    fn unknown_action_is_absent() {
        assert!(registry().get("action_launch_rockets").is_none());
    }
}

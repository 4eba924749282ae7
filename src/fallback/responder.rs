use super::small_talk::SmallTalk;
use crate::config::Config;
use crate::knowledge::{KnowledgeBase, QaPair, QuestionIndex, VectorizerOptions};
use rand::seq::SliceRandom;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

pub const DEFAULT_THRESHOLD: f64 = 0.3;

const NO_MATCH_REPLIES: [&str; 5] = [
    "I'm not sure I understand that completely. Could you rephrase your question?",
    "That's an interesting question! I might not have the exact answer, but let me know if you'd like to explore something else.",
    "I'm still learning about that topic. Is there something specific you'd like to know?",
    "I don't have information about that right now. Could you ask me something else?",
    "That's outside my current knowledge. What else would you like to discuss?",
];

const HELP_MESSAGE: &str = "I'm here to help! Here are some things you can try:\n\
- Ask me questions about topics I've been trained on\n\
- Use clear, specific language\n\
- Try rephrasing if I don't understand\n\
- Ask \"What can you do?\" to learn more about my capabilities";

#[derive(Debug, Clone)]
pub struct FallbackOptions {
    pub threshold: f64,
    pub small_talk_filter: bool,
    pub vectorizer: VectorizerOptions,
    pub bot_name: String,
}

impl Default for FallbackOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            small_talk_filter: true,
            vectorizer: VectorizerOptions::default(),
            bot_name: "SupportSage".to_string(),
        }
    }
}

impl From<&Config> for FallbackOptions {
    fn from(config: &Config) -> Self {
        Self {
            threshold: config.fallback.threshold,
            small_talk_filter: config.fallback.small_talk_filter,
            vectorizer: VectorizerOptions {
                ngram_max: config.fallback.ngram_max,
                stop_words: config.fallback.stop_words,
            },
            bot_name: config.chat.bot_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Answer {
        text: String,
        question: String,
        score: f64,
    },
    Greeting(String),
    Goodbye(String),
    NoMatch(String),
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Answer { text, .. } => text,
            Reply::Greeting(text) | Reply::Goodbye(text) | Reply::NoMatch(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Reply::Answer { text, .. } => text,
            Reply::Greeting(text) | Reply::Goodbye(text) | Reply::NoMatch(text) => text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarAnswer<'a> {
    pub pair: &'a QaPair,
    pub score: f64,
}

/// Nearest-question lookup used when the backend cannot classify an utterance.
pub struct FallbackResponder {
    kb: Arc<KnowledgeBase>,
    index: QuestionIndex,
    candidates: Vec<bool>,
    options: FallbackOptions,
}

impl FallbackResponder {
    pub fn new(kb: Arc<KnowledgeBase>, options: FallbackOptions) -> Self {
        let index = QuestionIndex::build(kb.questions(), options.vectorizer);
        let candidates: Vec<bool> = kb
            .questions()
            .map(|q| !options.small_talk_filter || SmallTalk::detect(q).is_none())
            .collect();

        info!(
            "Fallback index ready ({} questions, {} candidates, {} terms, threshold {})",
            index.len(),
            candidates.iter().filter(|c| **c).count(),
            index.vocabulary_len(),
            options.threshold
        );

        Self {
            kb,
            index,
            candidates,
            options,
        }
    }

    /// Loads the knowledge base; a file that cannot be read yields a
    /// responder that never matches.
    pub fn load(path: &Path, options: FallbackOptions) -> Self {
        let kb = match KnowledgeBase::load(path) {
            Ok(kb) => kb,
            Err(e) => {
                error!("Error loading knowledge base {}: {}", path.display(), e);
                KnowledgeBase::default()
            }
        };
        Self::new(Arc::new(kb), options)
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    pub fn threshold(&self) -> f64 {
        self.options.threshold
    }

    /// Best stored answer whose question scores strictly above the threshold.
    pub fn find_similar(&self, text: &str) -> Option<SimilarAnswer<'_>> {
        if text.trim().is_empty() {
            return None;
        }

        let best = self
            .index
            .best_match(text, |i| self.candidates.get(i).copied().unwrap_or(false))?;
        debug!("Best match #{} with similarity {:.3}", best.index, best.score);

        if best.score > self.options.threshold {
            self.kb.get(best.index).map(|pair| SimilarAnswer {
                pair,
                score: best.score,
            })
        } else {
            None
        }
    }

    pub fn respond(&self, text: &str) -> Reply {
        if self.options.small_talk_filter {
            match SmallTalk::detect(text) {
                Some(SmallTalk::Greeting) => return Reply::Greeting(self.greeting()),
                Some(SmallTalk::Goodbye) => return Reply::Goodbye(self.goodbye()),
                None => {}
            }
        }

        match self.find_similar(text) {
            Some(found) => Reply::Answer {
                text: found.pair.answer.clone(),
                question: found.pair.question.clone(),
                score: found.score,
            },
            None => Reply::NoMatch(no_match_reply().to_string()),
        }
    }

    /// Ranked candidates regardless of threshold, for diagnostics.
    pub fn top_matches(&self, text: &str, k: usize) -> Vec<SimilarAnswer<'_>> {
        self.index
            .top_matches(text, k)
            .into_iter()
            .filter_map(|m| {
                self.kb.get(m.index).map(|pair| SimilarAnswer {
                    pair,
                    score: m.score,
                })
            })
            .collect()
    }

    pub fn help(&self) -> &'static str {
        HELP_MESSAGE
    }

    fn greeting(&self) -> String {
        format!(
            "Hello! I'm {}, your support assistant. How can I help you today?",
            self.options.bot_name
        )
    }

    fn goodbye(&self) -> String {
        format!(
            "Goodbye! Thanks for chatting with {}. Come back anytime.",
            self.options.bot_name
        )
    }
}

fn no_match_reply() -> &'static str {
    NO_MATCH_REPLIES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(NO_MATCH_REPLIES[0])
}

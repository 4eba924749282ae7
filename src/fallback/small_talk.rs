use crate::knowledge::normalize;

const GREETING_KEYWORDS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "hiya",
    "howdy",
    "greetings",
    "good morning",
    "good afternoon",
    "good evening",
];

const GOODBYE_KEYWORDS: &[&str] = &[
    "bye",
    "goodbye",
    "good bye",
    "bye bye",
    "see you",
    "see ya",
    "farewell",
    "good night",
    "take care",
];

/// Longest user input still treated as pure small talk.
const MAX_SMALL_TALK_WORDS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmallTalk {
    Greeting,
    Goodbye,
}

impl SmallTalk {
    /// Classifies a user utterance. Longer inputs that merely open with a
    /// greeting ("hi, where is my order?") are left to the lookup.
    pub fn detect(text: &str) -> Option<Self> {
        let words = tokens(text);
        if words.is_empty() || words.len() > MAX_SMALL_TALK_WORDS {
            return None;
        }
        classify(&words)
    }
}

fn tokens(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .map(String::from)
        .collect()
}

fn classify(words: &[String]) -> Option<SmallTalk> {
    if GREETING_KEYWORDS.iter().any(|k| contains_phrase(words, k)) {
        Some(SmallTalk::Greeting)
    } else if GOODBYE_KEYWORDS.iter().any(|k| contains_phrase(words, k)) {
        Some(SmallTalk::Goodbye)
    } else {
        None
    }
}

fn contains_phrase(words: &[String], phrase: &str) -> bool {
    let phrase: Vec<&str> = phrase.split(' ').collect();
    words
        .windows(phrase.len())
        .any(|window| window.iter().zip(&phrase).all(|(w, p)| w == p))
}

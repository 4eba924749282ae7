use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself", "him",
    "himself", "his", "i", "if", "in", "into", "is", "it", "its", "itself", "me", "more", "most",
    "my", "myself", "no", "nor", "not", "of", "off", "on", "once", "only", "or", "other", "our",
    "ours", "ourselves", "out", "over", "own", "same", "she", "should", "so", "some", "such",
    "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there", "these",
    "they", "this", "those", "through", "to", "too", "under", "until", "up", "very", "was", "we",
    "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with",
    "would", "you", "your", "yours", "yourself", "yourselves",
];

static STOP_WORDS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ENGLISH_STOP_WORDS.iter().copied().collect());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorizerOptions {
    /// Longest n-gram to emit; 1 = unigrams only.
    pub ngram_max: usize,
    pub stop_words: bool,
}

impl Default for VectorizerOptions {
    fn default() -> Self {
        Self {
            ngram_max: 2,
            stop_words: false,
        }
    }
}

/// Lowercases and keeps only alphanumerics and whitespace.
/// Apostrophes are dropped so contractions stay one token ("don't" -> "dont").
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '\'' && *c != '’')
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect()
}

/// Splits normalized text into words of at least two characters.
pub fn words(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .filter(|w| w.chars().count() >= 2)
        .map(String::from)
        .collect()
}

/// L2-normalized sparse vector, entries sorted by term id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    fn from_weights(mut entries: Vec<(usize, f64)>) -> Self {
        entries.sort_unstable_by_key(|(term, _)| *term);
        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            entries.iter_mut().for_each(|(_, w)| *w /= norm);
        } else {
            entries.clear();
        }
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cosine similarity; both sides are unit length so this is the dot
    /// product, clamped to `[0, 1]` against rounding.
    pub fn cosine(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j, mut dot) = (0, 0, 0.0);
        while i < self.entries.len() && j < other.entries.len() {
            let (a, wa) = self.entries[i];
            let (b, wb) = other.entries[j];
            match a.cmp(&b) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    dot += wa * wb;
                    i += 1;
                    j += 1;
                }
            }
        }
        dot.clamp(0.0, 1.0)
    }
}

/// Bag-of-n-grams TF-IDF model with smoothed IDF.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    options: VectorizerOptions,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Fits the vocabulary and IDF weights, returning the model and the
    /// vectors of the fitted documents.
    pub fn fit_transform<'a, I>(documents: I, options: VectorizerOptions) -> (Self, Vec<SparseVector>)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: Vec<usize> = Vec::new();
        let mut doc_counts: Vec<HashMap<usize, usize>> = Vec::new();

        for doc in documents {
            let mut counts: HashMap<usize, usize> = HashMap::new();
            for term in analyze(doc, &options) {
                let next_id = vocabulary.len();
                let id = *vocabulary.entry(term).or_insert(next_id);
                if id == doc_freq.len() {
                    doc_freq.push(0);
                }
                *counts.entry(id).or_insert(0) += 1;
            }
            for id in counts.keys() {
                doc_freq[*id] += 1;
            }
            doc_counts.push(counts);
        }

        let n_docs = doc_counts.len() as f64;
        let idf: Vec<f64> = doc_freq
            .iter()
            .map(|&df| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let vectors = doc_counts
            .into_iter()
            .map(|counts| weigh(counts, &idf))
            .collect();

        (
            Self {
                options,
                vocabulary,
                idf,
            },
            vectors,
        )
    }

    /// Vectorizes `text` against the fitted vocabulary; unknown terms are ignored.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: HashMap<usize, usize> = HashMap::new();
        for term in analyze(text, &self.options) {
            if let Some(&id) = self.vocabulary.get(&term) {
                *counts.entry(id).or_insert(0) += 1;
            }
        }
        weigh(counts, &self.idf)
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }
}

fn weigh(counts: HashMap<usize, usize>, idf: &[f64]) -> SparseVector {
    SparseVector::from_weights(
        counts
            .into_iter()
            .map(|(id, count)| (id, count as f64 * idf[id]))
            .collect(),
    )
}

fn analyze(text: &str, options: &VectorizerOptions) -> Vec<String> {
    let tokens: Vec<String> = words(text)
        .into_iter()
        .filter(|w| !options.stop_words || !STOP_WORDS.contains(w.as_str()))
        .collect();

    let mut terms = Vec::with_capacity(tokens.len() * options.ngram_max.max(1));
    for n in 1..=options.ngram_max.max(1) {
        if n > tokens.len() {
            break;
        }
        terms.extend(tokens.windows(n).map(|window| window.join(" ")));
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_punctuation_and_case() {
        assert_eq!(normalize("Don't PANIC!"), "dont panic ");
        assert_eq!(words("A refund, please?"), vec!["refund", "please"]);
    }

    #[test]
    fn analyze_emits_unigrams_then_bigrams() {
        let options = VectorizerOptions::default();
        assert_eq!(
            analyze("reset my password", &options),
            vec!["reset", "my", "password", "reset my", "my password"]
        );
    }

    #[test]
    fn stop_words_are_optional() {
        let options = VectorizerOptions {
            ngram_max: 1,
            stop_words: true,
        };
        assert_eq!(analyze("what is my password", &options), vec!["password"]);
    }

    #[test]
    fn identical_text_has_unit_similarity() {
        let (model, vectors) = TfidfVectorizer::fit_transform(
            ["how do I reset my password", "where is my order"],
            VectorizerOptions::default(),
        );
        let query = model.transform("How do I reset my password?");
        assert!((query.cosine(&vectors[0]) - 1.0).abs() < 1e-9);
        assert!(query.cosine(&vectors[1]) < 0.5);
    }

    #[test]
    fn self_similarity_never_exceeds_one() {
        let (model, vectors) = TfidfVectorizer::fit_transform(
            ["What are your opening hours?", "How do I reset my password?"],
            VectorizerOptions::default(),
        );
        for (text, vector) in ["What are your opening hours?", "How do I reset my password?"]
            .iter()
            .zip(&vectors)
        {
            let score = model.transform(text).cosine(vector);
            assert!(score <= 1.0, "{} scored {:e}", text, score);
            assert!(score > 0.999);
        }
    }

    #[test]
    fn rare_terms_weigh_more() {
        let (_, vectors) = TfidfVectorizer::fit_transform(
            ["order status", "order refund", "order cancel"],
            VectorizerOptions {
                ngram_max: 1,
                stop_words: false,
            },
        );
        // "order" appears everywhere, so each document is dominated by its rarer term.
        assert!(vectors[0].entries[1].1 > vectors[0].entries[0].1);
    }

    #[test]
    fn unknown_vocabulary_yields_empty_vector() {
        let (model, _) =
            TfidfVectorizer::fit_transform(["shipping times"], VectorizerOptions::default());
        assert!(model.transform("quantum chromodynamics").is_empty());
        assert!(model.transform("!!").is_empty());
    }
}

use super::vectorizer::{SparseVector, TfidfVectorizer, VectorizerOptions};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    /// Position of the matched question in the indexed list.
    pub index: usize,
    pub score: f64,
}

/// TF-IDF vectors for a fixed list of questions, fitted once and queried per request.
#[derive(Debug, Clone)]
pub struct QuestionIndex {
    vectorizer: TfidfVectorizer,
    vectors: Vec<SparseVector>,
}

impl QuestionIndex {
    pub fn build<'a, I>(questions: I, options: VectorizerOptions) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let (vectorizer, vectors) = TfidfVectorizer::fit_transform(questions, options);
        Self {
            vectorizer,
            vectors,
        }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vectorizer.vocabulary_len()
    }

    /// Highest-scoring question among those accepted by `candidate`.
    /// Ties keep the earliest question.
    pub fn best_match<F>(&self, query: &str, candidate: F) -> Option<Match>
    where
        F: Fn(usize) -> bool,
    {
        let query = self.vectorizer.transform(query);
        let mut best: Option<Match> = None;

        for (index, vector) in self.vectors.iter().enumerate() {
            if !candidate(index) {
                continue;
            }
            let score = query.cosine(vector);
            if best.is_none_or(|b| score > b.score) {
                best = Some(Match { index, score });
            }
        }

        best
    }

    /// All questions ranked by similarity, best first, truncated to `k`.
    pub fn top_matches(&self, query: &str, k: usize) -> Vec<Match> {
        let query = self.vectorizer.transform(query);
        let mut matches: Vec<Match> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(index, vector)| Match {
                index,
                score: query.cosine(vector),
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.index.cmp(&b.index))
        });
        matches.truncate(k);
        matches
    }
}

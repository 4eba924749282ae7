mod error;
mod index;
mod source;
mod vectorizer;

pub use error::KnowledgeError;
pub use index::{Match, QuestionIndex};
pub use source::{SourceRow, SourceTable, read_source, read_source_from};
pub use vectorizer::{VectorizerOptions, normalize};

use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// Question/answer table loaded once per process.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    pairs: Vec<QaPair>,
}

impl KnowledgeBase {
    pub fn load(path: &Path) -> Result<Self, KnowledgeError> {
        let table = read_source(path)?;
        if !table.malformed.is_empty() {
            warn!(
                "Skipping {} malformed row(s) in {} (lines {:?})",
                table.malformed.len(),
                path.display(),
                table.malformed
            );
        }

        let kb = Self::from_table(&table);
        info!(
            "Loaded {} Q&A pairs from {} ({} rows discarded)",
            kb.len(),
            path.display(),
            table.rows.len() - kb.len()
        );
        Ok(kb)
    }

    pub fn from_table(table: &SourceTable) -> Self {
        Self {
            pairs: table
                .complete_rows()
                .map(|row| QaPair {
                    question: row.question.clone(),
                    answer: row.answer.clone(),
                })
                .collect(),
        }
    }

    /// Pairs with an empty question or answer after trimming are dropped.
    pub fn from_pairs(pairs: impl IntoIterator<Item = QaPair>) -> Self {
        Self {
            pairs: pairs
                .into_iter()
                .map(|p| QaPair {
                    question: p.question.trim().to_string(),
                    answer: p.answer.trim().to_string(),
                })
                .filter(|p| !p.question.is_empty() && !p.answer.is_empty())
                .collect(),
        }
    }

    pub fn pairs(&self) -> &[QaPair] {
        &self.pairs
    }

    pub fn get(&self, index: usize) -> Option<&QaPair> {
        self.pairs.get(index)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn questions(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|p| p.question.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_discards_incomplete_and_malformed_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "q,a\nWhere is my order?,Check the tracking page.\nbroken\n,no question\nRefunds?,  \nHours?,9 to 5\n"
        )
        .unwrap();

        let kb = KnowledgeBase::load(file.path()).unwrap();
        assert_eq!(kb.len(), 2);
        assert_eq!(kb.get(1).unwrap().answer, "9 to 5");
        assert_eq!(
            kb.questions().collect::<Vec<_>>(),
            vec!["Where is my order?", "Hours?"]
        );
    }

    #[test]
    fn from_pairs_trims_and_filters() {
        let kb = KnowledgeBase::from_pairs([
            QaPair {
                question: "  Hi?  ".into(),
                answer: " Hello ".into(),
            },
            QaPair {
                question: "   ".into(),
                answer: "dropped".into(),
            },
        ]);
        assert_eq!(
            kb.pairs(),
            &[QaPair {
                question: "Hi?".into(),
                answer: "Hello".into(),
            }]
        );
    }
}

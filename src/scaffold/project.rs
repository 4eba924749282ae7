use crate::config::IdStrategy;
use crate::knowledge::{SourceRow, SourceTable};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

const HASH_PREFIX_LEN: usize = 12;

/// One intent/response/rule triple derived from a complete source row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaEntry {
    pub row: usize,
    pub intent: String,
    pub question: String,
    pub answer: String,
}

impl QaEntry {
    pub fn response(&self) -> String {
        format!("utter_{}", self.intent)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GeneratedProject {
    pub entries: Vec<QaEntry>,
    /// Rows dropped for an empty question or answer.
    pub skipped: usize,
}

impl GeneratedProject {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn intents(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.intent.as_str())
    }
}

pub fn build_project(table: &SourceTable, strategy: IdStrategy) -> GeneratedProject {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut entries = Vec::new();

    for row in table.complete_rows() {
        let question = collapse_whitespace(&row.question);
        let intent = match strategy {
            IdStrategy::Positional => positional_id(row),
            IdStrategy::Hashed => {
                let base = hashed_id(&question);
                let count = seen.entry(base.clone()).or_insert(0);
                *count += 1;
                if *count == 1 {
                    base
                } else {
                    format!("{}_{}", base, count)
                }
            }
        };

        entries.push(QaEntry {
            row: row.index,
            intent,
            question,
            answer: row.answer.clone(),
        });
    }

    GeneratedProject {
        skipped: table.rows.len() - entries.len(),
        entries,
    }
}

fn positional_id(row: &SourceRow) -> String {
    format!("qa_pair_{}", row.index)
}

/// `qa_` plus the first hex digits of SHA-256 over the question.
pub fn hashed_id(question: &str) -> String {
    let digest = Sha256::digest(question.as_bytes());
    let hex = hex::encode(digest);
    format!("qa_{}", &hex[..HASH_PREFIX_LEN])
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::read_source_from;

    fn table(csv: &str) -> SourceTable {
        read_source_from(csv.as_bytes()).unwrap()
    }

    #[test]
    fn positional_ids_follow_row_index_and_skip_empty_rows() {
        let project = build_project(
            &table("question,answer\nHi?,Hello\n,orphan\nBye?,Goodbye\n"),
            IdStrategy::Positional,
        );
        let intents: Vec<_> = project.intents().collect();
        assert_eq!(intents, vec!["qa_pair_0", "qa_pair_2"]);
        assert_eq!(project.skipped, 1);
        assert_eq!(project.entries[1].response(), "utter_qa_pair_2");
    }

    #[test]
    fn hashed_ids_survive_row_insertion() {
        let before = build_project(
            &table("q,a\nWhat are your hours?,9 to 5\nDo you ship?,Yes\n"),
            IdStrategy::Hashed,
        );
        let after = build_project(
            &table("q,a\nHow do I return an item?,Use the form\nWhat are your hours?,9 to 5\nDo you ship?,Yes\n"),
            IdStrategy::Hashed,
        );

        assert_eq!(before.entries[0].intent, after.entries[1].intent);
        assert_eq!(before.entries[1].intent, after.entries[2].intent);
        assert_eq!(before.entries[0].intent.len(), "qa_".len() + HASH_PREFIX_LEN);
    }

    #[test]
    fn duplicate_questions_get_suffixes() {
        let project = build_project(
            &table("q,a\nDo you ship?,Yes\nDo   you ship?,Worldwide\nDo you ship?,Again\n"),
            IdStrategy::Hashed,
        );
        let base = hashed_id("Do you ship?");
        let intents: Vec<_> = project.intents().collect();
        assert_eq!(
            intents,
            vec![base.clone(), format!("{}_2", base), format!("{}_3", base)]
        );
    }

    #[test]
    fn internal_whitespace_is_collapsed() {
        assert_eq!(collapse_whitespace(" a \t b\n\nc "), "a b c");
    }
}

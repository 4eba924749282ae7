use super::KnowledgeError;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Cell values that spreadsheet exports use for "no value".
const MISSING_MARKERS: &[&str] = &[
    "nan", "NaN", "-nan", "-NaN", "NA", "N/A", "n/a", "<NA>", "#N/A", "#NA", "null", "NULL",
    "None",
];

/// One data row of a question/answer table, columns taken positionally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    /// 0-based data row position (header excluded).
    pub index: usize,
    pub question: String,
    pub answer: String,
}

impl SourceRow {
    pub fn is_complete(&self) -> bool {
        !self.question.is_empty() && !self.answer.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    pub rows: Vec<SourceRow>,
    /// Line numbers of rows with fewer than two fields.
    pub malformed: Vec<u64>,
}

impl SourceTable {
    pub fn complete_rows(&self) -> impl Iterator<Item = &SourceRow> {
        self.rows.iter().filter(|row| row.is_complete())
    }
}

pub fn read_source(path: &Path) -> Result<SourceTable, KnowledgeError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => KnowledgeError::NotFound(path.to_path_buf()),
        _ => KnowledgeError::Io(e),
    })?;
    read_source_from(file)
}

pub fn read_source_from<R: Read>(input: R) -> Result<SourceTable, KnowledgeError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let columns = reader.headers()?.len();
    if columns < 2 {
        return Err(KnowledgeError::MissingColumns(columns));
    }

    let mut table = SourceTable::default();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() < 2 {
            let line = record
                .position()
                .map(|p| p.line())
                .unwrap_or(index as u64 + 2);
            table.malformed.push(line);
            continue;
        }

        table.rows.push(SourceRow {
            index,
            question: clean_cell(&record[0]),
            answer: clean_cell(&record[1]),
        });
    }

    Ok(table)
}

fn clean_cell(raw: &str) -> String {
    let value = raw.trim();
    if MISSING_MARKERS.contains(&value) {
        String::new()
    } else {
        value.to_string()
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

pub type Metadata = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Text,
    Csv,
}

impl SourceKind {
    pub fn from_extension(extension: &str) -> Option<Self> {
        if extension.eq_ignore_ascii_case("txt") {
            Some(SourceKind::Text)
        } else if extension.eq_ignore_ascii_case("csv") {
            Some(SourceKind::Csv)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub path: PathBuf,
    pub kind: SourceKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    pub content: String,
    pub metadata: Metadata,
}

impl RawDocument {
    pub fn source(&self) -> &str {
        self.metadata.get("source").map(String::as_str).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub chunk_index: usize,
    pub char_start: usize,
    pub char_end: usize,
    pub document_index: usize,
    pub metadata: Metadata,
}

impl Chunk {
    pub fn char_len(&self) -> usize {
        self.char_end - self.char_start
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub batch_index: usize,
    pub file_count: usize,
    pub document_count: usize,
    pub chunk_count: usize,
    pub deleted_records: Option<usize>,
    pub duration: Duration,
}

impl BatchResult {
    pub fn empty(batch_index: usize) -> Self {
        Self {
            batch_index,
            file_count: 0,
            document_count: 0,
            chunk_count: 0,
            deleted_records: None,
            duration: Duration::ZERO,
        }
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration.as_secs_f64()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub batches: Vec<BatchResult>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn total_files(&self) -> usize {
        self.batches.iter().map(|batch| batch.file_count).sum()
    }

    pub fn total_documents(&self) -> usize {
        self.batches.iter().map(|batch| batch.document_count).sum()
    }

    pub fn total_chunks(&self) -> usize {
        self.batches.iter().map(|batch| batch.chunk_count).sum()
    }

    pub fn deleted_records(&self) -> usize {
        self.batches
            .iter()
            .filter_map(|batch| batch.deleted_records)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_matching_is_case_insensitive() {
        assert_eq!(SourceKind::from_extension("TXT"), Some(SourceKind::Text));
        assert_eq!(SourceKind::from_extension("csv"), Some(SourceKind::Csv));
        assert_eq!(SourceKind::from_extension("pdf"), None);
    }

    #[test]
    fn summary_totals_accumulate_batches() {
        let mut first = BatchResult::empty(0);
        first.file_count = 3;
        first.document_count = 7;
        first.chunk_count = 12;
        first.deleted_records = Some(40);
        let mut second = BatchResult::empty(1);
        second.file_count = 1;
        second.document_count = 1;
        second.chunk_count = 2;

        let summary = RunSummary {
            run_id: "run".to_string(),
            batches: vec![first, second, BatchResult::empty(2)],
            elapsed: Duration::from_secs(3),
        };

        assert_eq!(summary.total_files(), 4);
        assert_eq!(summary.total_documents(), 8);
        assert_eq!(summary.total_chunks(), 14);
        assert_eq!(summary.deleted_records(), 40);
    }
}

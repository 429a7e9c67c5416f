use crate::error::IngestError;
use crate::models::{Metadata, RawDocument, SourceFile, SourceKind};
use csv::ReaderBuilder;
use std::fs;
use std::path::Path;

pub trait DocumentParser {
    fn parse(&self, file: &SourceFile) -> Result<Vec<RawDocument>, IngestError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TextParser;

impl DocumentParser for TextParser {
    fn parse(&self, file: &SourceFile) -> Result<Vec<RawDocument>, IngestError> {
        let bytes = read_source(file)?;
        let content =
            String::from_utf8(bytes).map_err(|error| IngestError::parse(&file.name, error))?;

        Ok(vec![RawDocument {
            content,
            metadata: base_metadata(file),
        }])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CsvParser {
    pub delimiter: u8,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl DocumentParser for CsvParser {
    fn parse(&self, file: &SourceFile) -> Result<Vec<RawDocument>, IngestError> {
        let bytes = read_source(file)?;
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_reader(bytes.as_slice());

        let headers = reader
            .headers()
            .map_err(|error| IngestError::parse(&file.name, error))?
            .iter()
            .map(|header| header.trim().to_string())
            .collect::<Vec<_>>();

        let mut documents = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|error| IngestError::parse(&file.name, error))?;
            let content = headers
                .iter()
                .zip(record.iter())
                .map(|(header, value)| format!("{header}: {}", value.trim()))
                .collect::<Vec<_>>()
                .join("\n");

            let mut metadata = base_metadata(file);
            metadata.insert("line".to_string(), (row + 1).to_string());
            documents.push(RawDocument { content, metadata });
        }

        Ok(documents)
    }
}

pub fn parse_source_file(file: &SourceFile) -> Result<Vec<RawDocument>, IngestError> {
    match file.kind {
        SourceKind::Text => TextParser.parse(file),
        SourceKind::Csv => CsvParser::default().parse(file),
    }
}

fn read_source(file: &SourceFile) -> Result<Vec<u8>, IngestError> {
    fs::read(&file.path).map_err(|error| IngestError::parse(&file.name, error))
}

fn base_metadata(file: &SourceFile) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("source".to_string(), file.name.clone());
    metadata.insert("path".to_string(), display_path(&file.path));
    metadata
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

//! Labeled corpus loading
//!
//! Reads a CSV file whose first column is the label (`spam` or `ham`) and
//! whose second column is the message text. The first record is a header.
//! Further columns are ignored. Files that are not valid UTF-8 are decoded as
//! Windows-1252, which is how most public SMS/email spam corpora are encoded.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{Result, SpamError};
use crate::model::types::Label;

/// One labeled document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub label: Label,
    pub text: String,
}

impl TrainingExample {
    pub fn new(label: Label, text: impl Into<String>) -> Self {
        Self {
            label,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Corpus {
    examples: Vec<TrainingExample>,
    skipped: usize,
}

impl Corpus {
    pub fn from_examples(examples: Vec<TrainingExample>) -> Self {
        Self {
            examples,
            skipped: 0,
        }
    }

    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let content = decode_bytes(bytes);
        let corpus = Self::parse_csv(&content)?;

        let (ham, spam) = corpus.class_counts();
        info!(
            "Loaded corpus {:?}: {} examples ({} spam, {} ham), {} rows skipped",
            path,
            corpus.len(),
            spam,
            ham,
            corpus.skipped
        );
        Ok(corpus)
    }

    pub fn parse_csv(content: &str) -> Result<Self> {
        let records = parse_records(content)?;
        let mut examples = Vec::with_capacity(records.len());
        let mut skipped = 0;

        for (line, fields) in records.into_iter().skip(1) {
            if fields.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            if fields.len() < 2 {
                return Err(SpamError::Corpus(format!(
                    "line {}: expected label and text columns, found {} field(s)",
                    line,
                    fields.len()
                )));
            }

            let label: Label = fields[0].parse()?;
            let text = fields[1].trim();
            if text.is_empty() {
                warn!("Skipping corpus line {}: empty text", line);
                skipped += 1;
                continue;
            }
            examples.push(TrainingExample::new(label, text));
        }

        debug!("Parsed {} corpus examples", examples.len());
        Ok(Self { examples, skipped })
    }

    pub fn examples(&self) -> &[TrainingExample] {
        &self.examples
    }

    pub fn into_examples(self) -> Vec<TrainingExample> {
        self.examples
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Rows dropped because their text was empty
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// (ham, spam) counts
    pub fn class_counts(&self) -> (usize, usize) {
        let spam = self
            .examples
            .iter()
            .filter(|e| e.label == Label::Spam)
            .count();
        (self.examples.len() - spam, spam)
    }
}

/// Split CSV text into records, each tagged with its starting line number.
fn parse_records(input: &str) -> Result<Vec<(usize, Vec<String>)>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                record.push(std::mem::take(&mut field));
                records.push((record_line, std::mem::take(&mut record)));
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(SpamError::Corpus(format!(
            "unterminated quoted field in record starting on line {}",
            record_line
        )));
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push((record_line, record));
    }
    Ok(records)
}

/// UTF-8 if valid (minus any BOM), otherwise Windows-1252.
pub fn decode_bytes(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => match s.strip_prefix('\u{FEFF}') {
            Some(stripped) => stripped.to_string(),
            None => s,
        },
        Err(e) => {
            debug!("Corpus is not valid UTF-8, decoding as Windows-1252");
            e.into_bytes().iter().map(|&b| cp1252_char(b)).collect()
        }
    }
}

const CP1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

fn cp1252_char(b: u8) -> char {
    match b {
        0x80..=0x9F => CP1252_HIGH[(b - 0x80) as usize],
        _ => char::from(b),
    }
}

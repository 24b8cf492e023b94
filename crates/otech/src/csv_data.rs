//! CSV attachment decoding.
//!
//! Attachments arrive as `data:<mime>;base64,<payload>` strings. The payload
//! is decoded, parsed with the first row as the header, and turned into one
//! [`StructuredRecord`] per data row.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Standard alphabet, accepting payloads with or without trailing padding.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Errors produced while decoding an attachment.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// No `,` separating the data-URI header from its payload.
    #[error("attachment is not a data URI")]
    InvalidDataUri,

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("attachment is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Only produced under [`RowPolicy::Strict`].
    #[error("row {row} has {found} cells, header has {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// What to do with a data row whose cell count differs from the header.
///
/// Extra cells beyond the header are dropped by every lenient policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowPolicy {
    /// Leave missing columns out of the record.
    #[default]
    Omit,
    /// Fill missing columns with an empty string.
    Pad,
    /// Reject the whole attachment.
    Strict,
}

/// One CSV data row keyed by header column, in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredRecord {
    fields: Vec<(String, String)>,
}

impl StructuredRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `column` to `value`. A repeated column keeps its first position
    /// and takes the latest value.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();
        Value::Object(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StructuredRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (column, value) in iter {
            record.insert(column, value);
        }
        record
    }
}

impl Serialize for StructuredRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Decode an attachment into records.
///
/// Returns `Ok(None)` when no attachment was supplied. A present attachment
/// with only a header row yields `Ok(Some(vec![]))`.
pub fn decode_attachment(
    data_uri: &str,
    policy: RowPolicy,
) -> Result<Option<Vec<StructuredRecord>>, DecodeError> {
    let data_uri = data_uri.trim();
    if data_uri.is_empty() {
        return Ok(None);
    }

    let text = decode_data_uri(data_uri)?;
    let records = parse_records(&text, policy)?;
    debug!(rows = records.len(), ?policy, "decoded CSV attachment");
    Ok(Some(records))
}

/// Strip the `data:...,` prefix and base64-decode the rest into text.
pub fn decode_data_uri(data_uri: &str) -> Result<String, DecodeError> {
    let (_, payload) = data_uri
        .split_once(',')
        .ok_or(DecodeError::InvalidDataUri)?;
    let payload: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = PAYLOAD_ENGINE.decode(payload.as_bytes())?;
    Ok(String::from_utf8(bytes)?)
}

/// Parse CSV text whose first row is the header.
pub fn parse_records(text: &str, policy: RowPolicy) -> Result<Vec<StructuredRecord>, DecodeError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for (index, row) in reader.records().enumerate() {
        let row = row?;
        if policy == RowPolicy::Strict && row.len() != headers.len() {
            return Err(DecodeError::RowLength {
                row: index + 1,
                expected: headers.len(),
                found: row.len(),
            });
        }

        let mut record = StructuredRecord::new();
        for (position, column) in headers.iter().enumerate() {
            match row.get(position) {
                Some(cell) => record.insert(column, cell),
                None if policy == RowPolicy::Pad => record.insert(column, ""),
                None => {}
            }
        }
        records.push(record);
    }

    Ok(records)
}

//! The conversion capability: CFU XML bytes in, two CSV exports out.
//!
//! [`Converter`] is the seam between the UI glue and the conversion rules, so
//! the glue can be driven by a fake in tests. [`CfuConverter`] is the real
//! implementation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::delimiter::Delimiter;
use crate::document::{self, RawRow};
use crate::error::ConvertError;
use crate::export::write_csv;
use crate::scdl;

/// Bytes of a source document plus the separator for both exports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub bytes: Vec<u8>,
    pub delimiter: Delimiter,
}

impl ConversionRequest {
    pub fn new(bytes: Vec<u8>, delimiter: Delimiter) -> Self {
        Self { bytes, delimiter }
    }
}

/// Summary produced alongside the exports, displayed as-is.
///
/// Keys keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Statistics(Map<String, Value>);

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pretty-printed JSON, two-space indented.
    pub fn to_pretty_json(&self) -> String {
        format!("{:#}", Value::Object(self.0.clone()))
    }
}

impl From<Map<String, Value>> for Statistics {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Outputs of one conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub raw_csv: String,
    pub scdl_csv: String,
    pub stats: Statistics,
}

/// Converts a source document into the raw and SCDL exports.
pub trait Converter {
    fn convert(&self, request: &ConversionRequest) -> Result<ConversionResult, ConvertError>;
}

impl<C: Converter + ?Sized> Converter for Box<C> {
    fn convert(&self, request: &ConversionRequest) -> Result<ConversionResult, ConvertError> {
        (**self).convert(request)
    }
}

/// Converter for CFU budget documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct CfuConverter;

impl CfuConverter {
    /// Set up the converter.
    ///
    /// Never fails: the rules are compiled in. The `Result` matches what
    /// [`Session::bootstrap`](crate::Session::bootstrap) expects from any
    /// converter capability.
    pub fn load() -> Result<Self, ConvertError> {
        log::debug!("CFU converter ready ({} SCDL columns)", scdl::COLUMNS.len());
        Ok(Self)
    }
}

fn raw_columns(rows: &[RawRow]) -> Vec<&str> {
    rows.iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

impl Converter for CfuConverter {
    fn convert(&self, request: &ConversionRequest) -> Result<ConversionResult, ConvertError> {
        let doc = document::parse(&request.bytes)?;
        let columns = raw_columns(&doc.rows);

        let raw_csv = write_csv(
            &columns,
            doc.rows.iter().map(|row| {
                columns
                    .iter()
                    .map(move |col| row.get(*col).map(String::as_str).unwrap_or(""))
            }),
            request.delimiter,
        )?;

        let scdl_csv = write_csv(
            &scdl::COLUMNS,
            doc.rows.iter().map(|row| scdl::map_row(row, &doc.header)),
            request.delimiter,
        )?;

        let mut stats = Statistics::new();
        stats.insert("exercice", doc.header.exercice.clone());
        stats.insert("siret", doc.header.siret.clone());
        stats.insert("nom", doc.header.nom.clone());
        stats.insert("lignes", doc.rows.len());
        stats.insert("raw_cols", columns.len());

        log::info!(
            "converted {} budget lines into {} raw columns",
            doc.rows.len(),
            columns.len()
        );

        Ok(ConversionResult {
            raw_csv,
            scdl_csv,
            stats,
        })
    }
}

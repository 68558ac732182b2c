//! # cfu-csv
//!
//! Converts CFU budget documents (compte financier unique, XML) into two CSV
//! exports: a raw export mirroring every budget line, and an export following
//! the SCDL budget schema.
//!
//! ## Overview
//!
//! - **Document**: streaming XML read of the header and `LigneBudget` lines
//! - **Exports**: raw CSV (sorted union of columns) and SCDL CSV (fixed columns)
//! - **Session**: the state of the converter page (log, file choice,
//!   download slots) kept free of any rendering environment
//!
//! ## Example
//!
//! ```
//! use cfu_csv::{CfuConverter, ConversionRequest, Converter, Delimiter};
//!
//! let xml = br#"<Doc>
//!   <Exercice V="2024"/>
//!   <LigneBudget id="1"><Nature V="6068"/><CodRD V="D"/></LigneBudget>
//! </Doc>"#;
//!
//! let converter = CfuConverter::load().unwrap();
//! let result = converter
//!     .convert(&ConversionRequest::new(xml.to_vec(), Delimiter::Semicolon))
//!     .unwrap();
//!
//! assert_eq!(result.raw_csv, "CodRD;LigneBudget_id;Nature\r\nD;1;6068\r\n");
//! assert!(result.scdl_csv.starts_with("BGT_ID;BGT_NATDEC;BGT_ANNEE"));
//! ```

pub mod converter;
pub mod delimiter;
pub mod document;
pub mod error;
pub mod export;
pub mod scdl;
pub mod session;

pub use converter::{CfuConverter, ConversionRequest, ConversionResult, Converter, Statistics};
pub use delimiter::Delimiter;
pub use document::{CfuDocument, Header, RawRow};
pub use error::ConvertError;
pub use export::write_csv;
pub use session::{
    ArtifactRole, CSV_MEDIA_TYPE, DownloadArtifact, RunOutcome, RunRejected, RunTicket, Session,
    SourceFile, SourceInfo,
};

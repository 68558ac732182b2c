//! Error types for CFU conversion.

use thiserror::Error;

/// Errors raised while loading or running the converter.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The converter was handed zero bytes.
    #[error("Le fichier est vide")]
    EmptyInput,

    /// The requested field separator is not one of the supported choices.
    #[error("Séparateur non supporté: {0:?}")]
    UnsupportedDelimiter(String),

    /// The document is not well-formed XML.
    #[error("XML invalide: {0}")]
    Xml(String),

    /// Serializing a CSV payload failed.
    #[error("Écriture CSV impossible: {0}")]
    Csv(#[from] csv::Error),

    /// Reading the source or writing an export failed.
    #[error("Erreur d'entrée/sortie: {0}")]
    Io(#[from] std::io::Error),

    /// The converter capability could not be set up.
    #[error("Initialisation du convertisseur impossible: {0}")]
    Setup(String),
}

impl From<quick_xml::Error> for ConvertError {
    fn from(e: quick_xml::Error) -> Self {
        ConvertError::Xml(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for ConvertError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        ConvertError::Xml(e.to_string())
    }
}

impl From<quick_xml::escape::EscapeError> for ConvertError {
    fn from(e: quick_xml::escape::EscapeError) -> Self {
        ConvertError::Xml(e.to_string())
    }
}

//! CSV serialization of converted budget lines.

use std::io;

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::delimiter::Delimiter;
use crate::error::ConvertError;

/// Write a header row followed by `rows` as CSV text.
///
/// Fields are quoted only when they contain the delimiter, a quote or a line
/// break; records end with CRLF. An empty column set still yields one
/// (empty) header record.
pub fn write_csv<I, R, S>(
    columns: &[&str],
    rows: I,
    delimiter: Delimiter,
) -> Result<String, ConvertError>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    if columns.is_empty() {
        return Ok("\r\n".to_string());
    }

    let mut writer = WriterBuilder::new()
        .delimiter(delimiter.as_byte())
        .terminator(Terminator::CRLF)
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer.write_record(columns)?;
    for row in rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ConvertError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| ConvertError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

//! Streaming reader for CFU budget XML documents.
//!
//! A CFU document (compte financier unique) carries a header describing the
//! reporting body and one `LigneBudget` element per budget line:
//!
//! ```text
//! <DocumentBudgetaire>
//!   <EnTeteDocBudgetaire><Exercice V="2024"/></EnTeteDocBudgetaire>
//!   <Collectivite Siret="21750001600019" Libelle="Ville"/>
//!   <Budget>
//!     <LigneBudget id="1">
//!       <Nature V="6068"/>
//!       <CodRD V="D"/>
//!       <MtSup Code="BudgetHorsRAR" V="12.50"/>
//!     </LigneBudget>
//!   </Budget>
//! </DocumentBudgetaire>
//! ```
//!
//! Elements are matched by local name, so namespace prefixes are ignored.
//! An element's value is its `V` attribute when present, otherwise the text
//! preceding its first child, trimmed.

use std::borrow::Cow;
use std::collections::BTreeMap;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE};
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

use crate::error::ConvertError;

/// Column holding the `id` attribute of each budget line.
pub const LINE_ID_COLUMN: &str = "LigneBudget_id";

const LINE_ELEMENT: &str = "LigneBudget";

/// Children whose column name is suffixed with their `Code` attribute.
const CODED_CHILDREN: [&str; 2] = ["MtSup", "CaracSup"];

/// One budget line: column name to value.
pub type RawRow = BTreeMap<String, String>;

/// Identification of the reporting body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub exercice: String,
    pub siret: String,
    pub nom: String,
}

impl Header {
    /// All three values found; later elements no longer change the header.
    pub fn is_complete(&self) -> bool {
        !self.exercice.is_empty() && !self.siret.is_empty() && !self.nom.is_empty()
    }

    fn observe(&mut self, element: &OpenElement) {
        if self.is_complete() {
            return;
        }
        match element.name.as_str() {
            "Exercice" => self.exercice = element.value(),
            "Collectivite" => {
                if let Some(siret) = element.non_empty_attr("Siret").or(element.non_empty_attr("SIRET")) {
                    self.siret = siret.to_string();
                }
                if let Some(nom) = element.non_empty_attr("Libelle") {
                    self.nom = nom.to_string();
                }
            }
            _ => {}
        }
    }
}

/// Parsed content of a CFU document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CfuDocument {
    pub header: Header,
    pub rows: Vec<RawRow>,
}

/// An element whose end tag has not been seen yet.
struct OpenElement {
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
    /// Set once the first child starts; later text is a child's tail.
    text_closed: bool,
}

impl OpenElement {
    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn non_empty_attr(&self, key: &str) -> Option<&str> {
        self.attr(key).filter(|v| !v.is_empty())
    }

    fn value(&self) -> String {
        match self.attr("V") {
            Some(v) => v.to_string(),
            None => self.text.trim().to_string(),
        }
    }

    /// Column this element fills in its parent budget line.
    fn column(&self) -> String {
        if CODED_CHILDREN.contains(&self.name.as_str()) {
            let code = self.attr("Code").unwrap_or("").trim();
            if !code.is_empty() {
                return format!("{}_{}", self.name, code);
            }
        }
        self.name.clone()
    }
}

/// Budget line being filled, with the stack depth of its element.
struct OpenLine {
    depth: usize,
    row: RawRow,
}

fn open_element<R>(reader: &Reader<R>, start: &BytesStart<'_>) -> Result<OpenElement, ConvertError> {
    let decoder = reader.decoder();
    let name = decoder.decode(start.local_name().as_ref())?.into_owned();

    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        // Prefixed attributes live in another namespace and never match.
        if attr.key.prefix().is_some() {
            continue;
        }
        let key = decoder.decode(attr.key.as_ref())?.into_owned();
        let raw = decoder.decode(&attr.value)?;
        let value = unescape(&normalize_attribute(&raw))?.into_owned();
        attrs.push((key, value));
    }

    Ok(OpenElement {
        name,
        attrs,
        text: String::new(),
        text_closed: false,
    })
}

/// Literal tabs and line breaks in an attribute value read as spaces.
///
/// Applied before unescaping, so `&#10;` still yields a line break.
fn normalize_attribute(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['\t', '\r', '\n']) {
        return Cow::Borrowed(raw);
    }
    Cow::Owned(raw.replace("\r\n", " ").replace(['\t', '\r', '\n'], " "))
}

fn is_xml_whitespace(text: &str) -> bool {
    text.chars().all(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
}

/// UTF-16 documents, flagged by a BOM or by the layout of `<?`, re-encoded
/// as UTF-8. Other encodings are left to the XML reader.
fn transcode_utf16(xml: &[u8]) -> Result<Option<String>, ConvertError> {
    let (encoding, body): (&'static Encoding, &[u8]) = match Encoding::for_bom(xml) {
        Some((enc, bom_len)) if enc == UTF_16LE || enc == UTF_16BE => (enc, &xml[bom_len..]),
        Some(_) => return Ok(None),
        None if xml.starts_with(&[b'<', 0, b'?', 0]) => (UTF_16LE, xml),
        None if xml.starts_with(&[0, b'<', 0, b'?']) => (UTF_16BE, xml),
        None => return Ok(None),
    };

    let (text, had_errors) = encoding.decode_without_bom_handling(body);
    if had_errors {
        return Err(ConvertError::Xml(format!(
            "séquence {} invalide",
            encoding.name()
        )));
    }
    Ok(Some(text.into_owned()))
}

/// Parse a CFU document from raw bytes.
///
/// The declared encoding is honored, UTF-16 included. Fails on malformed
/// XML, on a document without any element, on elements left open at end of
/// input, and on anything but whitespace outside the root element.
pub fn parse(xml: &[u8]) -> Result<CfuDocument, ConvertError> {
    if xml.is_empty() {
        return Err(ConvertError::EmptyInput);
    }

    let transcoded = transcode_utf16(xml)?;
    // A UTF-8 string reader ignores the declared (UTF-16) encoding.
    let mut reader = match &transcoded {
        Some(text) => Reader::from_str(text),
        None => Reader::from_reader(xml),
    };
    reader.expand_empty_elements(true);
    reader.check_end_names(true);

    let mut doc = CfuDocument::default();
    let mut stack: Vec<OpenElement> = Vec::new();
    let mut lines: Vec<OpenLine> = Vec::new();
    let mut seen_root = false;
    let mut root_closed = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                if root_closed {
                    return Err(ConvertError::Xml(
                        "contenu après l'élément racine".to_string(),
                    ));
                }
                seen_root = true;
                let element = open_element(&reader, &e)?;
                if let Some(parent) = stack.last_mut() {
                    parent.text_closed = true;
                }
                if element.name == LINE_ELEMENT {
                    let mut row = RawRow::new();
                    row.insert(
                        LINE_ID_COLUMN.to_string(),
                        element.attr("id").unwrap_or("").to_string(),
                    );
                    lines.push(OpenLine {
                        depth: stack.len(),
                        row,
                    });
                }
                stack.push(element);
            }
            Event::End(_) => {
                let Some(element) = stack.pop() else {
                    return Err(ConvertError::Xml("balise fermante orpheline".to_string()));
                };
                let depth = stack.len();

                if element.name == LINE_ELEMENT
                    && let Some(line) = lines.pop_if(|line| line.depth == depth)
                {
                    doc.rows.push(line.row);
                }
                if let Some(line) = lines.last_mut()
                    && line.depth + 1 == depth
                {
                    line.row.insert(element.column(), element.value());
                }

                doc.header.observe(&element);
                root_closed = stack.is_empty();
            }
            Event::Text(e) => {
                let text = e.unescape()?;
                match stack.last_mut() {
                    Some(top) if !top.text_closed => top.text.push_str(&text),
                    Some(_) => {}
                    None if is_xml_whitespace(&text) => {}
                    None => {
                        return Err(ConvertError::Xml(
                            "texte hors de l'élément racine".to_string(),
                        ));
                    }
                }
            }
            Event::CData(e) => {
                let Some(top) = stack.last_mut() else {
                    return Err(ConvertError::Xml(
                        "CDATA hors de l'élément racine".to_string(),
                    ));
                };
                if !top.text_closed {
                    top.text.push_str(&reader.decoder().decode(&e)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(ConvertError::Xml(format!("élément <{}> non fermé", open.name)));
    }
    if !seen_root {
        return Err(ConvertError::Xml("aucun élément trouvé".to_string()));
    }

    log::debug!(
        "parsed CFU document: {} budget lines, header complete: {}",
        doc.rows.len(),
        doc.header.is_complete()
    );
    Ok(doc)
}

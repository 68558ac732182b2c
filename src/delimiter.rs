//! CSV field separators offered to the user.

use std::fmt;
use std::str::FromStr;

use crate::error::ConvertError;

/// Field separator used when serializing both CSV exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Delimiter {
    #[default]
    Comma,
    Semicolon,
    Tab,
}

impl Delimiter {
    /// All choices, in selector order.
    pub const ALL: [Delimiter; 3] = [Delimiter::Comma, Delimiter::Semicolon, Delimiter::Tab];

    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Semicolon => b';',
            Delimiter::Tab => b'\t',
        }
    }

    pub fn as_char(self) -> char {
        self.as_byte() as char
    }

    /// Short name, also accepted by `FromStr`.
    pub fn name(self) -> &'static str {
        match self {
            Delimiter::Comma => "comma",
            Delimiter::Semicolon => "semicolon",
            Delimiter::Tab => "tab",
        }
    }

    /// Human label for the delimiter selector.
    pub fn label(self) -> &'static str {
        match self {
            Delimiter::Comma => "Virgule (,)",
            Delimiter::Semicolon => "Point-virgule (;)",
            Delimiter::Tab => "Tabulation",
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Tab => f.write_str("\\t"),
            other => write!(f, "{}", other.as_char()),
        }
    }
}

impl FromStr for Delimiter {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "," => return Ok(Delimiter::Comma),
            ";" => return Ok(Delimiter::Semicolon),
            "\t" | "\\t" => return Ok(Delimiter::Tab),
            _ => {}
        }
        Delimiter::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConvertError::UnsupportedDelimiter(s.to_string()))
    }
}

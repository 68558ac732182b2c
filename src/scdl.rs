//! Mapping of raw budget lines onto the SCDL budget schema.

use crate::document::{Header, LINE_ID_COLUMN, RawRow};

/// Nature of the budget decision carried by every CFU export.
pub const NATDEC: &str = "compte administratif";

/// SCDL columns, in output order.
pub const COLUMNS: [&str; 23] = [
    "BGT_ID",
    "BGT_NATDEC",
    "BGT_ANNEE",
    "BGT_SIRET",
    "BGT_NOM",
    "BGT_CONTNAT",
    "BGT_CONTNAT_LABEL",
    "BGT_NATURE",
    "BGT_NATURE_LABEL",
    "BGT_FONCTION",
    "BGT_FONCTION_LABEL",
    "BGT_OPERATION",
    "BGT_SECTION",
    "BGT_OPBUDG",
    "BGT_CODRD",
    "BGT_ARTSPE",
    "BGT_MTREAL",
    "BGT_MTBUDGPREC",
    "BGT_MTRARPREC",
    "BGT_MTPROPNOUV",
    "BGT_MTPREV",
    "BGT_CREDOUV",
    "BGT_MTRAR3112",
];

/// Raw column copied verbatim into an SCDL column.
fn copied_from(column: &str) -> Option<&'static str> {
    Some(match column {
        "BGT_ID" => LINE_ID_COLUMN,
        "BGT_NATURE" => "Nature",
        "BGT_FONCTION" => "Fonction",
        "BGT_MTREAL" => "MtReal",
        "BGT_MTBUDGPREC" => "MtBudgPrec",
        "BGT_MTRARPREC" => "MtRARPrec",
        "BGT_MTPROPNOUV" => "MtPropNouv",
        "BGT_MTPREV" => "MtPrev",
        "BGT_CREDOUV" => "CredOuv",
        "BGT_MTRAR3112" => "MtRAR3112",
        _ => return None,
    })
}

fn raw<'a>(row: &'a RawRow, key: &str) -> &'a str {
    row.get(key).map(String::as_str).unwrap_or("")
}

fn opbudg(row: &RawRow) -> &'static str {
    if raw(row, "OpBudg") == "1" { "ordre" } else { "réel" }
}

fn codrd(row: &RawRow) -> &'static str {
    match raw(row, "CodRD").to_uppercase().as_str() {
        "D" => "dépense",
        "R" => "recette",
        _ => "",
    }
}

fn artspe(row: &RawRow) -> &'static str {
    match raw(row, "ArtSpe").to_lowercase().as_str() {
        "true" => "spécialisé",
        "false" => "non spécialisé",
        _ => "",
    }
}

/// Value of one SCDL column for a raw budget line.
pub fn column_value(column: &str, row: &RawRow, header: &Header) -> String {
    if let Some(source) = copied_from(column) {
        return raw(row, source).to_string();
    }
    match column {
        "BGT_NATDEC" => NATDEC,
        "BGT_ANNEE" => header.exercice.as_str(),
        "BGT_SIRET" => header.siret.as_str(),
        "BGT_NOM" => header.nom.as_str(),
        "BGT_OPBUDG" => opbudg(row),
        "BGT_CODRD" => codrd(row),
        "BGT_ARTSPE" => artspe(row),
        // Labels, CONTNAT, OPERATION and SECTION are not derivable from a CFU.
        _ => "",
    }
    .to_string()
}

/// Map a raw budget line to SCDL cells, aligned with [`COLUMNS`].
pub fn map_row(row: &RawRow, header: &Header) -> Vec<String> {
    COLUMNS
        .iter()
        .map(|column| column_value(column, row, header))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn header() -> Header {
        Header {
            exercice: "2024".to_string(),
            siret: "21750001600019".to_string(),
            nom: "Ville".to_string(),
        }
    }

    fn cell(cells: &[String], column: &str) -> String {
        let idx = COLUMNS.iter().position(|c| *c == column).unwrap();
        cells[idx].clone()
    }

    #[test]
    fn test_map_row_copies_and_header() {
        let cells = map_row(
            &row(&[(LINE_ID_COLUMN, "42"), ("Nature", "6068"), ("MtReal", "10.5")]),
            &header(),
        );
        assert_eq!(cells.len(), COLUMNS.len());
        assert_eq!(cell(&cells, "BGT_ID"), "42");
        assert_eq!(cell(&cells, "BGT_NATDEC"), NATDEC);
        assert_eq!(cell(&cells, "BGT_ANNEE"), "2024");
        assert_eq!(cell(&cells, "BGT_SIRET"), "21750001600019");
        assert_eq!(cell(&cells, "BGT_NATURE"), "6068");
        assert_eq!(cell(&cells, "BGT_MTREAL"), "10.5");
        assert_eq!(cell(&cells, "BGT_NATURE_LABEL"), "");
        assert_eq!(cell(&cells, "BGT_MTPREV"), "");
    }

    #[test]
    fn test_columns_are_unique() {
        let unique: HashSet<&str> = COLUMNS.into_iter().collect();
        assert_eq!(unique.len(), COLUMNS.len());
    }

    #[test]
    fn test_opbudg() {
        assert_eq!(opbudg(&row(&[("OpBudg", "1")])), "ordre");
        assert_eq!(opbudg(&row(&[("OpBudg", "0")])), "réel");
        assert_eq!(opbudg(&row(&[])), "réel");
    }

    #[test]
    fn test_codrd_case_insensitive() {
        assert_eq!(codrd(&row(&[("CodRD", "d")])), "dépense");
        assert_eq!(codrd(&row(&[("CodRD", "R")])), "recette");
        assert_eq!(codrd(&row(&[("CodRD", "X")])), "");
    }

    #[test]
    fn test_artspe() {
        assert_eq!(artspe(&row(&[("ArtSpe", "True")])), "spécialisé");
        assert_eq!(artspe(&row(&[("ArtSpe", "false")])), "non spécialisé");
        assert_eq!(artspe(&row(&[("ArtSpe", "1")])), "");
    }
}

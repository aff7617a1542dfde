use crate::results::*;

use std::path::Path;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// The column names of a results table.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColumnNames {
    pub district: String,
    pub section: String,
    pub office: String,
    pub candidate: String,
    pub party: String,
    pub votes: String,
    pub total_valid_votes: String,
    pub total_rejected_votes: String,
    pub total_votes: String,
}

impl ColumnNames {
    pub fn from_settings(cs: Option<&ColumnSettings>) -> ColumnNames {
        let cs = cs.cloned().unwrap_or_default();
        let or = |x: Option<String>, d: &str| x.unwrap_or_else(|| d.to_string());
        ColumnNames {
            district: or(cs.district, "ElectoralDistrictID"),
            section: or(cs.section, "Bureau"),
            office: or(cs.office, "Poste"),
            candidate: or(cs.candidate, "Candidat"),
            party: or(cs.party, "Parti"),
            votes: or(cs.votes, "Votes"),
            total_valid_votes: or(cs.total_valid_votes, "TotalValidVotes"),
            total_rejected_votes: or(cs.total_rejected_votes, "TotalRejectedVotes"),
            total_votes: or(cs.total_votes, "TotalVotes"),
        }
    }
}

/// The positions of the columns in the header of a table.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColumnIndexes {
    district: usize,
    section: usize,
    office: usize,
    candidate: usize,
    votes: usize,
    party: Option<usize>,
    total_valid_votes: Option<usize>,
    total_rejected_votes: Option<usize>,
    total_votes: Option<usize>,
}

fn find_column(header: &[String], name: &str) -> Option<usize> {
    let name = normalize_label(name);
    let cleaned: Vec<String> = header.iter().map(|h| normalize_label(h)).collect();
    cleaned
        .iter()
        .position(|h| *h == name)
        .or_else(|| cleaned.iter().position(|h| h.to_lowercase() == name.to_lowercase()))
}

impl ColumnIndexes {
    pub fn resolve(header: &[String], names: &ColumnNames, path: &str) -> MapResult<ColumnIndexes> {
        debug!("resolve: header: {:?}", header);
        let required = |name: &str| {
            find_column(header, name).context(MissingColumnSnafu {
                column: name,
                path,
            })
        };
        let optional = |name: &str| {
            let res = find_column(header, name);
            if res.is_none() {
                debug!("resolve: optional column {:?} not found in {}", name, path);
            }
            res
        };
        Ok(ColumnIndexes {
            district: required(&names.district)?,
            section: required(&names.section)?,
            office: required(&names.office)?,
            candidate: required(&names.candidate)?,
            votes: required(&names.votes)?,
            party: optional(&names.party),
            total_valid_votes: optional(&names.total_valid_votes),
            total_rejected_votes: optional(&names.total_rejected_votes),
            total_votes: optional(&names.total_votes),
        })
    }

    /// Builds a raw row from the cells of a line. Missing cells are empty.
    pub fn row(&self, cells: &[RawValue]) -> RawResultRow {
        let cell = |idx: usize| cells.get(idx).cloned().unwrap_or(RawValue::Empty);
        let opt_cell = |idx: Option<usize>| idx.map(cell).unwrap_or(RawValue::Empty);
        RawResultRow {
            district_raw: cell(self.district),
            section_raw: cell(self.section),
            office_raw: cell(self.office),
            candidate_name: normalize_label(&cell(self.candidate).as_text()),
            party_name: normalize_label(&opt_cell(self.party).as_text()),
            votes: cell(self.votes),
            total_valid_votes: opt_cell(self.total_valid_votes),
            total_rejected_votes: opt_cell(self.total_rejected_votes),
            total_votes: opt_cell(self.total_votes),
        }
    }
}

const PARTICLES: &[&str] = &[
    "LE", "LA", "LES", "DE", "DU", "DES", "DEL", "DI", "DA", "DELA", "DELE",
];

// At least one cased character, and no lowercase one.
fn is_upper_word(w: &str) -> bool {
    w.chars().any(|c| c.is_uppercase()) && !w.chars().any(|c| c.is_lowercase())
}

/// The surname of a candidate: the last word, or the last two words when the
/// previous word is a particle or is written in capitals.
pub fn surname_only(name: &str) -> String {
    let toks: Vec<&str> = name.split_whitespace().collect();
    match toks.len() {
        0 => name.to_string(),
        1 => toks[0].to_string(),
        n => {
            let prev = toks[n - 2];
            if PARTICLES.contains(&prev.to_uppercase().as_str()) || is_upper_word(prev) {
                format!("{} {}", prev, toks[n - 1])
            } else {
                toks[n - 1].to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surnames() {
        assert_eq!(surname_only("Luc Rabouin"), "Rabouin");
        assert_eq!(surname_only("Katy Le Rougetel"), "Le Rougetel");
        assert_eq!(surname_only("Jean de La Fontaine"), "La Fontaine");
        assert_eq!(surname_only("Marie DUPONT Tremblay"), "DUPONT Tremblay");
        assert_eq!(surname_only("  Soraya  "), "Soraya");
        assert_eq!(surname_only("   "), "   ");
        assert_eq!(surname_only("Anne-Marie Côté"), "Côté");
        assert_eq!(surname_only("Paul 2 Martin"), "Martin");
    }

    #[test]
    fn file_names() {
        assert_eq!(simplify_file_name("/tmp/data/results.csv"), "results.csv");
        assert_eq!(simplify_file_name("results.csv"), "results.csv");
    }

    fn header(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn default_columns() {
        let h = header(&[
            "\u{feff}ElectoralDistrictID",
            "Bureau",
            "Poste",
            "Candidat",
            "Votes",
            "TotalVotes",
        ]);
        let names = ColumnNames::from_settings(None);
        let idx = ColumnIndexes::resolve(&h, &names, "x.csv").unwrap();
        let cells: Vec<RawValue> = vec![
            "11".into(),
            "37".into(),
            "0,00".into(),
            " Anna ".into(),
            "30".into(),
        ];
        let row = idx.row(&cells);
        assert_eq!(row.district_raw, RawValue::from("11"));
        assert_eq!(row.candidate_name, "Anna");
        assert_eq!(row.party_name, "");
        assert_eq!(row.total_valid_votes, RawValue::Empty);
        // Short line
        assert_eq!(row.total_votes, RawValue::Empty);
    }

    #[test]
    fn custom_and_missing_columns() {
        let h = header(&["district", "bureau", "poste", "nom", "voix"]);
        let names = ColumnNames::from_settings(Some(&ColumnSettings {
            candidate: Some("Nom".to_string()),
            votes: Some("Voix".to_string()),
            ..ColumnSettings::default()
        }));
        assert!(ColumnIndexes::resolve(&h, &names, "x.csv").is_err());
        let names = ColumnNames {
            district: "district".to_string(),
            ..names
        };
        assert!(ColumnIndexes::resolve(&h, &names, "x.csv").is_ok());
    }

    #[test]
    fn decomposed_headers_and_names() {
        let h = header(&["District", "Bureau", "Poste", "Candidat", "Parti", "Votes e\u{301}mis"]);
        let names = ColumnNames {
            district: "District".to_string(),
            votes: "Votes émis".to_string(),
            ..ColumnNames::from_settings(None)
        };
        let idx = ColumnIndexes::resolve(&h, &names, "x.csv").unwrap();
        let cells: Vec<RawValue> = vec![
            "11".into(),
            "37".into(),
            "0".into(),
            "Bruno Co\u{302}te\u{301}".into(),
            "Parti Que\u{301}bec".into(),
            "4".into(),
        ];
        let row = idx.row(&cells);
        assert_eq!(row.candidate_name, "Bruno Côté");
        assert_eq!(row.party_name, "Parti Québec");
        assert_eq!(row.votes, RawValue::from("4"));
    }
}

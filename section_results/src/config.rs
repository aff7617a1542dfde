// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// A raw cell, as provided by a tabular source.
///
/// CSV readers only produce `Text` and `Empty`. Spreadsheet readers also
/// produce numeric cells, which are rendered the same way as their text
/// counterparts (`37.0` is read as `"37"`).
#[derive(PartialEq, Debug, Clone)]
pub enum RawValue {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
}

impl RawValue {
    /// The textual form of the cell, used for key normalization.
    pub fn as_text(&self) -> String {
        match self {
            RawValue::Empty => "".to_string(),
            RawValue::Text(s) => s.clone(),
            RawValue::Int(i) => i.to_string(),
            RawValue::Float(f) if f.is_finite() && f.fract() == 0.0 => format!("{}", *f as i64),
            RawValue::Float(f) => f.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RawValue::Empty => true,
            RawValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Reads the cell as a non-negative count.
    ///
    /// Comma decimals are accepted and fractional counts are truncated.
    /// Returns None for empty, non-numeric or negative cells.
    pub fn as_count(&self) -> Option<u64> {
        let f = match self {
            RawValue::Empty => return None,
            RawValue::Int(i) => return u64::try_from(*i).ok(),
            RawValue::Float(f) => *f,
            RawValue::Text(s) => s.trim().replace(',', ".").parse::<f64>().ok()?,
        };
        if f.is_finite() && f >= 0.0 {
            Some(f.trunc() as u64)
        } else {
            None
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<i64> for RawValue {
    fn from(i: i64) -> Self {
        RawValue::Int(i)
    }
}

impl From<i32> for RawValue {
    fn from(i: i32) -> Self {
        RawValue::Int(i as i64)
    }
}

impl From<u64> for RawValue {
    fn from(i: u64) -> Self {
        match i64::try_from(i) {
            Ok(x) => RawValue::Int(x),
            Err(_) => RawValue::Float(i as f64),
        }
    }
}

impl From<f64> for RawValue {
    fn from(f: f64) -> Self {
        RawValue::Float(f)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(x: Option<T>) -> Self {
        x.map(|v| v.into()).unwrap_or(RawValue::Empty)
    }
}

/// One ballot-tally record: the votes of one candidate, for one office, in one
/// voting section.
#[derive(PartialEq, Debug, Clone)]
pub struct RawResultRow {
    pub district_raw: RawValue,
    pub section_raw: RawValue,
    pub office_raw: RawValue,
    pub candidate_name: String,
    pub party_name: String,
    pub votes: RawValue,
    pub total_valid_votes: RawValue,
    pub total_rejected_votes: RawValue,
    pub total_votes: RawValue,
}

impl RawResultRow {
    pub fn new(
        district: impl Into<RawValue>,
        section: impl Into<RawValue>,
        office: impl Into<RawValue>,
        candidate: &str,
        party: &str,
        votes: impl Into<RawValue>,
    ) -> RawResultRow {
        RawResultRow {
            district_raw: district.into(),
            section_raw: section.into(),
            office_raw: office.into(),
            candidate_name: candidate.to_string(),
            party_name: party.to_string(),
            votes: votes.into(),
            total_valid_votes: RawValue::Empty,
            total_rejected_votes: RawValue::Empty,
            total_votes: RawValue::Empty,
        }
    }

    pub fn with_totals(
        self,
        valid: impl Into<RawValue>,
        rejected: impl Into<RawValue>,
        total: impl Into<RawValue>,
    ) -> RawResultRow {
        RawResultRow {
            total_valid_votes: valid.into(),
            total_rejected_votes: rejected.into(),
            total_votes: total.into(),
            ..self
        }
    }
}

// ******** Output data structures *********

/// The result of one candidate in a section.
#[derive(PartialEq, Debug, Clone)]
pub struct BreakdownEntry {
    pub candidate: String,
    pub party: String,
    pub votes: u64,
    /// Share of the denominator in percent, rounded to 2 decimals.
    /// None when the section has no usable total.
    pub pct: Option<f64>,
}

/// The aggregated result for one office in one section.
#[derive(PartialEq, Debug, Clone)]
pub struct AggregatedResult {
    pub winner_candidate: String,
    pub winner_party: String,
    pub winner_votes: u64,
    /// The runner-up has exactly as many votes as the winner. The winner is
    /// still the first of them in input order.
    pub winner_tied: bool,
    pub total_valid: Option<u64>,
    pub total_rejected: Option<u64>,
    pub total: Option<u64>,
    pub district_id: String,
    pub section_id: String,
    /// Sorted by votes, descending. Ties keep the input order.
    pub breakdown: Vec<BreakdownEntry>,
}

/// Counters describing what happened to the input rows.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct AggregationStats {
    pub rows_read: usize,
    pub rows_aggregated: usize,
    pub unkeyable_office: usize,
    pub unkeyable_section: usize,
    pub filtered_office: usize,
    pub malformed_votes: usize,
    pub groups: usize,
}

impl AggregationStats {
    pub fn rows_dropped(&self) -> usize {
        self.unkeyable_office + self.unkeyable_section
    }
}

/// Errors that prevent the aggregation from running at all.
///
/// Data quality problems are never errors: they are counted in
/// `AggregationStats`.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AggregationErrors {
    InvalidKeyConfig(String),
}

impl Error for AggregationErrors {}

impl Display for AggregationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregationErrors::InvalidKeyConfig(msg) => {
                write!(f, "invalid key configuration: {}", msg)
            }
        }
    }
}

// ********* Configuration **********

/// How the district and the section are combined into one section key.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SectionKeyMode {
    /// District zero-padded to `district_width`, then the section:
    /// `011-037`. Matches sources that expose a single composite code.
    Composite,
    /// District digits without leading zeros, then the section: `11|037`.
    /// Matches sources that expose the district and the bureau separately.
    Split,
}

/// How office codes are written in the index.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum OfficeKeyStyle {
    /// `0`, `1`, `1.10`
    Bare,
    /// `0.00`, `1.00`, `1.10`
    FixedTwoDecimals,
}

/// One way of finding the district and the section in the attributes of a
/// map feature.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ExtractionStrategy {
    /// Look up the district and section attribute names, in priority order.
    NamedAttributes,
    /// Split a composite code attribute such as `011-037`.
    CompositeAttribute,
    /// Scan all the attribute values for short numeric strings.
    NumericScan,
}

pub const DEFAULT_DISTRICT_ATTRIBUTES: &[&str] = &[
    "DISTRICTID",
    "DISTRICT_ID",
    "DISTRICT",
    "NO_DISTRICT",
    "ID_DISTRICT",
    "ARRON_DIST",
    "ARRDIST",
    "ARR",
    "ID_ARR",
    "ID_ARRONDISSEMENT",
];

pub const DEFAULT_SECTION_ATTRIBUTES: &[&str] = &[
    "SECTION",
    "BUREAU",
    "NO_SECTION",
    "NO_BUREAU",
    "SECT_VOTE",
    "SECTION_VOTE",
    "SECTION_ID",
];

pub const DEFAULT_COMPOSITE_ATTRIBUTES: &[&str] = &["CODE_SECTION"];

pub const DEFAULT_EXTRACTION_CHAIN: &[ExtractionStrategy] = &[
    ExtractionStrategy::NamedAttributes,
    ExtractionStrategy::CompositeAttribute,
    ExtractionStrategy::NumericScan,
];

/// The rules to build keys, shared by the aggregation and the lookups.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct KeyConfig {
    pub section_key_mode: SectionKeyMode,
    pub district_width: usize,
    pub section_width: usize,
    pub composite_separator: char,
    pub split_separator: char,
    pub office_style: OfficeKeyStyle,
    pub district_attributes: Vec<String>,
    pub section_attributes: Vec<String>,
    pub composite_attributes: Vec<String>,
    pub extraction_chain: Vec<ExtractionStrategy>,
}

impl Default for KeyConfig {
    fn default() -> Self {
        KeyConfig {
            section_key_mode: SectionKeyMode::Composite,
            district_width: 3,
            section_width: 3,
            composite_separator: '-',
            split_separator: '|',
            office_style: OfficeKeyStyle::Bare,
            district_attributes: to_strings(DEFAULT_DISTRICT_ATTRIBUTES),
            section_attributes: to_strings(DEFAULT_SECTION_ATTRIBUTES),
            composite_attributes: to_strings(DEFAULT_COMPOSITE_ATTRIBUTES),
            extraction_chain: DEFAULT_EXTRACTION_CHAIN.to_vec(),
        }
    }
}

impl KeyConfig {
    pub fn validate(&self) -> Result<(), AggregationErrors> {
        if self.section_width == 0 {
            return Err(AggregationErrors::InvalidKeyConfig(
                "section width must be at least 1".to_string(),
            ));
        }
        if self.district_width == 0 {
            return Err(AggregationErrors::InvalidKeyConfig(
                "district width must be at least 1".to_string(),
            ));
        }
        if self.extraction_chain.is_empty() {
            return Err(AggregationErrors::InvalidKeyConfig(
                "no extraction strategy".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct AggregationRules {
    pub keys: KeyConfig,
    /// If provided, only these offices are aggregated. Codes are compared by
    /// value, so `1,10`, `1.1` and `1.10` designate the same office.
    pub only_offices: Option<Vec<String>>,
}

fn to_strings(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
}

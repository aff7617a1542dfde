pub use crate::config::*;
use crate::{build_results_index, AggregationOutcome};

/// A builder for adding result rows.
///
/// ```
/// pub use section_results::builder::Builder;
/// pub use section_results::AggregationRules;
/// # use section_results::AggregationErrors;
///
/// let mut builder = Builder::new(&AggregationRules::default())?
///     .only_offices(&["0".to_string()])?;
///
/// builder.add_simple("0", "11", "37", "Anna", "Parti A", 30)?;
/// builder.add_simple("0,00", "011", "Bureau 37", "Bob", "Parti B", 20)?;
/// // Filtered out
/// builder.add_simple("1.10", "11", "37", "Clara", "Parti A", 12)?;
///
/// let outcome = builder.build()?;
/// let res = outcome.index.get("0", "011-037").unwrap();
/// assert_eq!(res.winner_candidate, "Anna");
/// assert_eq!(outcome.stats.filtered_office, 1);
///
/// # Ok::<(), AggregationErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: AggregationRules,
    pub(crate) _rows: Vec<RawResultRow>,
}

impl Builder {
    pub fn new(rules: &AggregationRules) -> Result<Builder, AggregationErrors> {
        rules.keys.validate()?;
        Ok(Builder {
            _rules: rules.clone(),
            _rows: Vec::new(),
        })
    }

    /// Restricts the aggregation to the given offices.
    pub fn only_offices(self, offices: &[String]) -> Result<Builder, AggregationErrors> {
        Ok(Builder {
            _rules: AggregationRules {
                only_offices: Some(offices.to_vec()),
                ..self._rules
            },
            _rows: self._rows,
        })
    }

    /// Adds the votes of one candidate in one section, without totals.
    ///
    /// The identifiers may use any of the encodings found in the sources:
    /// they are normalized when the index is built.
    pub fn add_simple(
        &mut self,
        office: &str,
        district: &str,
        section: &str,
        candidate: &str,
        party: &str,
        votes: u64,
    ) -> Result<(), AggregationErrors> {
        self.add_row(RawResultRow::new(
            district, section, office, candidate, party, votes,
        ))
    }

    pub fn add_row(&mut self, row: RawResultRow) -> Result<(), AggregationErrors> {
        self._rows.push(row);
        Ok(())
    }

    pub fn num_rows(&self) -> usize {
        self._rows.len()
    }

    pub fn build(&self) -> Result<AggregationOutcome, AggregationErrors> {
        build_results_index(&self._rows, &self._rules)
    }
}

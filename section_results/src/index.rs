use std::collections::BTreeMap;

use crate::config::{AggregatedResult, KeyConfig};
use crate::extract::{extract_feature_key, FeatureKey, FeatureProperties};
use crate::normalize::office_key_variants;

/// The aggregated results, by office key then by section key.
///
/// Built once by the aggregation and read-only afterwards.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct ResultsIndex {
    offices: BTreeMap<String, BTreeMap<String, AggregatedResult>>,
}

/// The outcome of joining one map feature with the index.
#[derive(PartialEq, Debug, Clone)]
pub enum FeatureLookup<'a> {
    Matched {
        key: FeatureKey,
        section_key: String,
        result: &'a AggregatedResult,
    },
    /// A key was found in the feature but the index has no entry for it.
    NoMatch {
        key: FeatureKey,
        section_key: String,
    },
    /// No district or section could be found in the feature.
    Unkeyed,
}

impl ResultsIndex {
    pub(crate) fn from_map(
        offices: BTreeMap<String, BTreeMap<String, AggregatedResult>>,
    ) -> ResultsIndex {
        ResultsIndex { offices }
    }

    /// The sections of an office. The office key is tried as given, then in
    /// its other canonical renderings (`0` / `0.00` / `1.1` / `1.10`).
    pub fn sections(&self, office: &str) -> Option<&BTreeMap<String, AggregatedResult>> {
        office_key_variants(office)
            .iter()
            .find_map(|k| self.offices.get(k))
    }

    pub fn get(&self, office: &str, section_key: &str) -> Option<&AggregatedResult> {
        self.sections(office)?.get(section_key)
    }

    /// Joins a map feature with the results of one office.
    pub fn lookup_feature(
        &self,
        props: &FeatureProperties,
        keys: &KeyConfig,
        office: &str,
    ) -> FeatureLookup<'_> {
        let key = match extract_feature_key(props, keys) {
            Some(k) => k,
            None => return FeatureLookup::Unkeyed,
        };
        let section_key = key.section_key(keys);
        match self.get(office, &section_key) {
            Some(result) => FeatureLookup::Matched {
                key,
                section_key,
                result,
            },
            None => FeatureLookup::NoMatch { key, section_key },
        }
    }

    pub fn office_keys(&self) -> impl Iterator<Item = &String> {
        self.offices.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, AggregatedResult>)> {
        self.offices.iter()
    }

    /// The number of (office, section) records.
    pub fn len(&self) -> usize {
        self.offices.values().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.offices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(winner: &str) -> AggregatedResult {
        AggregatedResult {
            winner_candidate: winner.to_string(),
            winner_party: "".to_string(),
            winner_votes: 1,
            winner_tied: false,
            total_valid: None,
            total_rejected: None,
            total: None,
            district_id: "11".to_string(),
            section_id: "037".to_string(),
            breakdown: vec![],
        }
    }

    fn index() -> ResultsIndex {
        let mut offices = BTreeMap::new();
        let mut mayor = BTreeMap::new();
        mayor.insert("011-037".to_string(), record("A"));
        offices.insert("0".to_string(), mayor);
        let mut borough = BTreeMap::new();
        borough.insert("011-037".to_string(), record("B"));
        offices.insert("1.10".to_string(), borough);
        ResultsIndex::from_map(offices)
    }

    #[test]
    fn lookup_with_alternate_office_forms() {
        let idx = index();
        assert_eq!(idx.get("0", "011-037").unwrap().winner_candidate, "A");
        assert_eq!(idx.get("0.00", "011-037").unwrap().winner_candidate, "A");
        assert_eq!(idx.get("1.1", "011-037").unwrap().winner_candidate, "B");
        assert_eq!(idx.get("1,10", "011-037").unwrap().winner_candidate, "B");
        assert!(idx.get("2", "011-037").is_none());
        assert!(idx.get("0", "011-038").is_none());
        assert_eq!(idx.len(), 2);
    }

    #[test]
    fn feature_lookup() {
        let idx = index();
        let keys = KeyConfig::default();
        let p: FeatureProperties = vec![("CODE_SECTION", Some("011-037".to_string()))]
            .into_iter()
            .collect();
        match idx.lookup_feature(&p, &keys, "0.00") {
            FeatureLookup::Matched { result, .. } => assert_eq!(result.winner_candidate, "A"),
            x => panic!("unexpected {:?}", x),
        }
        let p: FeatureProperties = vec![("CODE_SECTION", Some("011-099".to_string()))]
            .into_iter()
            .collect();
        assert!(matches!(
            idx.lookup_feature(&p, &keys, "0"),
            FeatureLookup::NoMatch { .. }
        ));
        let p: FeatureProperties = vec![("NOM", Some("Parc".to_string()))]
            .into_iter()
            .collect();
        assert_eq!(idx.lookup_feature(&p, &keys, "0"), FeatureLookup::Unkeyed);
    }
}

//! Finding the district and the section of a map feature.
//!
//! Map providers do not agree on attribute names. The extraction runs a chain
//! of `ExtractionStrategy` values and keeps the first one that succeeds.

use log::debug;

use crate::config::{ExtractionStrategy, KeyConfig};
use crate::normalize::{compose_section_key, normalize_digits, normalize_fixed_width};

/// The attributes of a map feature, in document order.
///
/// Values are already rendered as strings; `None` stands for a null value,
/// which is treated as absent.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct FeatureProperties {
    entries: Vec<(String, Option<String>)>,
}

impl FeatureProperties {
    pub fn new() -> FeatureProperties {
        FeatureProperties::default()
    }

    pub fn insert(&mut self, name: &str, value: Option<String>) {
        if let Some(e) = self.entries.iter_mut().find(|(n, _)| n == name) {
            e.1 = value;
        } else {
            self.entries.push((name.to_string(), value));
        }
    }

    /// The non-null value of an attribute. Exact names are preferred, then
    /// names that only differ by ASCII case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, v)| n == name && v.is_some())
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|(n, v)| n.eq_ignore_ascii_case(name) && v.is_some())
            })
            .and_then(|(_, v)| v.as_deref())
    }

    /// The first non-null attribute of a priority list.
    pub fn first_of(&self, names: &[String]) -> Option<&str> {
        names.iter().find_map(|n| self.get(n))
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|(_, v)| v.as_deref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, Option<String>)> for FeatureProperties {
    fn from_iter<I: IntoIterator<Item = (&'a str, Option<String>)>>(iter: I) -> Self {
        let mut res = FeatureProperties::new();
        for (n, v) in iter {
            res.insert(n, v);
        }
        res
    }
}

/// The normalized district and section found in a feature.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct FeatureKey {
    /// Digits, without leading zeros.
    pub district: String,
    /// Digits, padded to the section width.
    pub section: String,
}

impl FeatureKey {
    pub fn section_key(&self, keys: &KeyConfig) -> String {
        compose_section_key(&self.district, &self.section, keys)
    }
}

impl ExtractionStrategy {
    pub fn apply(&self, props: &FeatureProperties, keys: &KeyConfig) -> Option<FeatureKey> {
        match self {
            ExtractionStrategy::NamedAttributes => named_attributes(props, keys),
            ExtractionStrategy::CompositeAttribute => composite_attribute(props, keys),
            ExtractionStrategy::NumericScan => numeric_scan(props, keys),
        }
    }
}

/// Runs the extraction chain of the configuration. Returns None when no
/// strategy recognizes the feature.
pub fn extract_feature_key(props: &FeatureProperties, keys: &KeyConfig) -> Option<FeatureKey> {
    keys.extraction_chain.iter().find_map(|strategy| {
        let res = strategy.apply(props, keys);
        if let Some(k) = &res {
            debug!("extract_feature_key: {:?} found {:?}", strategy, k);
        }
        res
    })
}

fn section_component(x: &str, width: usize) -> Option<String> {
    if x.chars().any(|c| c.is_ascii_digit()) {
        Some(normalize_fixed_width(x, width))
    } else {
        None
    }
}

fn named_attributes(props: &FeatureProperties, keys: &KeyConfig) -> Option<FeatureKey> {
    let district = normalize_digits(props.first_of(&keys.district_attributes)?);
    let section = section_component(props.first_of(&keys.section_attributes)?, keys.section_width)?;
    if district.is_empty() {
        return None;
    }
    Some(FeatureKey { district, section })
}

fn composite_attribute(props: &FeatureProperties, keys: &KeyConfig) -> Option<FeatureKey> {
    let code = props.first_of(&keys.composite_attributes)?;
    let groups: Vec<&str> = code
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .collect();
    if groups.len() < 2 {
        return None;
    }
    let district = normalize_digits(groups[0]);
    let section = normalize_fixed_width(groups[groups.len() - 1], keys.section_width);
    if district.is_empty() {
        return None;
    }
    Some(FeatureKey { district, section })
}

// Short numeric values are district candidates, values with exactly the
// section width are section candidates.
fn numeric_scan(props: &FeatureProperties, keys: &KeyConfig) -> Option<FeatureKey> {
    let mut district: Option<String> = None;
    let mut section: Option<String> = None;
    for v in props.values() {
        let digits: String = v.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            continue;
        }
        if district.is_none() && digits.len() <= keys.district_width {
            let d = normalize_digits(&digits);
            if !d.is_empty() {
                district = Some(d);
            }
        }
        if section.is_none() && digits.len() == keys.section_width {
            section = Some(digits);
        }
        if let (Some(d), Some(s)) = (&district, &section) {
            return Some(FeatureKey {
                district: d.clone(),
                section: s.clone(),
            });
        }
    }
    None
}

mod config;
pub mod builder;
pub mod extract;
mod index;
pub mod manual;
pub mod normalize;

use log::{debug, info, warn};

use std::collections::{BTreeMap, HashMap};

pub use crate::config::*;
pub use crate::extract::{extract_feature_key, FeatureKey, FeatureProperties};
pub use crate::index::{FeatureLookup, ResultsIndex};
use crate::normalize::{
    compose_section_key, normalize_label, normalize_section_pair, OfficeCode,
};

/// Everything produced by one aggregation pass.
#[derive(PartialEq, Debug, Clone)]
pub struct AggregationOutcome {
    pub index: ResultsIndex,
    pub stats: AggregationStats,
}

// **** Private structures ****

// The key of a group of rows.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
struct GroupKey {
    office: String,
    section_key: String,
}

// A row that went through the key normalization.
#[derive(PartialEq, Debug, Clone)]
struct KeyedRow<'a> {
    row: &'a RawResultRow,
    district: String,
    section: String,
    votes: u64,
}

/// Aggregates the result rows into an index of per-section results.
///
/// Arguments:
/// * `rows` the result rows, in source order. The order only matters to break
/// ties between candidates with the same number of votes.
/// * `rules` the key rules and the optional office filter.
///
/// Rows that cannot be keyed are dropped and counted in the returned
/// statistics; they never make the aggregation fail. The only error is an
/// invalid key configuration.
pub fn build_results_index(
    rows: &[RawResultRow],
    rules: &AggregationRules,
) -> Result<AggregationOutcome, AggregationErrors> {
    info!("build_results_index: processing {:?} rows", rows.len());
    rules.keys.validate()?;

    let only_offices = office_filter(rules)?;

    let mut stats = AggregationStats {
        rows_read: rows.len(),
        ..AggregationStats::default()
    };

    // Groups, in order of first appearance. Each group keeps its rows in
    // source order.
    let mut group_ids: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<(GroupKey, Vec<KeyedRow>)> = Vec::new();

    for (lineno, row) in rows.iter().enumerate() {
        let office_code = match OfficeCode::parse(&row.office_raw.as_text()) {
            Some(c) => c,
            None => {
                warn!(
                    "build_results_index: row {}: dropping row with unusable office {:?}",
                    lineno, row.office_raw
                );
                stats.unkeyable_office += 1;
                continue;
            }
        };
        if let Some(offices) = &only_offices {
            if !offices.contains(&office_code) {
                stats.filtered_office += 1;
                continue;
            }
        }
        let (district, section) = match normalize_section_pair(
            &row.district_raw.as_text(),
            &row.section_raw.as_text(),
            &rules.keys,
        ) {
            Some(p) => p,
            None => {
                warn!(
                    "build_results_index: row {}: dropping row with unusable section {:?} / {:?}",
                    lineno, row.district_raw, row.section_raw
                );
                stats.unkeyable_section += 1;
                continue;
            }
        };

        let votes = match row.votes.as_count() {
            Some(v) => v,
            None => {
                if !row.votes.is_empty() {
                    debug!(
                        "build_results_index: row {}: malformed vote count {:?}, counted as 0",
                        lineno, row.votes
                    );
                    stats.malformed_votes += 1;
                }
                0
            }
        };

        let key = GroupKey {
            office: office_code.render(rules.keys.office_style),
            section_key: compose_section_key(&district, &section, &rules.keys),
        };
        let keyed = KeyedRow {
            row,
            district,
            section,
            votes,
        };
        stats.rows_aggregated += 1;
        if let Some(gid) = group_ids.get(&key) {
            groups[*gid].1.push(keyed);
        } else {
            group_ids.insert(key.clone(), groups.len());
            groups.push((key, vec![keyed]));
        }
    }

    stats.groups = groups.len();
    let mut offices: BTreeMap<String, BTreeMap<String, AggregatedResult>> = BTreeMap::new();
    for (key, group) in groups.iter() {
        let res = aggregate_group(group);
        debug!(
            "build_results_index: office {} section {}: winner {:?} with {} votes",
            key.office, key.section_key, res.winner_candidate, res.winner_votes
        );
        offices
            .entry(key.office.clone())
            .or_default()
            .insert(key.section_key.clone(), res);
    }

    info!(
        "build_results_index: {} rows aggregated in {} groups, {} dropped, {} filtered out",
        stats.rows_aggregated,
        stats.groups,
        stats.rows_dropped(),
        stats.filtered_office
    );
    Ok(AggregationOutcome {
        index: ResultsIndex::from_map(offices),
        stats,
    })
}

// An empty list of offices means no filter. Codes that are not office numbers
// are configuration errors: they would silently filter out every row.
fn office_filter(rules: &AggregationRules) -> Result<Option<Vec<OfficeCode>>, AggregationErrors> {
    let xs = match &rules.only_offices {
        Some(xs) if !xs.is_empty() => xs,
        _ => return Ok(None),
    };
    let mut res: Vec<OfficeCode> = Vec::new();
    for x in xs.iter() {
        match OfficeCode::parse(x) {
            Some(c) => res.push(c),
            None => {
                return Err(AggregationErrors::InvalidKeyConfig(format!(
                    "{:?} is not an office code",
                    x
                )))
            }
        }
    }
    Ok(Some(res))
}

// The largest value present in the group. Totals are repeated on every row of
// a group.
fn group_total(group: &[KeyedRow], f: impl Fn(&RawResultRow) -> &RawValue) -> Option<u64> {
    group.iter().filter_map(|kr| f(kr.row).as_count()).max()
}

fn percentage(votes: u64, denominator: Option<u64>) -> Option<f64> {
    let d = denominator?;
    let pct = votes as f64 * 100.0 / d as f64;
    Some((pct * 100.0).round() / 100.0)
}

// Invariant: the group is not empty.
fn aggregate_group(group: &[KeyedRow]) -> AggregatedResult {
    let total_valid = group_total(group, |r| &r.total_valid_votes);
    let total_rejected = group_total(group, |r| &r.total_rejected_votes);
    let total = group_total(group, |r| &r.total_votes);

    let denominator = match (total_valid, total) {
        (Some(v), _) if v > 0 => Some(v),
        (_, Some(t)) if t > 0 => Some(t),
        _ => None,
    };

    let mut breakdown: Vec<BreakdownEntry> = group
        .iter()
        .map(|kr| BreakdownEntry {
            candidate: normalize_label(&kr.row.candidate_name),
            party: normalize_label(&kr.row.party_name),
            votes: kr.votes,
            pct: percentage(kr.votes, denominator),
        })
        .collect();
    // Stable: candidates with the same number of votes keep the source order.
    breakdown.sort_by(|a, b| b.votes.cmp(&a.votes));

    let winner = &breakdown[0];
    let winner_tied = breakdown.len() > 1 && breakdown[1].votes == winner.votes;
    let first = &group[0];
    AggregatedResult {
        winner_candidate: winner.candidate.clone(),
        winner_party: winner.party.clone(),
        winner_votes: winner.votes,
        winner_tied,
        total_valid,
        total_rejected,
        total,
        district_id: first.district.clone(),
        section_id: first.section.clone(),
        breakdown,
    }
}

// Reading the map sections and joining them with the results.

use crate::results::*;

/// Counts of the outcomes of a join between map features and the results.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct MatchReport {
    pub features: usize,
    pub matched: usize,
    pub no_match: usize,
    pub unkeyed: usize,
}

impl MatchReport {
    pub fn to_json(&self) -> JSValue {
        json!({
            "features": self.features,
            "matched": self.matched,
            "noMatch": self.no_match,
            "unkeyed": self.unkeyed,
        })
    }
}

/// Reads a GeoJSON FeatureCollection.
pub fn read_geojson(path: &str) -> MapResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    if !js["features"].is_array() {
        whatever!("{} is not a FeatureCollection: no features array", path)
    }
    Ok(js)
}

// Integral numbers are written without a fractional part, so that 37.0 and
// 37 give the same key.
fn property_text(v: &JSValue) -> Option<String> {
    match v {
        JSValue::Null => None,
        JSValue::String(s) => Some(s.clone()),
        JSValue::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Some(i.to_string()),
            (None, Some(f)) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
                Some(format!("{}", f as i64))
            }
            _ => Some(n.to_string()),
        },
        x => Some(x.to_string()),
    }
}

pub fn feature_properties(props: &JSMap<String, JSValue>) -> FeatureProperties {
    props
        .iter()
        .map(|(k, v)| (k.as_str(), property_text(v)))
        .collect()
}

/// Joins every feature with the results of the winner office.
///
/// Returns the report and a copy of the sections where each feature carries
/// its key and the winner of its section.
pub fn join_sections(
    sections: &JSValue,
    index: &ResultsIndex,
    keys: &KeyConfig,
    winner_office: &str,
) -> MapResult<(MatchReport, JSValue)> {
    let mut enriched = sections.clone();
    let features = match enriched["features"].as_array_mut() {
        Some(xs) => xs,
        None => whatever!("The sections have no features array"),
    };
    let mut report = MatchReport::default();
    let empty = JSMap::new();
    for feature in features.iter_mut() {
        report.features += 1;
        let props = feature_properties(feature["properties"].as_object().unwrap_or(&empty));
        let lookup = index.lookup_feature(&props, keys, winner_office);
        let (section_key, result) = match lookup {
            FeatureLookup::Matched {
                section_key,
                result,
                ..
            } => {
                report.matched += 1;
                (Some(section_key), Some(result))
            }
            FeatureLookup::NoMatch { section_key, .. } => {
                debug!("join_sections: no result for section {}", section_key);
                report.no_match += 1;
                (Some(section_key), None)
            }
            FeatureLookup::Unkeyed => {
                debug!("join_sections: no key in {:?}", props);
                report.unkeyed += 1;
                (None, None)
            }
        };

        if !feature["properties"].is_object() {
            feature["properties"] = JSValue::Object(JSMap::new());
        }
        let p = &mut feature["properties"];
        p["section_key"] = json!(section_key);
        p["has_results"] = json!(result.is_some());
        p["winner_candidate"] = json!(result.map(|r| r.winner_candidate.clone()));
        p["winner_party"] = json!(result.map(|r| r.winner_party.clone()));
        p["winner_votes"] = json!(result.map(|r| r.winner_votes));
        p["winner_tied"] = json!(result.map(|r| r.winner_tied));
    }
    info!(
        "Sections: {} features, {} matched, {} without results, {} without key",
        report.features, report.matched, report.no_match, report.unkeyed
    );
    if report.features > 0 && report.matched == 0 {
        warn!("No section of the map matched the results of office {}", winner_office);
    }
    Ok((report, enriched))
}

#[cfg(test)]
mod tests {
    use super::*;
    use section_results::builder::Builder;

    fn index() -> ResultsIndex {
        let mut b = Builder::new(&AggregationRules::default()).unwrap();
        b.add_simple("0", "11", "37", "Anna", "Parti A", 30).unwrap();
        b.add_simple("0", "11", "37", "Bob", "Parti B", 20).unwrap();
        b.add_simple("0", "11", "38", "Bob", "Parti B", 5).unwrap();
        b.build().unwrap().index
    }

    #[test]
    fn properties_as_text() {
        let js = json!({"DISTRICT": 11, "SECTION": 37.0, "NOM": "Parc", "AREA": 1.5, "X": null});
        let props = feature_properties(js.as_object().unwrap());
        assert_eq!(props.get("DISTRICT"), Some("11"));
        assert_eq!(props.get("SECTION"), Some("37"));
        assert_eq!(props.get("AREA"), Some("1.5"));
        assert_eq!(props.get("X"), None);
        assert_eq!(props.len(), 5);
    }

    #[test]
    fn join() {
        let sections = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"CODE_SECTION": "011-037"}, "geometry": null},
                {"type": "Feature", "properties": {"DISTRICT": "11", "SECTION": 39}, "geometry": null},
                {"type": "Feature", "properties": {"NOM": "Parc"}, "geometry": null},
                {"type": "Feature", "geometry": null}
            ]
        });
        let (report, enriched) =
            join_sections(&sections, &index(), &KeyConfig::default(), "0.00").unwrap();
        assert_eq!(
            report,
            MatchReport {
                features: 4,
                matched: 1,
                no_match: 1,
                unkeyed: 2
            }
        );
        let fs = enriched["features"].as_array().unwrap();
        assert_eq!(fs[0]["properties"]["winner_candidate"], json!("Anna"));
        assert_eq!(fs[0]["properties"]["winner_votes"], json!(30));
        assert_eq!(fs[0]["properties"]["winner_tied"], json!(false));
        assert_eq!(fs[1]["properties"]["section_key"], json!("011-039"));
        assert_eq!(fs[1]["properties"]["has_results"], json!(false));
        assert_eq!(fs[1]["properties"]["winner_party"], JSValue::Null);
        assert_eq!(fs[3]["properties"]["section_key"], JSValue::Null);
        // The input is not modified.
        assert_eq!(sections["features"][0]["properties"].as_object().unwrap().len(), 1);
    }

    #[test]
    fn not_a_collection() {
        let sections = json!({"type": "Feature"});
        assert!(join_sections(&sections, &index(), &KeyConfig::default(), "0").is_err());
    }
}

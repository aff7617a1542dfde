use crate::results::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: Option<String>,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
    #[serde(rename = "enrichedSectionsPath")]
    pub enriched_sections_path: Option<String>,
    #[serde(rename = "winnerOffice")]
    pub winner_office: Option<JSValue>,
    #[serde(rename = "onlyOffices")]
    pub only_offices: Option<Vec<JSValue>>,
    #[serde(rename = "officeLabelsPath")]
    pub office_labels_path: Option<String>,
    #[serde(rename = "officeAliasesPath")]
    pub office_aliases_path: Option<String>,
    #[serde(rename = "surnamesOnly")]
    pub surnames_only: Option<bool>,
}

impl OutputSettings {
    /// The office codes to keep, as written in the configuration.
    pub fn only_offices(&self) -> MapResult<Option<Vec<String>>> {
        match &self.only_offices {
            Some(xs) => {
                let mut res: Vec<String> = Vec::new();
                for x in xs.iter() {
                    res.push(read_js_string(x)?);
                }
                Ok(Some(res))
            }
            None => Ok(None),
        }
    }

    pub fn winner_office(&self) -> MapResult<Option<String>> {
        match &self.winner_office {
            Some(x) => read_js_string(x).map(Some),
            None => Ok(None),
        }
    }
}

/// The names of the columns of a results table. Missing entries use the
/// names of the Montréal exports.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct ColumnSettings {
    pub district: Option<String>,
    pub section: Option<String>,
    pub office: Option<String>,
    pub candidate: Option<String>,
    pub party: Option<String>,
    pub votes: Option<String>,
    #[serde(rename = "totalValidVotes")]
    pub total_valid_votes: Option<String>,
    #[serde(rename = "totalRejectedVotes")]
    pub total_rejected_votes: Option<String>,
    #[serde(rename = "totalVotes")]
    pub total_votes: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct InputSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    pub columns: Option<ColumnSettings>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct KeySettings {
    #[serde(rename = "sectionKeyMode")]
    pub section_key_mode: Option<String>,
    #[serde(rename = "districtWidth")]
    pub district_width: Option<JSValue>,
    #[serde(rename = "sectionWidth")]
    pub section_width: Option<JSValue>,
    #[serde(rename = "officeStyle")]
    pub office_style: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeoSettings {
    #[serde(rename = "sectionsPath")]
    pub sections_path: Option<String>,
    #[serde(rename = "districtAttributes")]
    pub district_attributes: Option<Vec<String>>,
    #[serde(rename = "sectionAttributes")]
    pub section_attributes: Option<Vec<String>>,
    #[serde(rename = "compositeAttributes")]
    pub composite_attributes: Option<Vec<String>>,
    #[serde(rename = "extractionChain")]
    pub extraction_chain: Option<Vec<String>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct MapConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: Option<OutputSettings>,
    #[serde(rename = "inputSources", default)]
    pub input_sources: Vec<InputSource>,
    #[serde(rename = "keySettings")]
    pub key_settings: Option<KeySettings>,
    #[serde(rename = "geoSettings")]
    pub geo_settings: Option<GeoSettings>,
}

pub fn read_config(path: &str) -> MapResult<MapConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: MapConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(config)
}

pub fn read_summary(path: &str) -> MapResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}

/// Builds the key rules from the settings, with the defaults for every
/// missing entry.
pub fn key_config(
    key_settings: Option<&KeySettings>,
    geo_settings: Option<&GeoSettings>,
) -> MapResult<KeyConfig> {
    let mut keys = KeyConfig::default();
    if let Some(ks) = key_settings {
        if let Some(mode) = &ks.section_key_mode {
            keys.section_key_mode = match mode.as_str() {
                "composite" => SectionKeyMode::Composite,
                "split" => SectionKeyMode::Split,
                x => whatever!("unknown section key mode: {}", x),
            };
        }
        if ks.district_width.is_some() {
            keys.district_width = read_js_int(&ks.district_width)?;
        }
        if ks.section_width.is_some() {
            keys.section_width = read_js_int(&ks.section_width)?;
        }
        if let Some(style) = &ks.office_style {
            keys.office_style = match style.as_str() {
                "bare" => OfficeKeyStyle::Bare,
                "fixed" => OfficeKeyStyle::FixedTwoDecimals,
                x => whatever!("unknown office style: {}", x),
            };
        }
    }
    if let Some(gs) = geo_settings {
        if let Some(xs) = &gs.district_attributes {
            keys.district_attributes = xs.clone();
        }
        if let Some(xs) = &gs.section_attributes {
            keys.section_attributes = xs.clone();
        }
        if let Some(xs) = &gs.composite_attributes {
            keys.composite_attributes = xs.clone();
        }
        if let Some(xs) = &gs.extraction_chain {
            let mut chain: Vec<ExtractionStrategy> = Vec::new();
            for x in xs.iter() {
                chain.push(extraction_strategy(x)?);
            }
            keys.extraction_chain = chain;
        }
    }
    keys.validate().context(AggregationSnafu {})?;
    Ok(keys)
}

fn extraction_strategy(x: &str) -> MapResult<ExtractionStrategy> {
    match x {
        "namedAttributes" => Ok(ExtractionStrategy::NamedAttributes),
        "compositeAttribute" => Ok(ExtractionStrategy::CompositeAttribute),
        "numericScan" => Ok(ExtractionStrategy::NumericScan),
        _ => whatever!("unknown extraction strategy: {}", x),
    }
}

fn read_js_int(x: &Option<JSValue>) -> MapResult<usize> {
    match x {
        Some(JSValue::Number(n)) => n.as_u64().map(|x| x as usize).context(ParsingJsonNumberSnafu {
            content: n.to_string(),
        }),
        Some(JSValue::String(s)) => s
            .trim()
            .parse::<usize>()
            .ok()
            .context(ParsingJsonNumberSnafu { content: s.clone() }),
        _ => None.context(ParsingJsonNumberSnafu {
            content: format!("{:?}", x),
        }),
    }
}

// Office codes are written as numbers or strings.
fn read_js_string(x: &JSValue) -> MapResult<String> {
    match x {
        JSValue::String(s) => Ok(s.clone()),
        JSValue::Number(n) => Ok(n.to_string()),
        _ => whatever!("expected an office code, found {}", x),
    }
}

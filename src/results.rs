use log::{debug, info, warn};

use section_results::normalize::{
    normalize_label, normalize_office_code, offices_equivalent, OfficeCode,
};
use section_results::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::results::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
mod io_geojson;
mod io_labels;

#[derive(Debug, Snafu)]
pub enum MapError {
    #[snafu(display("Error opening excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Excel file {path} has no worksheet {sheet}"))]
    MissingWorksheet { sheet: String, path: String },
    #[snafu(display("Excel file {path} is empty"))]
    EmptyExcel { path: String },
    #[snafu(display("Error opening csv file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Column {column} not found in {path}"))]
    MissingColumn { column: String, path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing json file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing json"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Expected a number in the configuration, found {content}"))]
    ParsingJsonNumber { content: String },
    #[snafu(display("Could not find the directory of the configuration file"))]
    MissingParentDir {},
    #[snafu(display("Aggregation failed: {source}"))]
    Aggregation { source: AggregationErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type MapResult<T> = Result<T, MapError>;

/// What one generation pass produces.
#[derive(PartialEq, Debug, Clone)]
pub struct GenerationOutput {
    pub summary: JSValue,
    /// The sections, with the results of the winner office in their properties.
    pub enriched_sections: Option<JSValue>,
}

fn results_to_json(index: &ResultsIndex) -> JSValue {
    let mut offices: JSMap<String, JSValue> = JSMap::new();
    for (office, sections) in index.iter() {
        let mut office_js: JSMap<String, JSValue> = JSMap::new();
        for (section_key, r) in sections.iter() {
            office_js.insert(section_key.clone(), result_to_json(r));
        }
        offices.insert(office.clone(), JSValue::Object(office_js));
    }
    JSValue::Object(offices)
}

fn result_to_json(r: &AggregatedResult) -> JSValue {
    let breakdown: Vec<JSValue> = r
        .breakdown
        .iter()
        .map(|b| {
            json!({
                "candidat": b.candidate,
                "parti": b.party,
                "votes": b.votes,
                "pct": b.pct,
            })
        })
        .collect();
    json!({
        "winner_candidate": r.winner_candidate,
        "winner_party": r.winner_party,
        "winner_votes": r.winner_votes,
        "winner_tied": r.winner_tied,
        "total_valid": r.total_valid,
        "total_rejected": r.total_rejected,
        "total_votes": r.total,
        "district_id": r.district_id,
        "section_id": r.section_id,
        "breakdown": breakdown,
    })
}

fn stats_to_json(stats: &AggregationStats) -> JSValue {
    json!({
        "rowsRead": stats.rows_read,
        "rowsAggregated": stats.rows_aggregated,
        "unkeyableOffice": stats.unkeyable_office,
        "unkeyableSection": stats.unkeyable_section,
        "filteredOffice": stats.filtered_office,
        "malformedVotes": stats.malformed_votes,
        "groups": stats.groups,
    })
}

fn key_mode_name(mode: SectionKeyMode) -> &'static str {
    match mode {
        SectionKeyMode::Composite => "composite",
        SectionKeyMode::Split => "split",
    }
}

fn office_style_name(style: OfficeKeyStyle) -> &'static str {
    match style {
        OfficeKeyStyle::Bare => "bare",
        OfficeKeyStyle::FixedTwoDecimals => "fixed",
    }
}

fn resolve_path(root: &Path, p: &str) -> String {
    root.join(p).display().to_string()
}

fn read_result_rows(root: &Path, source: &InputSource) -> MapResult<Vec<RawResultRow>> {
    let path = resolve_path(root, &source.file_path);
    info!("Attempting to read results file {:?}", path);
    let rows = match source.provider.as_str() {
        "csv" => io_csv::read_csv_results(&path, source),
        "xlsx" | "excel" => io_excel::read_excel_results(&path, source),
        x => whatever!("Provider not implemented {:?}", x),
    }?;
    info!(
        "Read {} rows from {}",
        rows.len(),
        io_common::simplify_file_name(&path)
    );
    Ok(rows)
}

/// Runs one generation pass: reads the results, aggregates them and joins the
/// map sections if any.
pub fn build_summary(config: &MapConfig, root: &Path) -> MapResult<GenerationOutput> {
    let keys = key_config(config.key_settings.as_ref(), config.geo_settings.as_ref())?;
    let output_settings = config.output_settings.clone().unwrap_or_default();
    let only_offices = output_settings.only_offices()?;
    let rules = AggregationRules {
        keys: keys.clone(),
        only_offices,
    };

    if config.input_sources.is_empty() {
        whatever!("No input source: use --input or the inputSources setting of the configuration")
    }
    let mut rows: Vec<RawResultRow> = Vec::new();
    for source in config.input_sources.iter() {
        let mut source_rows = read_result_rows(root, source)?;
        rows.append(&mut source_rows);
    }
    if output_settings.surnames_only.unwrap_or(false) {
        for row in rows.iter_mut() {
            row.candidate_name = io_common::surname_only(&row.candidate_name);
        }
    }

    let outcome = build_results_index(&rows, &rules).context(AggregationSnafu {})?;
    let stats = &outcome.stats;
    if stats.rows_dropped() > 0 {
        warn!(
            "{} rows could not be keyed ({} without office, {} without section)",
            stats.rows_dropped(),
            stats.unkeyable_office,
            stats.unkeyable_section
        );
    }

    let winner_raw = output_settings.winner_office()?.unwrap_or_else(|| "0".to_string());
    let winner_office = match OfficeCode::parse(&winner_raw) {
        Some(code) => code.render(keys.office_style),
        None => whatever!("Cannot read the winner office {:?}", winner_raw),
    };
    if outcome.index.sections(&winner_office).is_none() && !outcome.index.is_empty() {
        warn!("No result for the winner office {}", winner_office);
    }

    let label_table = match &output_settings.office_labels_path {
        Some(p) => io_labels::read_office_labels(&resolve_path(root, p))?,
        None => vec![],
    };
    let aliases = match &output_settings.office_aliases_path {
        Some(p) => io_labels::read_office_aliases(&resolve_path(root, p))?,
        None => vec![],
    };
    let labels = io_labels::office_labels(&outcome.index, &label_table, &aliases);

    let mut summary = json!({
        "config": {
            "contest": output_settings.contest_name,
            "winnerOffice": winner_office,
            "sectionKeyMode": key_mode_name(keys.section_key_mode),
            "officeStyle": office_style_name(keys.office_style),
        },
        "stats": stats_to_json(stats),
        "offices": labels,
        "results": results_to_json(&outcome.index),
    });

    let sections_path = config
        .geo_settings
        .as_ref()
        .and_then(|g| g.sections_path.clone());
    let enriched_sections = match sections_path {
        Some(p) => {
            let sections = io_geojson::read_geojson(&resolve_path(root, &p))?;
            let (report, enriched) =
                io_geojson::join_sections(&sections, &outcome.index, &keys, &winner_office)?;
            summary["sections"] = report.to_json();
            Some(enriched)
        }
        None => None,
    };

    Ok(GenerationOutput {
        summary,
        enriched_sections,
    })
}

fn write_json(root: &Path, out: &str, js: &JSValue) -> MapResult<()> {
    let pretty = serde_json::to_string_pretty(js).context(SerializingJsonSnafu {})?;
    if out == "stdout" {
        println!("{}", pretty);
        return Ok(());
    }
    let path = resolve_path(root, out);
    info!("Writing {}", path);
    fs::write(&path, pretty).context(WritingOutputSnafu { path })
}

/// Compares a summary with a reference summary, printing the differences.
pub fn check_reference(summary_path: &str, summary: &JSValue) -> MapResult<()> {
    let summary_ref = read_summary(summary_path)?;
    debug!("reference summary: {:?}", summary_ref);
    // Map order is not significant.
    if &summary_ref != summary {
        let pretty_ref = serde_json::to_string_pretty(&summary_ref).context(SerializingJsonSnafu {})?;
        let pretty = serde_json::to_string_pretty(summary).context(SerializingJsonSnafu {})?;
        warn!("Found differences with the reference summary");
        print_diff(pretty_ref.as_str(), pretty.as_str(), "\n");
        whatever!("Difference detected between the summary and the reference summary")
    }
    info!("The summary matches the reference {}", summary_path);
    Ok(())
}

pub fn run_generation(args: &Args) -> MapResult<()> {
    let (config, root): (MapConfig, PathBuf) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path)
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, root)
        }
        None => (MapConfig::default(), PathBuf::new()),
    };
    let config = apply_args(config, args)?;
    info!("config: {:?}", config);

    let output = build_summary(&config, &root)?;
    let output_settings = config.output_settings.clone().unwrap_or_default();

    let out = output_settings
        .output_path
        .clone()
        .unwrap_or_else(|| "stdout".to_string());
    write_json(&root, &out, &output.summary)?;

    match (&output.enriched_sections, &output_settings.enriched_sections_path) {
        (Some(js), Some(p)) => write_json(&root, p, js)?,
        (None, Some(p)) => warn!("No sections to enrich, {} is not written", p),
        _ => {}
    }

    if let Some(reference) = &args.reference {
        check_reference(reference, &output.summary)?;
    }
    Ok(())
}

// Paths given on the command line are relative to the working directory.
fn cli_path(p: &str) -> String {
    match std::env::current_dir() {
        Ok(cwd) if Path::new(p).is_relative() => resolve_path(&cwd, p),
        _ => p.to_string(),
    }
}

/// Overrides the configuration with the command line flags.
pub fn apply_args(config: MapConfig, args: &Args) -> MapResult<MapConfig> {
    let mut config = config;
    let mut output = config.output_settings.clone().unwrap_or_default();
    let mut geo = config.geo_settings.clone().unwrap_or_default();
    let mut key_settings = config.key_settings.clone().unwrap_or_default();

    if let Some(input) = &args.input {
        config.input_sources = vec![InputSource {
            provider: args.input_type.clone().unwrap_or_else(|| "csv".to_string()),
            file_path: cli_path(input),
            excel_worksheet_name: args.excel_worksheet_name.clone(),
            columns: None,
        }];
    } else if args.input_type.is_some() || args.excel_worksheet_name.is_some() {
        whatever!("--input-type and --excel-worksheet-name require --input")
    }
    if let Some(out) = &args.out {
        output.output_path = Some(if out == "stdout" {
            out.clone()
        } else {
            cli_path(out)
        });
    }
    if let Some(p) = &args.enriched_sections {
        output.enriched_sections_path = Some(cli_path(p));
    }
    if let Some(x) = args
        .only_office
        .iter()
        .find(|x| normalize_office_code(x).is_empty())
    {
        whatever!("--only-office: {:?} is not an office code", x)
    }
    if !args.only_office.is_empty() {
        output.only_offices = Some(
            args.only_office
                .iter()
                .map(|s| JSValue::String(s.clone()))
                .collect(),
        );
    }
    if let Some(w) = &args.winner_office {
        if normalize_office_code(w).is_empty() {
            whatever!("--winner-office: {:?} is not an office code", w)
        }
        output.winner_office = Some(JSValue::String(w.clone()));
    }
    if let Some(p) = &args.office_labels {
        output.office_labels_path = Some(cli_path(p));
    }
    if args.surnames_only {
        output.surnames_only = Some(true);
    }
    if let Some(p) = &args.sections {
        geo.sections_path = Some(cli_path(p));
    }
    if let Some(m) = &args.key_mode {
        key_settings.section_key_mode = Some(m.clone());
    }
    if let Some(s) = &args.office_style {
        key_settings.office_style = Some(s.clone());
    }

    config.output_settings = Some(output);
    config.geo_settings = Some(geo);
    config.key_settings = Some(key_settings);
    Ok(config)
}

fn run_generation_test(test_name: &str, config_lpath: &str, summary_lpath: &str) -> MapResult<()> {
    let test_dir = option_env!("SECMAP_TEST_DIR")
        .unwrap_or(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data"));
    info!("Running test {}", test_name);
    let config_path = format!("{}/{}/{}", test_dir, test_name, config_lpath);
    let config = read_config(&config_path)?;
    let root = Path::new(&config_path)
        .parent()
        .context(MissingParentDirSnafu {})?
        .to_path_buf();
    let output = build_summary(&config, &root)?;
    check_reference(
        &format!("{}/{}/{}", test_dir, test_name, summary_lpath),
        &output.summary,
    )
}

pub fn test_wrapper(test_name: &str) {
    let res = run_generation_test(
        test_name,
        format!("{}_config.json", test_name).as_str(),
        format!("{}_expected_summary.json", test_name).as_str(),
    );
    if let Err(e) = res {
        warn!("Error occured {:?}", e);
        panic!("An error occured in test {}: {}", test_name, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn montreal_sample() {
        init();
        test_wrapper("montreal_sample");
    }

    #[test]
    fn split_keys_custom_columns() {
        init();
        test_wrapper("split_keys");
    }

    #[test]
    fn enriched_sections() {
        init();
        let config_path = concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/data/montreal_sample/montreal_sample_config.json"
        );
        let config = read_config(config_path).unwrap();
        let root = Path::new(config_path).parent().unwrap();
        let output = build_summary(&config, root).unwrap();
        let enriched = output.enriched_sections.unwrap();
        let features = enriched["features"].as_array().unwrap();
        assert_eq!(features.len(), 4);
        let p0 = &features[0]["properties"];
        assert_eq!(p0["section_key"], json!("011-037"));
        assert_eq!(p0["has_results"], json!(true));
        assert_eq!(p0["winner_candidate"], json!("Rabouin"));
        assert_eq!(p0["CODE_SECTION"], json!("011-037"));
        let p3 = &features[3]["properties"];
        assert_eq!(p3["has_results"], json!(false));
        assert_eq!(p3["winner_candidate"], JSValue::Null);
        assert_eq!(p3["section_key"], JSValue::Null);
    }

    #[test]
    fn args_override_config() {
        let args = Args {
            config: None,
            reference: None,
            out: Some("stdout".to_string()),
            input: Some("/data/results.xlsx".to_string()),
            input_type: Some("xlsx".to_string()),
            excel_worksheet_name: Some("Feuil1".to_string()),
            sections: None,
            enriched_sections: None,
            only_office: vec!["0".to_string(), "1,10".to_string()],
            winner_office: Some("1.1".to_string()),
            key_mode: Some("split".to_string()),
            office_style: None,
            office_labels: None,
            surnames_only: true,
            verbose: false,
        };
        let config = apply_args(MapConfig::default(), &args).unwrap();
        assert_eq!(config.input_sources.len(), 1);
        assert_eq!(config.input_sources[0].provider, "xlsx");
        assert_eq!(config.input_sources[0].file_path, "/data/results.xlsx");
        let output = config.output_settings.clone().unwrap();
        assert_eq!(output.output_path, Some("stdout".to_string()));
        assert_eq!(
            output.only_offices().unwrap(),
            Some(vec!["0".to_string(), "1,10".to_string()])
        );
        assert_eq!(output.winner_office().unwrap(), Some("1.1".to_string()));
        assert_eq!(output.surnames_only, Some(true));
        let keys = key_config(config.key_settings.as_ref(), config.geo_settings.as_ref()).unwrap();
        assert_eq!(keys.section_key_mode, SectionKeyMode::Split);
    }

    #[test]
    fn bad_winner_office() {
        let args = Args {
            config: None,
            reference: None,
            out: None,
            input: Some("results.csv".to_string()),
            input_type: None,
            excel_worksheet_name: None,
            sections: None,
            enriched_sections: None,
            only_office: vec![],
            winner_office: Some("Mairie".to_string()),
            key_mode: None,
            office_style: None,
            office_labels: None,
            surnames_only: false,
            verbose: false,
        };
        assert!(apply_args(MapConfig::default(), &args).is_err());
    }

    #[test]
    fn bad_only_office() {
        let args = Args {
            config: None,
            reference: None,
            out: None,
            input: Some("results.csv".to_string()),
            input_type: None,
            excel_worksheet_name: None,
            sections: None,
            enriched_sections: None,
            only_office: vec!["0".to_string(), "mairie".to_string()],
            winner_office: None,
            key_mode: None,
            office_style: None,
            office_labels: None,
            surnames_only: false,
            verbose: false,
        };
        assert!(apply_args(MapConfig::default(), &args).is_err());
    }

    #[test]
    fn empty_office_filter_in_config() {
        init();
        let config_path = concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/data/split_keys/split_keys_config.json"
        );
        let mut config = read_config(config_path).unwrap();
        let root = Path::new(config_path).parent().unwrap();
        if let Some(output) = config.output_settings.as_mut() {
            output.only_offices = Some(vec![]);
        }
        let output = build_summary(&config, root).unwrap();
        assert_eq!(output.summary["stats"]["filteredOffice"], json!(0));
        assert_eq!(output.summary["stats"]["rowsAggregated"], json!(5));

        if let Some(output) = config.output_settings.as_mut() {
            output.only_offices = Some(vec![json!("mairie")]);
        }
        assert!(build_summary(&config, root).is_err());
    }
}

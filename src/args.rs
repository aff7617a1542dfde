use clap::Parser;

/// This program aggregates election results by voting section and matches them
/// with the sections of an electoral map.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the inputs, the keys and the outputs.
    /// See the manual of the `section_results` crate for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference summary in JSON format. If provided, secmap will check that
    /// the generated summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary will be written in JSON format
    /// to the given location. Overrides the output path of the configuration.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) The results table. Overrides the input sources of the configuration.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the input: csv or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// When using an Excel file, the name of the worksheet to use (default: the first one).
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (file path) The GeoJSON file with the voting sections to match.
    #[clap(short, long, value_parser)]
    pub sections: Option<String>,

    /// (file path) Where to write a copy of the sections enriched with the winners.
    #[clap(long, value_parser)]
    pub enriched_sections: Option<String>,

    /// (repeatable) Only aggregate these offices, for example `--only-office 0 --only-office 1.10`.
    #[clap(long, value_parser)]
    pub only_office: Vec<String>,

    /// (default 0) The office used to color the sections.
    #[clap(long, value_parser)]
    pub winner_office: Option<String>,

    /// (composite or split) How the district and the section are combined in the keys.
    #[clap(long, value_parser)]
    pub key_mode: Option<String>,

    /// (bare or fixed) How the office codes are written in the summary.
    #[clap(long, value_parser)]
    pub office_style: Option<String>,

    /// (file path) CSV table of the office labels (columns no, type, poste).
    #[clap(long, value_parser)]
    pub office_labels: Option<String>,

    /// If passed as an argument, only the surnames of the candidates are kept.
    #[clap(long, takes_value = false)]
    pub surnames_only: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}

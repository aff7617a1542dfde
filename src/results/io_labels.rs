// Human readable labels for the offices.

use crate::results::*;

/// Reads an office table with the columns `no`, `type` and `poste`.
///
/// Rows whose number cannot be read are skipped.
pub fn read_office_labels(path: &str) -> MapResult<Vec<(OfficeCode, String)>> {
    info!("Reading office labels from {}", path);
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let header: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu { path, lineno: 1usize })?
        .iter()
        .map(|s| normalize_label(s).to_lowercase())
        .collect();
    let col = |name: &str| header.iter().position(|h| h == name);
    let no_idx = col("no").context(MissingColumnSnafu { column: "no", path })?;
    let type_idx = col("type");
    let poste_idx = col("poste");

    let mut res: Vec<(OfficeCode, String)> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        let code = match line.get(no_idx).and_then(OfficeCode::parse) {
            Some(c) => c,
            None => {
                debug!("read_office_labels: no office number on line {}", lineno);
                continue;
            }
        };
        let text = |i: Option<usize>| {
            i.and_then(|i| line.get(i))
                .map(normalize_label)
                .unwrap_or_default()
        };
        let label = office_label(&code, &text(type_idx), &text(poste_idx));
        res.push((code, label));
    }
    Ok(res)
}

fn office_label(code: &OfficeCode, office_type: &str, office_name: &str) -> String {
    match (office_type.is_empty(), office_name.is_empty()) {
        (false, false) => format!("{} {}", office_type, office_name),
        (false, true) => office_type.to_string(),
        (true, false) => office_name.to_string(),
        (true, true) => code.render(OfficeKeyStyle::FixedTwoDecimals),
    }
}

/// Reads a JSON object from office codes to labels.
pub fn read_office_aliases(path: &str) -> MapResult<Vec<(String, String)>> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    let obj = match js.as_object() {
        Some(o) => o,
        None => whatever!("{}: the office aliases must be a JSON object", path),
    };
    let mut res: Vec<(String, String)> = Vec::new();
    for (k, v) in obj.iter() {
        match v.as_str() {
            Some(s) => res.push((k.clone(), s.to_string())),
            None => warn!("read_office_aliases: ignoring the alias of {}: {}", k, v),
        }
    }
    Ok(res)
}

/// The label of every office of the index. Aliases take precedence over the
/// label table; offices without any label are named by their key.
pub fn office_labels(
    index: &ResultsIndex,
    labels: &[(OfficeCode, String)],
    aliases: &[(String, String)],
) -> JSValue {
    let mut res: JSMap<String, JSValue> = JSMap::new();
    for office in index.office_keys() {
        let code = OfficeCode::parse(office);
        let alias = aliases
            .iter()
            .find(|(k, _)| offices_equivalent(k, office))
            .map(|(_, v)| v.clone());
        let label = alias
            .or_else(|| {
                labels
                    .iter()
                    .find(|(c, _)| Some(*c) == code)
                    .map(|(_, v)| v.clone())
            })
            .unwrap_or_else(|| office.clone());
        res.insert(office.clone(), JSValue::String(label));
    }
    JSValue::Object(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use section_results::builder::Builder;

    fn code(x: &str) -> OfficeCode {
        OfficeCode::parse(x).unwrap()
    }

    #[test]
    fn labels_from_parts() {
        assert_eq!(
            office_label(&code("1.1"), "Conseiller de ville", "Jeanne-Mance"),
            "Conseiller de ville Jeanne-Mance"
        );
        assert_eq!(office_label(&code("0"), "Mairie", ""), "Mairie");
        assert_eq!(office_label(&code("1.1"), "", ""), "1.10");
    }

    #[test]
    fn labels_of_the_index() {
        let mut b = Builder::new(&AggregationRules::default()).unwrap();
        b.add_simple("0", "1", "1", "A", "P", 1).unwrap();
        b.add_simple("1,10", "1", "1", "A", "P", 1).unwrap();
        b.add_simple("2", "1", "1", "A", "P", 1).unwrap();
        let index = b.build().unwrap().index;
        let labels = vec![
            (code("0"), "Mairie de Montréal".to_string()),
            (code("1.1"), "Conseiller Jeanne-Mance".to_string()),
        ];
        let aliases = vec![("0.00".to_string(), "Mairie".to_string())];
        let js = office_labels(&index, &labels, &aliases);
        assert_eq!(
            js,
            json!({"0": "Mairie", "1.10": "Conseiller Jeanne-Mance", "2": "2"})
        );
    }

    #[test]
    fn label_table() {
        let path = concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/data/montreal_sample/postes.csv"
        );
        let labels = read_office_labels(path).unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0], (code("0"), "Mairie de Montréal".to_string()));
        assert_eq!(
            labels[1],
            (code("1.1"), "Conseiller de ville Peter-McGill".to_string())
        );
    }
}

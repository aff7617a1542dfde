/*!

This is the long-form manual for `section_results` and `secmap`.

## Input formats

The result table has one row per candidate, per office, per voting section.
The following providers are supported:
* `csv` Comma Separated Values with a header row
* `xlsx` Excel workbook (first worksheet, or the one named by `excelWorksheetName`)

The default column names are the ones of the Montréal open data exports:

```text
ElectoralDistrictID,Bureau,Poste,Candidat,Parti,Votes,TotalValidVotes,TotalRejectedVotes,TotalVotes
11,37,"0,00",Anna,Parti A,30,50,2,52
11,37,"0,00",Bob,Parti B,20,50,2,52
```

`ElectoralDistrictID`, `Bureau`, `Poste`, `Candidat` and `Votes` are required. The
other columns are optional: a missing total means that the percentages of the
section fall back to the next total, or are not computed at all.

### Identifiers

Identifiers are normalized before grouping:
- districts keep their digits, without leading zeros (`"011"` is district `11`)
- sections keep their last 3 digits, padded with zeros (`"Bureau 7"` is `007`)
- offices are read as numbers, with comma or dot decimals (`"0,00"`, `"0"` and `0.0`
  are the same office, written `0`; `"1,1"` is written `1.10`)

Rows with an office that is not a number (`N/A`) or a section without digits are
dropped and counted in the statistics.

### Section keys

Two key shapes are supported, to match the map data:
- `composite` (default): `011-037`, district padded to 3 digits. This matches a
  `CODE_SECTION` attribute.
- `split`: `11|037`. This matches maps with separate district and bureau attributes.

### Map sections

The sections are a GeoJSON `FeatureCollection`. The district and the section of each
feature are found by trying, in order:
- `namedAttributes`: the first attribute present in the district list (`DISTRICTID`,
  `DISTRICT_ID`, `DISTRICT`, ...) and in the section list (`SECTION`, `BUREAU`, ...)
- `compositeAttribute`: a composite code (`CODE_SECTION`) such as `011-037`
- `numericScan`: the first short number (at most 3 digits) of the feature is the
  district and the first 3-digit number is the section

## Winners

The winner of a section is the candidate with the most votes. When several
candidates have the same number of votes, the first one in the input order is
reported and the record is marked with `winner_tied`. This is not an electoral
tie-break rule: consumers that must report ties should check this flag.

Percentages use the valid votes, or the total votes when there are no valid votes,
and are rounded to 2 decimals. When neither is available, the percentage is `null`.

## Configuration

The program accepts a configuration file in JSON. All paths are relative to the
directory of the configuration file.

```text
{
  "outputSettings": {
    "contestName": "Élection municipale 2025",
    "outputPath": "summary.json",
    "enrichedSectionsPath": "sections_results.geojson",
    "winnerOffice": "0",
    "onlyOffices": ["0", "1.10"],
    "officeLabelsPath": "postes.csv",
    "officeAliasesPath": "poste_alias.json",
    "surnamesOnly": false
  },
  "inputSources": [
    { "provider": "csv", "filePath": "results.csv", "columns": { "party": "Parti" } }
  ],
  "keySettings": {
    "sectionKeyMode": "composite",
    "districtWidth": 3,
    "sectionWidth": "3",
    "officeStyle": "bare"
  },
  "geoSettings": {
    "sectionsPath": "sections.geojson",
    "sectionAttributes": ["SECTION", "BUREAU"],
    "extractionChain": ["namedAttributes", "compositeAttribute", "numericScan"]
  }
}
```

Notes:
- `onlyOffices` lists office numbers. An empty list keeps every office; an entry that is
  not a number (`"mairie"`) is an error.
- `officeStyle` is `bare` (`0`, `1.10`) or `fixed` (`0.00`, `1.10`). Lookups accept
  both forms whatever the style.
- `officeLabelsPath` is a CSV file with the columns `no`, `type` and `poste`. The label
  of an office is `"<type> <poste>"`.
- `officeAliasesPath` is a JSON object from office codes to labels. Aliases take
  precedence over the labels.
- `surnamesOnly` reduces the candidate names to their surnames (`Luc Rabouin` becomes
  `Rabouin`, `Katy Le Rougetel` becomes `Le Rougetel`).
- the command line flags override the settings of the file.

 */

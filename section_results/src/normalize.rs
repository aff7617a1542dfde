//! Canonical forms for the identifiers shared by result tables and map
//! features.
//!
//! All the functions are total: malformed inputs give empty strings or `None`,
//! which callers treat as "no match".

use log::warn;
use unicode_normalization::UnicodeNormalization;

use crate::config::{KeyConfig, OfficeKeyStyle, SectionKeyMode};

fn digits_only(x: &str) -> String {
    x.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Keeps only the digits and strips the leading zeros.
///
/// ```
/// use section_results::normalize::normalize_digits;
/// assert_eq!(normalize_digits("011"), "11");
/// assert_eq!(normalize_digits("abc"), "");
/// ```
pub fn normalize_digits(x: &str) -> String {
    digits_only(x).trim_start_matches('0').to_string()
}

/// Keeps the last `width` digits and pads them with zeros on the left.
///
/// Only the end of the numeric string is used, because some sources prefix
/// the section number with other identifiers.
pub fn normalize_fixed_width(x: &str, width: usize) -> String {
    let d = digits_only(x);
    let tail = &d[d.len().saturating_sub(width)..];
    format!("{:0>width$}", tail, width = width)
}

/// Trims a free-text label and removes the invisible characters that often
/// come with exported tables (byte-order marks, non-breaking spaces).
///
/// The result is in Unicode NFC form, so that decomposed accents (`e` followed
/// by a combining acute accent) compare equal to precomposed ones.
pub fn normalize_label(x: &str) -> String {
    x.replace('\u{feff}', "")
        .replace('\u{a0}', " ")
        .trim()
        .nfc()
        .collect()
}

/// An office (post) code, stored exactly in hundredths.
///
/// The same office is written `0`, `0.0`, `0,00` or `0.00` depending on the
/// source. Comparing `OfficeCode` values instead of strings avoids silent
/// lookup misses between the two canonical forms.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct OfficeCode {
    hundredths: i64,
}

impl OfficeCode {
    /// Parses a code, accepting comma and dot decimals.
    pub fn parse(x: &str) -> Option<OfficeCode> {
        let s = x.trim().replace(',', ".");
        if s.is_empty() {
            return None;
        }
        let f = s.parse::<f64>().ok()?;
        if !f.is_finite() {
            return None;
        }
        let scaled = f * 100.0;
        let hundredths = scaled.round();
        // Codes are compared in hundredths: finer codes share a key.
        if (scaled - hundredths).abs() > 1e-6 {
            warn!(
                "OfficeCode::parse: {:?} has more than 2 decimals, read as {:.2}",
                x,
                hundredths / 100.0
            );
        }
        if hundredths.abs() > (i64::MAX / 2) as f64 {
            return None;
        }
        Some(OfficeCode {
            hundredths: hundredths as i64,
        })
    }

    pub fn is_integral(&self) -> bool {
        self.hundredths % 100 == 0
    }

    pub fn render(&self, style: OfficeKeyStyle) -> String {
        match style {
            OfficeKeyStyle::Bare if self.is_integral() => (self.hundredths / 100).to_string(),
            _ => {
                let sign = if self.hundredths < 0 { "-" } else { "" };
                let abs = self.hundredths.unsigned_abs();
                format!("{}{}.{:02}", sign, abs / 100, abs % 100)
            }
        }
    }

    /// The shortest floating point form: `1.1`, `0`.
    pub fn float_string(&self) -> String {
        (self.hundredths as f64 / 100.0).to_string()
    }
}

/// Canonical office key: integral codes without decimals, other codes with
/// exactly two decimals. Empty if the code cannot be parsed.
pub fn normalize_office_code(x: &str) -> String {
    OfficeCode::parse(x)
        .map(|c| c.render(OfficeKeyStyle::Bare))
        .unwrap_or_default()
}

/// Two office codes designate the same office.
pub fn offices_equivalent(a: &str, b: &str) -> bool {
    match (OfficeCode::parse(a), OfficeCode::parse(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// The keys to try, in order, when looking for an office: the requested key,
/// then its bare, fixed and float renderings.
pub fn office_key_variants(x: &str) -> Vec<String> {
    let mut res: Vec<String> = vec![x.to_string()];
    if let Some(code) = OfficeCode::parse(x) {
        for v in [
            code.render(OfficeKeyStyle::Bare),
            code.render(OfficeKeyStyle::FixedTwoDecimals),
            code.float_string(),
        ] {
            if !res.contains(&v) {
                res.push(v);
            }
        }
    }
    res
}

/// Builds the section key from an already normalized district (digits without
/// leading zeros) and section.
pub fn compose_section_key(district: &str, section: &str, keys: &KeyConfig) -> String {
    match keys.section_key_mode {
        SectionKeyMode::Composite => format!(
            "{:0>width$}{}{}",
            district,
            keys.composite_separator,
            section,
            width = keys.district_width
        ),
        SectionKeyMode::Split => format!("{}{}{}", district, keys.split_separator, section),
    }
}

/// The normalized district and section of a raw pair, or None if one of them
/// carries no usable digit.
pub fn normalize_section_pair(
    district_raw: &str,
    section_raw: &str,
    keys: &KeyConfig,
) -> Option<(String, String)> {
    let district = normalize_digits(district_raw);
    if district.is_empty() || digits_only(section_raw).is_empty() {
        return None;
    }
    let section = normalize_fixed_width(section_raw, keys.section_width);
    Some((district, section))
}

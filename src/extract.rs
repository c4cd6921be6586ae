//! Heuristic field extraction over tender description text.
//!
//! Announcement bodies on the aggregation feeds are loosely formatted free
//! text ("Importe: 40.631,78; Órgano de Contratación: ..."), so every field
//! is recovered by an ordered list of independent rules rather than a real
//! grammar. Amount is first-match-wins, keywords accumulate, and no rule
//! failing ever blocks another.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ingest::types::ContractType;

/// Labeled figure: "Importe: 40.631,78", "Valor estimado del contrato: ...".
/// Anything may sit between the label and the colon; the numeric token must
/// start and end on a digit so clause punctuation is not swallowed.
static RE_AMOUNT_LABELED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:importe total|importe|valor estimado|presupuesto base)[^:]*:\s*([0-9](?:[0-9.,]*[0-9])?)",
    )
    .expect("labeled amount regex")
});

/// Fallback: a bare numeric token directly followed by a currency marker.
static RE_AMOUNT_CURRENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([0-9](?:[0-9.,]*[0-9])?)\s*(?:€|eur\b|euros\b)").expect("currency amount regex")
});

/// Contracting body, captured up to the next clause separator.
static RE_ORGANISM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)órgano de contratación:\s*(.+?)\s*(?:[;,\n]|\.\s|\.?$)")
        .expect("organism regex")
});

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

const SUMMARY_MAX_CHARS: usize = 300;

/// Output of the extraction rules for one raw description body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    pub amount: Option<String>,
    pub organism: Option<String>,
    /// Cleaned, untruncated summary text.
    pub summary: String,
}

/// Run every rule over one raw description body. The markup strip happens
/// first so the amount and organism rules scan the same untruncated text
/// surface the summary is built from, tags and all entities resolved.
pub fn extract_fields(raw: &str) -> ExtractedFields {
    let summary = clean_summary(raw);
    ExtractedFields {
        amount: extract_amount(&summary),
        organism: extract_organism(&summary),
        summary,
    }
}

/// First-match-wins amount recovery: a labeled figure anywhere in the text
/// beats a bare currency-suffixed number, even one appearing earlier.
pub fn extract_amount(text: &str) -> Option<String> {
    let token = RE_AMOUNT_LABELED
        .captures(text)
        .or_else(|| RE_AMOUNT_CURRENCY.captures(text))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())?;
    parse_numeric_token(token).map(format_eur)
}

/// Disambiguate separators in a captured numeric token.
///
/// A dots-only token ending in exactly two digits ("600000.00") is already
/// in decimal-dot form. Everything else follows the Spanish convention:
/// dots group thousands and a comma marks the decimals, so "100.000,00" →
/// 100000.00 and "1500,50" → 1500.50. Unparseable leftovers yield `None`.
pub fn parse_numeric_token(token: &str) -> Option<f64> {
    let t = token.trim();
    let plain_decimal = !t.contains(',')
        && t.contains('.')
        && t.rsplit('.').next().is_some_and(|frac| frac.len() == 2);
    let normalized = if plain_decimal {
        t.to_string()
    } else {
        t.replace('.', "").replace(',', ".")
    };
    normalized.parse::<f64>().ok()
}

/// Spanish/Euro display formatting: thousands '.', decimal ',', two
/// fraction digits, trailing euro sign.
pub fn format_eur(value: f64) -> String {
    let cents = (value * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("{grouped},{frac:02} €")
}

/// "Órgano de Contratación: <name>" up to the next `;`, `,`, `". "`,
/// newline, or end of text. `None` when the label is missing.
pub fn extract_organism(text: &str) -> Option<String> {
    RE_ORGANISM
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Unconditional markup strip: decode entities, drop every tag, collapse
/// whitespace, trim.
pub fn clean_summary(raw: &str) -> String {
    let decoded = html_escape::decode_html_entities(raw);
    let stripped = RE_TAGS.replace_all(&decoded, "");
    let collapsed = RE_WS.replace_all(&stripped, " ");
    collapsed.trim().to_string()
}

/// Cap the display summary at 300 characters with an ellipsis marker.
pub fn truncate_summary(s: &str) -> String {
    if s.chars().count() <= SUMMARY_MAX_CHARS {
        return s.to_string();
    }
    let mut out: String = s.chars().take(SUMMARY_MAX_CHARS).collect();
    out.push_str("...");
    out
}

/// Case-insensitive containment of each configured keyword against the
/// combined text surface. Result keeps the keyword list's order and
/// collapses duplicates into a set.
pub fn match_keywords(haystack: &str, keywords: &[String]) -> Vec<String> {
    let lowered = haystack.to_lowercase();
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for kw in keywords {
        let needle = kw.trim().to_lowercase();
        if needle.is_empty() || !lowered.contains(&needle) {
            continue;
        }
        if seen.insert(needle) {
            found.push(kw.clone());
        }
    }
    found
}

/// Fixed-priority classification over the combined text surface; first hit
/// wins, "Otros" when nothing matches.
pub fn classify_contract_type(haystack: &str) -> ContractType {
    let lowered = haystack.to_lowercase();
    if lowered.contains("servicios") {
        ContractType::Servicios
    } else if lowered.contains("suministros") {
        ContractType::Suministros
    } else if lowered.contains("obras") {
        ContractType::Obras
    } else {
        ContractType::Otros
    }
}

use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// Transcription services report either ISO 639-1 (2-letter) or ISO 639-3
/// (3-letter) codes, sometimes with a region suffix ("zh-TW", "pt_BR"). These
/// helpers reduce such codes to a canonical form and classify the script family
/// that drives subtitle layout.

/// ISO 639-2/B codes that differ from their 639-2/T counterpart
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// 639-3 codes laid out with CJK conventions
const CJK_CODES: &[&str] = &["zho", "cmn", "yue", "wuu", "jpn", "kor"];

/// Lowercased primary subtag of a language tag ("zh-TW" -> "zh")
pub fn normalize_language_code(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// True when no language was requested and the service should detect it
pub fn is_auto_detect(code: &str) -> bool {
    let code = normalize_language_code(code);
    code.is_empty() || code == "auto"
}

/// Resolve a code to its ISO 639-3 (639-2/T) form
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let primary = normalize_language_code(code);

    let language = match primary.len() {
        2 => Language::from_639_1(&primary),
        3 => {
            let part2t = BIBLIOGRAPHIC_CODES
                .iter()
                .find(|(bibliographic, _)| *bibliographic == primary)
                .map_or(primary.as_str(), |(_, terminologic)| terminologic);
            Language::from_639_3(part2t)
        }
        _ => None,
    };

    language
        .map(|lang| lang.to_639_3().to_string())
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Validate a user-supplied language option; "auto" and empty are accepted
pub fn validate_language_code(code: &str) -> Result<()> {
    if is_auto_detect(code) {
        return Ok(());
    }
    normalize_to_part2t(code).map(|_| ())
}

/// Whether text in this language is written without inter-word spaces (Chinese, Japanese, Korean)
pub fn is_cjk(code: &str) -> bool {
    normalize_to_part2t(code)
        .map(|part2t| CJK_CODES.contains(&part2t.as_str()))
        .unwrap_or(false)
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

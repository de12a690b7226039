/*!
 * Tests for language code handling
 */

use scribe2srt::language_utils::{is_auto_detect, is_cjk, normalize_to_part2t, validate_language_code};

#[test]
fn test_is_cjk_with_service_codes_should_classify_script() {
    for code in ["zh", "zh-TW", "cmn", "yue", "ja", "jpn", "ko", "KOR"] {
        assert!(is_cjk(code), "{code}");
    }
    for code in ["en", "eng", "fr", "de-DE", "auto", ""] {
        assert!(!is_cjk(code), "{code}");
    }
}

#[test]
fn test_normalize_to_part2t_with_region_should_use_primary_subtag() {
    assert_eq!(normalize_to_part2t("pt_BR").unwrap(), "por");
    assert_eq!(normalize_to_part2t("ger").unwrap(), "deu");
    assert!(normalize_to_part2t("zz").is_err());
}

#[test]
fn test_validate_language_code_should_accept_auto_and_known_codes() {
    assert!(is_auto_detect(" AUTO "));
    assert!(validate_language_code("auto").is_ok());
    assert!(validate_language_code("").is_ok());
    assert!(validate_language_code("es").is_ok());
    assert!(validate_language_code("klingon").is_err());
}

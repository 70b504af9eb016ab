//! Language table lookups backed by the engine's vocabulary

/// Whether the engine knows this language tag ("auto" is always accepted).
pub fn lang_is_known(lang: &str) -> bool {
    if lang == "auto" {
        return true;
    }
    (0..=whisper_rs::get_lang_max_id()).any(|id| whisper_rs::get_lang_str(id) == Some(lang))
}

/// Full language name for a detected language id, falling back to the short
/// code, then to English for ids outside the table.
pub fn lang_full_name(id: i32) -> &'static str {
    whisper_rs::get_lang_str_full(id)
        .or_else(|| whisper_rs::get_lang_str(id))
        .unwrap_or("english")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_languages_known() {
        assert!(lang_is_known("en"));
        assert!(lang_is_known("de"));
        assert!(lang_is_known("auto"));
    }

    #[test]
    fn test_unknown_language_rejected() {
        assert!(!lang_is_known("klingon"));
        assert!(!lang_is_known(""));
    }
}

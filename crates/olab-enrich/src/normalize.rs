use unicode_normalization::char::canonical_combining_class;
use unicode_normalization::UnicodeNormalization;

/// Case-fold and strip diacritics: NFKD, drop every non-starter (combining
/// class > 0), lowercase, trim.
///
/// Absent input folds to the empty string. The result is a fixed point:
/// `normalize_text(Some(&normalize_text(x))) == normalize_text(x)`.
pub fn normalize_text(text: Option<&str>) -> String {
    let Some(text) = text else {
        return String::new();
    };
    text.nfkd()
        .filter(|c| !is_combining(*c))
        .flat_map(char::to_lowercase)
        .filter(|c| !is_combining(*c))
        .collect::<String>()
        .trim()
        .to_string()
}

fn is_combining(c: char) -> bool {
    canonical_combining_class(c) != 0
}

/// Lower-cased `title + " " + description`, the text every pattern table runs against.
///
/// Accents are kept; the tables spell accented alternatives explicitly.
pub(crate) fn combined_text(title: Option<&str>, description: Option<&str>) -> String {
    format!(
        "{} {}",
        title.unwrap_or_default(),
        description.unwrap_or_default()
    )
    .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_accents_and_case() {
        assert_eq!(normalize_text(Some("  APARTADÓ ")), "apartado");
        assert_eq!(normalize_text(Some("Unibán S.A.")), "uniban s.a.");
        assert_eq!(normalize_text(Some("Niño")), "nino");
    }

    #[test]
    fn absent_input_is_empty() {
        assert_eq!(normalize_text(None), "");
        assert_eq!(normalize_text(Some("")), "");
    }

    #[test]
    fn compatibility_forms_fold() {
        assert_eq!(normalize_text(Some("ＢＡＮＡＮＯ")), "banano");
    }

    #[test]
    fn combined_text_keeps_accents() {
        assert_eq!(combined_text(Some("Médico"), None), "médico ");
        assert_eq!(combined_text(None, None), " ");
    }
}

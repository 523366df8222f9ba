use crate::normalize::normalize_text;

// Keys are normalized names. `None` marks regional names that cover several
// municipalities and must not resolve to one code.
const DANE_CODES: &[(&str, Option<&str>)] = &[
    ("apartado", Some("05045")),
    ("turbo", Some("05837")),
    ("carepa", Some("05147")),
    ("chigorodo", Some("05172")),
    ("necocli", Some("05490")),
    ("arboletes", Some("05051")),
    ("san pedro de uraba", Some("05665")),
    ("san pedro", Some("05665")),
    ("san juan de uraba", Some("05659")),
    ("san juan", Some("05659")),
    ("mutata", Some("05480")),
    ("murindo", Some("05475")),
    ("vigia del fuerte", Some("05873")),
    ("vigia", Some("05873")),
    ("uraba", None),
];

/// DANE code for a municipality name, ignoring case, accents and surrounding
/// whitespace. Unknown and regional names resolve to `None`.
pub fn dane_code(municipality: Option<&str>) -> Option<&'static str> {
    let key = normalize_text(municipality);
    if key.is_empty() {
        return None;
    }
    DANE_CODES
        .iter()
        .find(|(name, _)| *name == key)
        .and_then(|(_, code)| *code)
}

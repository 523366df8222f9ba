use std::collections::HashSet;

use olab_enrich::{classify_sector, compute_dedup_hash, extract_skills, normalize_text};
use proptest::prelude::*;
use proptest::test_runner::Config;

const VOCABULARY: &[&str] = &[
    "excel", "Excel", "banano", "plátano", "cosecha", "liderazgo", "ventas", "SAP",
    "comunicación", "comunicacion", "estiba", "hotelería", "operario", "y", "de",
];

proptest! {
    #![proptest_config(Config::with_cases(256))]

    #[test]
    fn normalization_is_idempotent(text in "[\\p{Latin}\\p{Greek} 0-9.,/-]{0,40}") {
        let once = normalize_text(Some(&text));
        prop_assert_eq!(normalize_text(Some(&once)), once);
    }

    #[test]
    fn hash_ignores_upper_casing(
        title in "[a-záéíóúñ ]{1,24}",
        company in "[a-záéíóúñ ]{0,16}",
        municipality in "[a-záéíóúñ ]{0,16}",
    ) {
        prop_assert_eq!(
            compute_dedup_hash(&title, Some(&company), Some(&municipality)),
            compute_dedup_hash(
                &title.to_uppercase(),
                Some(&company.to_uppercase()),
                Some(&municipality.to_uppercase()),
            )
        );
    }

    #[test]
    fn hash_ignores_accents(title in "[a-z]{1,12}") {
        let accented: String = title
            .chars()
            .map(|c| match c {
                'a' => 'á',
                'e' => 'é',
                'o' => 'ó',
                other => other,
            })
            .collect();
        prop_assert_eq!(
            compute_dedup_hash(&title, None, Some("Apartado")),
            compute_dedup_hash(&accented, None, Some("Apartadó"))
        );
    }

    #[test]
    fn extracted_skills_are_unique(
        words in proptest::collection::vec(proptest::sample::select(VOCABULARY), 0..30)
    ) {
        let text = words.join(" ");
        let skills = extract_skills(Some(&text), Some(&text));
        let unique: HashSet<&String> = skills.iter().collect();
        prop_assert_eq!(unique.len(), skills.len());
    }

    #[test]
    fn sector_is_always_assigned(title in "\\PC{0,30}", description in "\\PC{0,60}") {
        let sector = classify_sector(Some(&title), Some(&description));
        prop_assert!(!sector.as_str().is_empty());
    }
}

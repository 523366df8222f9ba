use std::sync::LazyLock;

use olab_core::Sector;

use crate::normalize::combined_text;
use crate::rules::{compile_rules, first_match, Rule};

// Row order is precedence: an ambiguous posting takes the first sector that fires.
const SECTOR_TABLE: &[(&str, Sector)] = &[
    (
        r"\bagrícol|\bagricol|\bbanano|\bplátano|\bcultivo|\bagrono|\bfinca\b",
        Sector::Agroindustria,
    ),
    (
        r"\bsalud|\benferm|\bmédic|\bhospital|\bIPS\b|\bEPS\b|\bfarmac",
        Sector::Salud,
    ),
    (
        r"\beduca|\bdocente|\bprofesor|\bcolegio|\binstruct",
        Sector::Educacion,
    ),
    (
        r"\bcontabl|\bcontador|\bfinanci|\baudit|\btribut|\bimpuest",
        Sector::ContabilidadFinanzas,
    ),
    (
        r"\bvend|\bcomercial|\btienda|\bmercad|\bTAT\b",
        Sector::ComercioVentas,
    ),
    (
        r"\bconstrucc|\bobra|\bingenier.*civil|\bmaestro.*obra|\barquitect",
        Sector::Construccion,
    ),
    (
        r"\btecnolog|\bsistema|\bdesarroll|\bsoftware|\bIT\b|\bprogramad",
        Sector::Tecnologia,
    ),
    (
        r"\btransport|\blogíst|\bconductor|\bchof",
        Sector::TransporteLogistica,
    ),
    (
        r"\bseguridad|\bvigilant|\bcustodia|\bguarda",
        Sector::Seguridad,
    ),
    (
        r"\bturism|\bhotel|\brestaurant|\bcocin|\bchef\b|\bmesero",
        Sector::TurismoGastronomia,
    ),
    (
        r"\badministrativ|\bsecretari|\brecepcion|\basistente.*admin",
        Sector::Administrativo,
    ),
    (r"\bderecho|\bjuríd|\babogad|\blegal", Sector::Juridico),
    (
        r"\brecursos humanos|\btalento humano|\bRRHH\b|\bnómin",
        Sector::RecursosHumanos,
    ),
    (
        r"\bmantenimiento|\bmecánic|\belectric|\btécnic",
        Sector::Mantenimiento,
    ),
];

static SECTOR_RULES: LazyLock<Vec<Rule<Sector>>> = LazyLock::new(|| compile_rules(SECTOR_TABLE));

/// Sector of the first matching rule, or `Sector::Otro`.
pub fn classify_sector(title: Option<&str>, description: Option<&str>) -> Sector {
    let text = combined_text(title, description);
    first_match(&SECTOR_RULES, &text).unwrap_or(Sector::Otro)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_common_titles() {
        let cases = [
            ("Operario agrícola", "Finca bananera", Sector::Agroindustria),
            ("Enfermera", "Hospital regional", Sector::Salud),
            ("Desarrollador", "Software Python", Sector::Tecnologia),
            ("Docente de matemáticas", "Colegio", Sector::Educacion),
            ("Abogado", "Firma de litigio", Sector::Juridico),
        ];
        for (title, description, expected) in cases {
            assert_eq!(classify_sector(Some(title), Some(description)), expected, "{title}");
        }
    }

    #[test]
    fn falls_back_to_otro() {
        assert_eq!(
            classify_sector(Some("Cargo genérico"), Some("Descripción vaga")),
            Sector::Otro
        );
        assert_eq!(classify_sector(None, None), Sector::Otro);
    }

    #[test]
    fn earlier_rows_win_ambiguous_postings() {
        // Matches both Agroindustria and Administrativo; the agro row comes first.
        assert_eq!(
            classify_sector(Some("Asistente administrativa"), Some("Finca de banano")),
            Sector::Agroindustria
        );
        // Salud outranks Mantenimiento for a technician in a hospital.
        assert_eq!(
            classify_sector(Some("Técnico de mantenimiento"), Some("Hospital")),
            Sector::Salud
        );
    }

    #[test]
    fn uppercase_acronyms_match_lowered_text() {
        assert_eq!(classify_sector(Some("Auxiliar IPS"), None), Sector::Salud);
    }
}

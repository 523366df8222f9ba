//! Experience, contract, education and modality cascades.
//!
//! Each dimension is its own first-match table. Unlike sectors there is no
//! catch-all: a dimension with no matching row stays `None`.

use std::sync::LazyLock;

use olab_core::{ContractType, EducationLevel, ExperienceLevel, Modality};
use serde::{Deserialize, Serialize};

use crate::normalize::combined_text;
use crate::rules::{compile_rules, first_match, Rule};

const EXPERIENCE_TABLE: &[(&str, ExperienceLevel)] = &[
    (
        r"sin\s+experiencia|no\s+requiere\s+experiencia|primera\s+vez",
        ExperienceLevel::NoExperience,
    ),
    (
        r"1\s*a[nñ]o|12\s*meses|un\s*\(?\d?\)?\s*a[nñ]o",
        ExperienceLevel::OneYear,
    ),
    (r"2\s*a[nñ]os?|24\s*meses", ExperienceLevel::TwoYears),
    (r"3\s*a[nñ]os?|36\s*meses", ExperienceLevel::ThreeYears),
    (r"[45]\s*a[nñ]os?", ExperienceLevel::FourToFiveYears),
    (
        r"[6-9]\s*a[nñ]os?|\d{2,}\s*a[nñ]os?|m[aá]s\s+de\s+5",
        ExperienceLevel::MoreThanFiveYears,
    ),
];

const CONTRACT_TABLE: &[(&str, ContractType)] = &[
    (r"indefinido|fijo\s+indefinido|planta", ContractType::Indefinido),
    (r"fijo|t[eé]rmino\s+fijo|temporal", ContractType::Fijo),
    (
        r"prestaci[oó]n\s+de\s+servicios|contratista|independiente|freelance",
        ContractType::PrestacionServicios,
    ),
    (r"obra\s+o?\s*labor|obra\s+civil|por\s+obra", ContractType::ObraLabor),
    (
        r"aprendiz|sena|practicante|pr[aá]ctica",
        ContractType::Aprendizaje,
    ),
];

const EDUCATION_TABLE: &[(&str, EducationLevel)] = &[
    (r"bachiller|secundaria|11[°º]", EducationLevel::Bachiller),
    (r"t[eé]cnic[oa]", EducationLevel::Tecnico),
    (r"tecn[oó]log[oa]", EducationLevel::Tecnologo),
    (
        r"profesional|universitari[oa]|ingenier[oa]|abogad[oa]|licenciad[oa]",
        EducationLevel::Profesional,
    ),
    (
        r"especializaci[oó]n|especialista|postgrado|posgrado",
        EducationLevel::Especializacion,
    ),
    (r"maestr[ií]a|magister|m[aá]ster", EducationLevel::Maestria),
];

const MODALITY_TABLE: &[(&str, Modality)] = &[
    (
        r"remoto|teletrabajo|home\s*office|desde\s+casa|virtual",
        Modality::Remoto,
    ),
    (r"h[ií]brido|mixto|alterno", Modality::Hibrido),
    (r"presencial|en\s+sitio|campo|planta", Modality::Presencial),
];

static EXPERIENCE_RULES: LazyLock<Vec<Rule<ExperienceLevel>>> =
    LazyLock::new(|| compile_rules(EXPERIENCE_TABLE));
static CONTRACT_RULES: LazyLock<Vec<Rule<ContractType>>> =
    LazyLock::new(|| compile_rules(CONTRACT_TABLE));
static EDUCATION_RULES: LazyLock<Vec<Rule<EducationLevel>>> =
    LazyLock::new(|| compile_rules(EDUCATION_TABLE));
static MODALITY_RULES: LazyLock<Vec<Rule<Modality>>> =
    LazyLock::new(|| compile_rules(MODALITY_TABLE));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingAttributes {
    pub experience_level: Option<ExperienceLevel>,
    pub contract_type: Option<ContractType>,
    pub education_level: Option<EducationLevel>,
    pub modality: Option<Modality>,
}

pub fn extract_attributes(title: Option<&str>, description: Option<&str>) -> PostingAttributes {
    let text = combined_text(title, description);
    PostingAttributes {
        experience_level: first_match(&EXPERIENCE_RULES, &text),
        contract_type: first_match(&CONTRACT_RULES, &text),
        education_level: first_match(&EDUCATION_RULES, &text),
        modality: first_match(&MODALITY_RULES, &text),
    }
}

//! Core record types and closed label sets for the labor observatory.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CRATE_NAME: &str = "olab-core";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} label: {label:?}")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub label: String,
}

/// Declares a closed label set: an enum whose serialized form, `Display`
/// and `FromStr` all use the published label text.
macro_rules! label_set {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownLabel;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    _ => Err(UnknownLabel {
                        kind: $kind,
                        label: s.to_string(),
                    }),
                }
            }
        }
    };
}

label_set! {
    /// Economic sector of a posting. `Otro` is the catch-all when no sector rule fires.
    Sector, "sector" {
        Agroindustria => "Agroindustria",
        Salud => "Salud",
        Educacion => "Educación",
        ContabilidadFinanzas => "Contabilidad y Finanzas",
        ComercioVentas => "Comercio y Ventas",
        Construccion => "Construcción",
        Tecnologia => "Tecnología",
        TransporteLogistica => "Transporte y Logística",
        Seguridad => "Seguridad",
        TurismoGastronomia => "Turismo y Gastronomía",
        Administrativo => "Administrativo",
        Juridico => "Jurídico",
        RecursosHumanos => "Recursos Humanos",
        Mantenimiento => "Mantenimiento",
        Otro => "Otro",
    }
}

label_set! {
    ExperienceLevel, "experience level" {
        NoExperience => "Sin experiencia",
        OneYear => "1 ano",
        TwoYears => "2 anos",
        ThreeYears => "3 anos",
        FourToFiveYears => "4-5 anos",
        MoreThanFiveYears => "5+ anos",
    }
}

label_set! {
    ContractType, "contract type" {
        Indefinido => "Indefinido",
        Fijo => "Fijo",
        PrestacionServicios => "Prestacion de servicios",
        ObraLabor => "Obra o labor",
        Aprendizaje => "Aprendizaje",
    }
}

label_set! {
    EducationLevel, "education level" {
        Bachiller => "Bachiller",
        Tecnico => "Tecnico",
        Tecnologo => "Tecnologo",
        Profesional => "Profesional",
        Especializacion => "Especializacion",
        Maestria => "Maestria",
    }
}

label_set! {
    Modality, "modality" {
        Remoto => "Remoto",
        Hibrido => "Hibrido",
        Presencial => "Presencial",
    }
}

/// One scrape event of a vacancy from one source. The same real-world vacancy
/// seen on two portals yields two `JobPosting`s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub description: Option<String>,
    pub company: Option<String>,
    pub municipality: String,
    pub salary_text: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub source: String,
    pub link: Option<String>,
    pub scraped_at: Option<NaiveDateTime>,
    pub raw_content_hash: String,
}

/// Posting plus everything derived from its text at ingestion time.
///
/// `salary_imputed` is the only field rewritten after ingestion, and only by
/// the imputation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedPosting {
    pub posting: JobPosting,
    pub skills: Vec<String>,
    pub sector: Sector,
    pub experience_level: Option<ExperienceLevel>,
    pub contract_type: Option<ContractType>,
    pub education_level: Option<EducationLevel>,
    pub modality: Option<Modality>,
    pub salary_numeric: Option<i64>,
    pub salary_imputed: Option<i64>,
    pub dedup_hash: String,
    pub dane_code: Option<String>,
}

impl EnrichedPosting {
    /// Real salary if present, otherwise the imputed estimate.
    pub fn effective_salary(&self) -> Option<i64> {
        self.salary_numeric.or(self.salary_imputed)
    }
}

/// A persisted posting with the sink's opaque row id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPosting {
    pub id: i64,
    pub enriched: EnrichedPosting,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_from_str() {
        for sector in Sector::ALL {
            assert_eq!(sector.as_str().parse::<Sector>().unwrap(), *sector);
        }
        assert_eq!("2 anos".parse::<ExperienceLevel>().unwrap(), ExperienceLevel::TwoYears);
        assert_eq!("Hibrido".parse::<Modality>().unwrap(), Modality::Hibrido);
    }

    #[test]
    fn unknown_label_is_reported_with_kind() {
        let err = "Minería".parse::<Sector>().unwrap_err();
        assert_eq!(err.kind, "sector");
        assert_eq!(err.to_string(), "unknown sector label: \"Minería\"");
    }

    #[test]
    fn serde_uses_published_labels() {
        let json = serde_json::to_string(&Sector::TurismoGastronomia).unwrap();
        assert_eq!(json, "\"Turismo y Gastronomía\"");
        let level: EducationLevel = serde_json::from_str("\"Especializacion\"").unwrap();
        assert_eq!(level, EducationLevel::Especializacion);
    }
}

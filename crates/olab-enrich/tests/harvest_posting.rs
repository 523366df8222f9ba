use olab_core::{ContractType, ExperienceLevel, JobPosting, Modality, Sector};
use olab_enrich::{categorize_skills, enrich_posting, SkillCategory};

fn harvest_posting() -> JobPosting {
    JobPosting {
        title: "Operario de cosecha".to_string(),
        description: Some(
            "Se requiere experiencia en cultivo de banano, 2 años de experiencia, contrato indefinido, trabajo presencial"
                .to_string(),
        ),
        company: None,
        municipality: "Apartadó".to_string(),
        salary_text: Some("1.300.000".to_string()),
        publication_date: None,
        source: "computrabajo".to_string(),
        link: None,
        scraped_at: None,
        raw_content_hash: "c0ffee".to_string(),
    }
}

#[test]
fn harvest_posting_is_fully_enriched() {
    let enriched = enrich_posting(harvest_posting());

    assert!(enriched.skills.contains(&"Cultivo banano/plátano".to_string()));
    assert!(enriched.skills.contains(&"Cosecha".to_string()));
    assert_eq!(enriched.sector, Sector::Agroindustria);
    assert_eq!(enriched.experience_level, Some(ExperienceLevel::TwoYears));
    assert_eq!(enriched.contract_type, Some(ContractType::Indefinido));
    assert_eq!(enriched.education_level, None);
    assert_eq!(enriched.modality, Some(Modality::Presencial));
    assert_eq!(enriched.salary_numeric, Some(1_300_000));
    assert_eq!(enriched.salary_imputed, None);
    assert_eq!(enriched.dane_code.as_deref(), Some("05045"));
    assert_eq!(enriched.dedup_hash, "05c6a7917e9db5d1");
}

#[test]
fn harvest_skills_are_agroindustrial() {
    let enriched = enrich_posting(harvest_posting());
    let buckets = categorize_skills(&enriched.skills);
    let agro = &buckets[&SkillCategory::Agroindustrial];
    assert!(agro.contains(&"Cosecha".to_string()));
    assert!(agro.contains(&"Agricultura".to_string()));
}

#[test]
fn same_vacancy_from_two_portals_shares_a_hash() {
    let first = enrich_posting(harvest_posting());
    let mut other = harvest_posting();
    other.title = "OPERARIO DE COSECHA".to_string();
    other.municipality = "apartado".to_string();
    other.source = "elempleo".to_string();
    other.raw_content_hash = "beef".to_string();
    let second = enrich_posting(other);

    assert_eq!(first.dedup_hash, second.dedup_hash);
    assert_ne!(first.posting.raw_content_hash, second.posting.raw_content_hash);
}

#[test]
fn sparse_posting_degrades_to_empty_outputs() {
    let enriched = enrich_posting(JobPosting {
        title: String::new(),
        description: None,
        company: None,
        municipality: "Medellín".to_string(),
        salary_text: Some("A convenir".to_string()),
        publication_date: None,
        source: "magneto".to_string(),
        link: None,
        scraped_at: None,
        raw_content_hash: "x".to_string(),
    });

    assert!(enriched.skills.is_empty());
    assert_eq!(enriched.sector, Sector::Otro);
    assert_eq!(enriched.salary_numeric, None);
    assert_eq!(enriched.dane_code, None);
}

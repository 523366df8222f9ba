//! Skill extraction and skill categories.
//!
//! The table is exhaustive (every matching row contributes) but a label is
//! emitted once, at the position of its first matching row.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::normalize::combined_text;
use crate::rules::{compile_rules, Rule};

const SKILL_TABLE: &[(&str, &str)] = &[
    // office and software
    (r"\bexcel\b", "Excel"),
    (r"\bword\b", "Word"),
    (r"\bsap\b", "SAP"),
    (r"\bpython\b", "Python"),
    (r"\bsql\b", "SQL"),
    (r"\bingl[eé]s\b", "Inglés"),
    (r"\bcontabilidad\b", "Contabilidad"),
    (r"\bfacturaci[oó]n\b", "Facturación"),
    // soft skills and commerce
    (r"\batenci[oó]n al cliente\b", "Atención al cliente"),
    (r"\bservicio al cliente\b", "Servicio al cliente"),
    (r"\bventas\b", "Ventas"),
    (r"\bliderazgo\b", "Liderazgo"),
    (r"\btrabajo en equipo\b", "Trabajo en equipo"),
    (r"\bcomunicaci[oó]n\b", "Comunicación"),
    (r"\bnegociaci[oó]n\b", "Negociación"),
    (r"\bmanejo de personal\b", "Manejo de personal"),
    (r"\blogística\b|\blogistica\b", "Logística"),
    (r"\bpresupuesto\b", "Presupuesto"),
    (r"\bmarketing\b|\bmercadeo\b", "Marketing"),
    (r"\bredes sociales\b|\bsocial media\b", "Redes sociales"),
    (
        r"\blicencia\s+(de\s+)?conducci[oó]n\b|\blicencia\s+[bc]\d\b",
        "Licencia de conducción",
    ),
    (r"\bmoto\b", "Moto propia"),
    (r"\bsalud ocupacional\b|\bsst\b|\bseguridad y salud\b", "SST"),
    // agriculture and banana
    (r"\bagricultura\b|\bagrícola\b|\bagricola\b|\bcultivo\b", "Agricultura"),
    (r"\bbanano\b|\bplátano\b|\bplatano\b", "Cultivo banano/plátano"),
    (r"\bglobalg\.?a\.?p\.?\b|\brainforest\b", "Certificaciones agrícolas"),
    // health and education
    (r"\benfermería\b|\benfermeria\b|\benfermero\b", "Enfermería"),
    (r"\bmedicina\b|\bmédico\b|\bmedico\b", "Medicina"),
    (r"\bpedagog\b|\beducaci[oó]n\b|\bdocente\b|\bprofesor\b", "Educación"),
    // construction and trades
    (r"\bconstrucci[oó]n\b|\bobra\b|\bingeniería civil\b", "Construcción"),
    (r"\belectricidad\b|\beléctric\b|\belectric\b", "Electricidad"),
    (r"\bmecánic\b|\bmecanica\b", "Mecánica"),
    (r"\bsoldadura\b", "Soldadura"),
    // analytics and business software
    (r"\bpower\s*bi\b", "Power BI"),
    (r"\btableau\b", "Tableau"),
    (r"\berp\b", "ERP"),
    (r"\bcrm\b", "CRM"),
    (r"\bautocad\b|\bauto\s*cad\b", "AutoCAD"),
    (r"\bphotoshop\b|\billustrator\b|\bdise[nñ]o\b", "Diseno grafico"),
    (r"\bsiigo\b|\bworld\s*office\b|\bhelisa\b", "Software contable"),
    // administrative
    (r"\bplaneaci[oó]n\b|\bplanificaci[oó]n\b", "Planeacion"),
    (r"\bgesti[oó]n\b", "Gestion"),
    (r"\binventario\b", "Inventarios"),
    (r"\bcaja\b|\bmanejo.*efectivo\b", "Manejo de caja"),
    (r"\bcobranza\b|\bcartera\b", "Cobranza/Cartera"),
    (
        r"\bimportaci[oó]n\b|\bexportaci[oó]n\b|\bcomercio\s+exterior\b",
        "Comercio exterior",
    ),
    (r"\bcalidad\b|\biso\b|\bnormas?\b", "Gestion de calidad"),
    (r"\bprimeros\s+auxilios\b|\bbrigad\b", "Primeros auxilios"),
    // agro operations
    (r"\bfitosanitar\b|\bplagas?\b|\bfumig\b", "Fitosanidad"),
    (r"\bempaque\b|\bembalaje\b|\bempacad\b", "Empaque"),
    (r"\bcosecha\b|\brecolec\b|\bcorte\b.*\bbanano\b", "Cosecha"),
    (r"\briego\b|\bdrenaje\b|\bfertirriego\b", "Riego y drenaje"),
    (r"\bcertific\b.*\borganic\b|\bglobal\s*gap\b", "Certificacion organica"),
    // logistics
    (r"\bmontacarga\b", "Montacargas"),
    (r"\bveh[ií]culo\s+propio\b", "Vehiculo propio"),
    (r"\bcadena\s+de\s+fr[ií]o\b", "Cadena de frio"),
    // food safety
    (r"\bBPM\b|\bbuenas\s+pr[aá]cticas\b", "BPM"),
    (r"\bHACCP\b", "HACCP"),
    // port and river logistics
    (r"\baduanas?\b|\baduaner[oa]s?\b", "Aduanas"),
    (r"\bcontenedor(es)?\b", "Contenedores"),
    (r"\bestiba\b|\bestibador(es)?\b", "Estiba"),
    (r"\bportuari[oa]s?\b|\bmuelle\b", "Operación portuaria"),
    (r"\bfluvial\b", "Transporte fluvial"),
    (
        r"\bmaquinaria\s+pesada\b|\bretroexcavadora\b|\bmotoniveladora\b|\bbulldozer\b",
        "Maquinaria pesada",
    ),
    (r"\bnavier[oa]s?\b|\bmar[ií]tim[oa]s?\b", "Logística marítima"),
    // tourism and gastronomy
    (r"\bhoteler[ií]a\b|\bhoteler[oa]\b", "Hotelería"),
    (r"\bgu[ií]a\s+tur[ií]stic[oa]\b", "Guía turístico"),
    (r"\bcocina\b|\bculinari[oa]\b", "Cocina"),
    (r"\bmesero\b|\bbartender\b|\bbarista\b", "Mesa y bar"),
    // livestock and aquaculture
    (r"\bganader[ií]a\b|\bganader[oa]s?\b|\bbovin[oa]s?\b", "Ganadería"),
    (r"\bveterinari[oa]\b|\bzootecnia\b|\bzootecnista\b", "Veterinaria"),
    (r"\bpalma\b|\bpalmicultura\b", "Palma"),
    (r"\bacuicultura\b|\bpiscicultura\b|\bpisc[ií]cola\b", "Acuicultura"),
    (r"\bporcicultura\b|\bporcin[oa]s?\b|\bcerdos?\b", "Porcicultura"),
    (r"\borde[nñ]o\b", "Ordeño"),
];

static SKILL_RULES: LazyLock<Vec<Rule<&'static str>>> =
    LazyLock::new(|| compile_rules(SKILL_TABLE));

/// Skills mentioned in title + description, in table order, each label once.
pub fn extract_skills(title: Option<&str>, description: Option<&str>) -> Vec<String> {
    let text = combined_text(title, description);
    let mut seen = HashSet::new();
    let mut skills = Vec::new();
    for rule in SKILL_RULES.iter() {
        if !seen.contains(rule.label) && rule.pattern.is_match(&text) {
            seen.insert(rule.label);
            skills.push(rule.label.to_string());
        }
    }
    skills
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkillCategory {
    #[serde(rename = "Tecnológica")]
    Tecnologica,
    #[serde(rename = "Agroindustrial")]
    Agroindustrial,
    #[serde(rename = "Blanda")]
    Blanda,
    #[serde(rename = "Industrial")]
    Industrial,
    #[serde(rename = "Administrativa")]
    Administrativa,
    #[serde(rename = "Logística y Transporte")]
    LogisticaTransporte,
    #[serde(rename = "Turismo y Gastronomía")]
    TurismoGastronomia,
    /// Bucket for skills no category claims.
    #[serde(rename = "Otra")]
    Otra,
}

impl SkillCategory {
    /// The named categories, without the `Otra` bucket.
    pub const NAMED: &'static [SkillCategory] = &[
        SkillCategory::Tecnologica,
        SkillCategory::Agroindustrial,
        SkillCategory::Blanda,
        SkillCategory::Industrial,
        SkillCategory::Administrativa,
        SkillCategory::LogisticaTransporte,
        SkillCategory::TurismoGastronomia,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SkillCategory::Tecnologica => "Tecnológica",
            SkillCategory::Agroindustrial => "Agroindustrial",
            SkillCategory::Blanda => "Blanda",
            SkillCategory::Industrial => "Industrial",
            SkillCategory::Administrativa => "Administrativa",
            SkillCategory::LogisticaTransporte => "Logística y Transporte",
            SkillCategory::TurismoGastronomia => "Turismo y Gastronomía",
            SkillCategory::Otra => "Otra",
        }
    }

    /// Skill labels that belong to this category. Empty for `Otra`.
    pub fn members(self) -> &'static [&'static str] {
        match self {
            SkillCategory::Tecnologica => &[
                "Excel",
                "Word",
                "SAP",
                "Python",
                "SQL",
                "Power BI",
                "Tableau",
                "ERP",
                "CRM",
                "AutoCAD",
                "Diseno grafico",
                "Software contable",
                "Redes sociales",
            ],
            SkillCategory::Agroindustrial => &[
                "Agricultura",
                "Cultivo banano/plátano",
                "Certificaciones agrícolas",
                "Fitosanidad",
                "Empaque",
                "Cosecha",
                "Riego y drenaje",
                "Certificacion organica",
                "Ganadería",
                "Veterinaria",
                "Palma",
                "Acuicultura",
                "Porcicultura",
                "Ordeño",
            ],
            SkillCategory::Blanda => &[
                "Inglés",
                "Atención al cliente",
                "Servicio al cliente",
                "Liderazgo",
                "Trabajo en equipo",
                "Comunicación",
                "Negociación",
                "Manejo de personal",
            ],
            SkillCategory::Industrial => &[
                "Construcción",
                "Electricidad",
                "Mecánica",
                "Soldadura",
                "SST",
                "Gestion de calidad",
                "Primeros auxilios",
                "BPM",
                "HACCP",
                "Maquinaria pesada",
                "Montacargas",
            ],
            SkillCategory::Administrativa => &[
                "Contabilidad",
                "Facturación",
                "Ventas",
                "Presupuesto",
                "Marketing",
                "Planeacion",
                "Gestion",
                "Inventarios",
                "Manejo de caja",
                "Cobranza/Cartera",
                "Comercio exterior",
            ],
            SkillCategory::LogisticaTransporte => &[
                "Logística",
                "Licencia de conducción",
                "Moto propia",
                "Vehiculo propio",
                "Cadena de frio",
                "Aduanas",
                "Contenedores",
                "Estiba",
                "Operación portuaria",
                "Transporte fluvial",
                "Logística marítima",
            ],
            SkillCategory::TurismoGastronomia => &["Hotelería", "Guía turístico", "Cocina", "Mesa y bar"],
            SkillCategory::Otra => &[],
        }
    }

    /// Category of a single skill label; `Otra` when no named category lists it.
    pub fn of(skill: &str) -> SkillCategory {
        Self::NAMED
            .iter()
            .copied()
            .find(|category| category.members().contains(&skill))
            .unwrap_or(SkillCategory::Otra)
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket skills by category. Only non-empty buckets appear; input order is
/// kept inside each bucket and unknown labels land in `Otra`.
pub fn categorize_skills<S: AsRef<str>>(skills: &[S]) -> BTreeMap<SkillCategory, Vec<String>> {
    let mut buckets: BTreeMap<SkillCategory, Vec<String>> = BTreeMap::new();
    for skill in skills {
        let skill = skill.as_ref();
        buckets
            .entry(SkillCategory::of(skill))
            .or_default()
            .push(skill.to_string());
    }
    buckets
}

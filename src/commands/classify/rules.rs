use crate::model::PolymerTopology;

pub(crate) const SOLVENTS: &[&str] = &[
    "water",
    "methanol",
    "ethanol",
    "isopropanol",
    "acetone",
    "acetonitrile",
    "benzene",
    "toluene",
    "xylene",
    "hexane",
    "cyclohexane",
    "chloroform",
    "dichloromethane",
    "tetrahydrofuran",
    "thf",
    "1,4-dioxane",
    "dioxane",
    "diethyl ether",
    "ethyl acetate",
    "dimethylformamide",
    "n,n-dimethylformamide",
    "dmf",
    "dimethyl sulfoxide",
    "dmso",
    "n-methyl-2-pyrrolidone",
    "nmp",
];

pub(crate) const COPOLYMER_INDICATORS: &[&str] = &[
    "-co-",
    "-b-",
    "-g-",
    "-alt-",
    "-ran-",
    "-stat-",
    "-block-",
    "-graft-",
    "copolymer",
];

/// Role keywords in priority order; the first substring hit wins.
pub(crate) const MATERIAL_ROLES: &[&str] = &[
    "plasticizer",
    "crosslinker",
    "cross-linker",
    "compatibilizer",
    "initiator",
    "catalyst",
    "filler",
    "additive",
    "nanoparticle",
    "fiber",
    "matrix",
    "blend",
    "composite",
    "solvent",
];

/// Case-folded form of one material name; every topology rule reads it.
#[derive(Debug, Clone)]
pub(crate) struct NameForms {
    pub(crate) lower: String,
}

impl NameForms {
    pub(crate) fn new(raw: &str) -> Self {
        Self {
            lower: raw.to_lowercase(),
        }
    }
}

pub(crate) struct TopologyRule {
    pub(crate) label: &'static str,
    pub(crate) topology: PolymerTopology,
    pub(crate) applies: fn(&NameForms) -> bool,
}

/// Evaluated in order; names matching no rule are homopolymers.
pub(crate) const TOPOLOGY_RULES: &[TopologyRule] = &[
    TopologyRule {
        label: "star",
        topology: PolymerTopology::StarPolymer,
        applies: mentions_star,
    },
    TopologyRule {
        label: "repeated-poly",
        topology: PolymerTopology::Copolymer,
        applies: repeats_poly,
    },
    TopologyRule {
        label: "copolymer-indicator",
        topology: PolymerTopology::Copolymer,
        applies: has_copolymer_indicator,
    },
    TopologyRule {
        label: "hyphenated-acronyms",
        topology: PolymerTopology::Copolymer,
        applies: is_hyphenated_acronym,
    },
];

fn mentions_star(name: &NameForms) -> bool {
    name.lower.contains("star")
}

fn repeats_poly(name: &NameForms) -> bool {
    name.lower.matches("poly").count() > 1
}

fn has_copolymer_indicator(name: &NameForms) -> bool {
    COPOLYMER_INDICATORS
        .iter()
        .any(|indicator| name.lower.contains(indicator))
}

/// Hyphenated names that case folding leaves unchanged. Rules see the
/// lower-cased name, so only names without cased letters qualify.
fn is_hyphenated_acronym(name: &NameForms) -> bool {
    name.lower.contains('-') && name.lower.to_uppercase() == name.lower
}

pub(crate) fn detect_topology(raw: &str) -> (PolymerTopology, Option<&'static str>) {
    let name = NameForms::new(raw);
    TOPOLOGY_RULES
        .iter()
        .find(|rule| (rule.applies)(&name))
        .map_or((PolymerTopology::Homopolymer, None), |rule| {
            (rule.topology, Some(rule.label))
        })
}

pub(crate) fn is_solvent(raw: &str) -> bool {
    let lower = raw.trim().to_lowercase();
    SOLVENTS.contains(&lower.as_str())
}

pub(crate) fn detect_role(raw: &str) -> Option<&'static str> {
    let lower = raw.to_lowercase();
    MATERIAL_ROLES
        .iter()
        .copied()
        .find(|role| lower.contains(role))
}

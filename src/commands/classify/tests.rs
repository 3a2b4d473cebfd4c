use std::io::Write;

use super::classifier::{KnownPolymer, MaterialClassifier};
use super::matcher::{FuzzyMatcher, StrsimMatcher};
use super::rules::*;
use crate::model::{MaterialClass, PolymerTopology};

fn known(polymer: &str, normalized_name: &str) -> KnownPolymer {
    KnownPolymer {
        polymer: polymer.to_string(),
        normalized_name: normalized_name.to_string(),
    }
}

fn classifier(score_cutoff: f64) -> MaterialClassifier {
    MaterialClassifier::new(
        vec![
            known("polystyrene", "PS"),
            known("poly(styrene-co-butadiene)", "SBR"),
            known("star-PLA", "PLA"),
            known("PS-PMMA", ""),
            known("poly(methyl methacrylate)", "PMMA"),
        ],
        StrsimMatcher::new().unwrap(),
        score_cutoff,
    )
}

#[test]
fn exact_polymer_name_is_a_homopolymer() {
    let mention = classifier(90.0).classify("Polystyrene");

    assert_eq!(mention.entity_name, "polystyrene");
    assert_eq!(mention.material_class, Some(MaterialClass::Polymer));
    assert_eq!(mention.normalized_material_name.as_deref(), Some("PS"));
    assert_eq!(mention.polymer_type, Some(PolymerTopology::Homopolymer));
    assert_eq!(mention.role, None);
}

#[test]
fn copolymer_indicator_marks_copolymer() {
    let mention = classifier(90.0).classify("poly(styrene-co-butadiene)");
    assert_eq!(mention.material_class, Some(MaterialClass::Polymer));
    assert_eq!(mention.polymer_type, Some(PolymerTopology::Copolymer));
}

#[test]
fn star_takes_priority_over_copolymer_cues() {
    let mention = classifier(90.0).classify("star-PLA");
    assert_eq!(mention.polymer_type, Some(PolymerTopology::StarPolymer));
    assert_eq!(
        detect_topology("star-poly(styrene-b-isoprene)"),
        (PolymerTopology::StarPolymer, Some("star"))
    );
}

#[test]
fn upper_case_acronym_is_judged_on_its_lower_cased_form() {
    let mention = classifier(90.0).classify("PS-PMMA");
    assert_eq!(mention.material_class, Some(MaterialClass::Polymer));
    assert_eq!(mention.polymer_type, Some(PolymerTopology::Homopolymer));
    assert_eq!(mention.normalized_material_name, None);
}

#[test]
fn topology_rules_apply_in_order() {
    assert_eq!(
        detect_topology("polystyrene-block-polyisoprene"),
        (PolymerTopology::Copolymer, Some("repeated-poly"))
    );
    assert_eq!(
        detect_topology("PEO-g-PS"),
        (PolymerTopology::Copolymer, Some("copolymer-indicator"))
    );
    assert_eq!(detect_topology("PS-PMMA"), (PolymerTopology::Homopolymer, None));
    assert_eq!(detect_topology("ps-pmma"), (PolymerTopology::Homopolymer, None));
    assert_eq!(
        detect_topology("12-34"),
        (PolymerTopology::Copolymer, Some("hyphenated-acronyms"))
    );
    assert_eq!(detect_topology("1234"), (PolymerTopology::Homopolymer, None));
}

#[test]
fn near_miss_spelling_matches_above_cutoff_only() {
    let mention = classifier(90.0).classify("polystyrenes");
    assert_eq!(mention.entity_name, "polystyrene");
    assert_eq!(mention.material_class, Some(MaterialClass::Polymer));

    let strict = classifier(100.0).classify("polystyrenes");
    assert_eq!(strict.entity_name, "polystyrenes");
    assert_eq!(strict.material_class, None);
    assert_eq!(strict.polymer_type, None);
}

#[test]
fn solvents_are_matched_case_insensitively() {
    let mention = classifier(90.0).classify("Toluene");
    assert_eq!(mention.entity_name, "Toluene");
    assert_eq!(mention.material_class, Some(MaterialClass::Solvent));
    assert_eq!(mention.polymer_type, None);
    assert!(is_solvent("  DMF "));
}

#[test]
fn unknown_material_keeps_raw_name_and_role() {
    let mention = classifier(90.0).classify("glycerol plasticizer");
    assert_eq!(mention.entity_name, "glycerol plasticizer");
    assert_eq!(mention.material_class, None);
    assert_eq!(mention.role.as_deref(), Some("plasticizer"));
}

#[test]
fn first_role_keyword_wins() {
    assert_eq!(detect_role("silica filler in epoxy matrix"), Some("filler"));
    assert_eq!(detect_role("Epoxy Matrix"), Some("matrix"));
    assert_eq!(detect_role("polystyrene"), None);
}

#[test]
fn strsim_matcher_breaks_ties_by_candidate_order() {
    let matcher = StrsimMatcher::new().unwrap();
    let candidates = vec!["abc".to_string(), "abd".to_string()];

    let hit = matcher.best_match("abx", &candidates, 0.0).unwrap();
    assert_eq!(hit.name, "abc");

    assert!(matcher.best_match("   ", &candidates, 0.0).is_none());
    assert!(matcher.best_match("zzz", &candidates, 50.0).is_none());
}

#[test]
fn strsim_matcher_collapses_whitespace() {
    let matcher = StrsimMatcher::new().unwrap();
    let candidates = vec!["poly(methyl methacrylate)".to_string()];

    let hit = matcher
        .best_match("Poly(methyl   methacrylate)\n", &candidates, 100.0)
        .unwrap();
    assert_eq!(hit.score, 100.0);
}

#[test]
fn namelist_is_read_from_jsonl() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, r#"{{"polymer": "polyethylene", "normalized_name": "PE"}}"#).unwrap();
    writeln!(file).unwrap();
    writeln!(file, r#"{{"polymer": "nylon 6"}}"#).unwrap();
    file.flush().unwrap();

    let classifier = MaterialClassifier::from_namelist(file.path(), 90.0).unwrap();
    assert_eq!(classifier.known_polymers(), 2);

    let mention = classifier.classify("Nylon 6");
    assert_eq!(mention.entity_name, "nylon 6");
    assert_eq!(mention.normalized_material_name, None);
}

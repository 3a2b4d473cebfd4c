use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use serde::Deserialize;
use tracing::debug;

use super::matcher::{FuzzyMatcher, StrsimMatcher};
use super::rules::{detect_role, detect_topology, is_solvent};
use crate::model::{MaterialClass, MaterialMention};
use crate::util::read_jsonl;

/// One line of the polymer name list.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct KnownPolymer {
    pub(crate) polymer: String,
    #[serde(default)]
    pub(crate) normalized_name: String,
}

pub(crate) struct MaterialClassifier<M = StrsimMatcher> {
    polymers: BTreeMap<String, KnownPolymer>,
    names: Vec<String>,
    matcher: M,
    score_cutoff: f64,
}

impl MaterialClassifier<StrsimMatcher> {
    pub(crate) fn from_namelist(path: &Path, score_cutoff: f64) -> Result<Self> {
        let entries: Vec<KnownPolymer> = read_jsonl(path)?;
        Ok(Self::new(entries, StrsimMatcher::new()?, score_cutoff))
    }
}

impl<M: FuzzyMatcher> MaterialClassifier<M> {
    /// Later duplicates of a polymer name replace earlier ones.
    pub(crate) fn new(entries: Vec<KnownPolymer>, matcher: M, score_cutoff: f64) -> Self {
        let polymers: BTreeMap<String, KnownPolymer> = entries
            .into_iter()
            .map(|entry| (entry.polymer.clone(), entry))
            .collect();
        let names = polymers.keys().cloned().collect();

        Self {
            polymers,
            names,
            matcher,
            score_cutoff,
        }
    }

    pub(crate) fn known_polymers(&self) -> usize {
        self.polymers.len()
    }

    pub(crate) fn classify(&self, raw: &str) -> MaterialMention {
        let mut mention = MaterialMention {
            entity_name: raw.to_string(),
            ..MaterialMention::default()
        };

        if let Some(hit) = self.matcher.best_match(raw, &self.names, self.score_cutoff) {
            let (topology, rule) = detect_topology(raw);
            debug!(
                material = raw,
                polymer = hit.name,
                score = hit.score,
                topology_rule = rule.unwrap_or("none"),
                "known polymer"
            );

            mention.entity_name = hit.name.to_string();
            mention.material_class = Some(MaterialClass::Polymer);
            mention.normalized_material_name = self
                .polymers
                .get(hit.name)
                .map(|entry| entry.normalized_name.clone())
                .filter(|name| !name.is_empty());
            mention.polymer_type = Some(topology);
        } else if is_solvent(raw) {
            debug!(material = raw, "solvent");
            mention.material_class = Some(MaterialClass::Solvent);
        }

        mention.role = detect_role(raw).map(str::to_string);
        mention
    }
}

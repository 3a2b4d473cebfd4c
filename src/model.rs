use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::util::sha256_hex;

/// Reference data for one property, loaded once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyMetadata {
    pub name: String,
    #[serde(default)]
    pub other_names: Vec<String>,
    #[serde(default)]
    pub units: Vec<String>,
    pub lower_limit: f64,
    pub upper_limit: f64,
}

impl PropertyMetadata {
    pub fn aliases_lower(&self) -> Vec<String> {
        self.other_names
            .iter()
            .map(|name| name.to_lowercase())
            .collect()
    }

    pub fn units_lower(&self) -> Vec<String> {
        self.units.iter().map(|unit| unit.to_lowercase()).collect()
    }

    pub fn fingerprint(&self) -> Result<String> {
        let data = serde_json::to_vec(self)
            .with_context(|| format!("failed to serialize property metadata: {}", self.name))?;
        Ok(sha256_hex(&data))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionMethod {
    pub name: String,
    #[serde(default)]
    pub dataset: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub details: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct ParagraphRecord {
    pub id: i64,
    pub doc_id: String,
    pub text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExtractedProperty {
    pub id: i64,
    pub entity_name: Option<String>,
    pub numeric_value: Option<f64>,
    pub unit: Option<String>,
}

/// One tagged span from the NER model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub entity_group: String,
    pub word: String,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Rejected,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "passed" => Some(Self::Passed),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn from_pass(passed: bool) -> Self {
        if passed { Self::Passed } else { Self::Rejected }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaterialClass {
    Polymer,
    Solvent,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolymerTopology {
    Homopolymer,
    Copolymer,
    StarPolymer,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MaterialMention {
    pub entity_name: String,
    pub material_class: Option<MaterialClass>,
    pub normalized_material_name: Option<String>,
    pub polymer_type: Option<PolymerTopology>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Checkpoint {
    pub name: String,
    pub table_name: String,
    pub row: i64,
    pub comment: serde_json::Value,
    pub date_added: String,
}

/// Counters for a single scan. Owned by the run, never shared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub candidates: usize,
    pub processed: usize,
    pub passed: usize,
    pub rejected: usize,
    pub skipped: usize,
    pub already_decided: usize,
    pub recorded: usize,
    pub commits: usize,
}

impl RunStats {
    pub fn count(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Passed => self.passed += 1,
            Outcome::Rejected => self.rejected += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummaryManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub kind: String,
    pub filter_name: String,
    pub property: String,
    pub started_at: String,
    pub finished_at: String,
    pub checkpoint_before: i64,
    pub checkpoint_after: i64,
    pub debug_count: usize,
    pub documents_with_hits: Option<usize>,
    pub stats: RunStats,
}

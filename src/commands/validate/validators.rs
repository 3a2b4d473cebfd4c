use crate::cli::ValidatorKind;
use crate::error::PipelineError;
use crate::model::{ExtractedProperty, Outcome, PropertyMetadata};

pub(crate) const EXTRACTED_PROPERTIES_TABLE: &str = "extracted_properties";

impl ValidatorKind {
    pub(crate) fn filter_name(self) -> &'static str {
        match self {
            Self::Name => "invalid_property_name",
            Self::Range => "out_of_range",
            Self::Unit => "invalid_property_unit",
            Self::NerName => "valid_property_name",
        }
    }

    /// Outcome this validator exists to surface. The ner-name validator
    /// shares the name predicate but reports matches instead of misses.
    pub(crate) fn flagged_outcome(self) -> Outcome {
        match self {
            Self::Name | Self::Range | Self::Unit => Outcome::Rejected,
            Self::NerName => Outcome::Passed,
        }
    }
}

/// Per-row predicate for one validator, with the case-folded reference lists
/// computed once.
#[derive(Debug, Clone)]
pub(crate) struct PropertyValidator {
    kind: ValidatorKind,
    aliases_lower: Vec<String>,
    units_lower: Vec<String>,
    lower_limit: f64,
    upper_limit: f64,
}

impl PropertyValidator {
    pub(crate) fn new(kind: ValidatorKind, metadata: &PropertyMetadata) -> Self {
        Self {
            kind,
            aliases_lower: metadata.aliases_lower(),
            units_lower: metadata.units_lower(),
            lower_limit: metadata.lower_limit,
            upper_limit: metadata.upper_limit,
        }
    }

    pub(crate) fn kind(&self) -> ValidatorKind {
        self.kind
    }

    /// `Passed` when the row satisfies the check.
    pub(crate) fn check(&self, row: &ExtractedProperty) -> Result<Outcome, PipelineError> {
        let passed = match self.kind {
            ValidatorKind::Name | ValidatorKind::NerName => self.name_is_known(row)?,
            ValidatorKind::Range => self.value_in_range(row)?,
            ValidatorKind::Unit => self.unit_is_accepted(row),
        };
        Ok(Outcome::from_pass(passed))
    }

    fn name_is_known(&self, row: &ExtractedProperty) -> Result<bool, PipelineError> {
        let name = row
            .entity_name
            .as_deref()
            .ok_or(PipelineError::MissingEntityName(row.id))?
            .to_lowercase();
        Ok(self.aliases_lower.contains(&name))
    }

    fn value_in_range(&self, row: &ExtractedProperty) -> Result<bool, PipelineError> {
        let value = row
            .numeric_value
            .filter(|value| !value.is_nan())
            .ok_or(PipelineError::MalformedValue {
                id: row.id,
                value: row.numeric_value,
            })?;
        Ok(self.lower_limit <= value && value <= self.upper_limit)
    }

    /// A missing unit is read as the empty string, which only a unit-less
    /// property accepts.
    fn unit_is_accepted(&self, row: &ExtractedProperty) -> bool {
        let unit = row.unit.as_deref().unwrap_or_default().to_lowercase();
        self.units_lower.contains(&unit) || (unit.is_empty() && self.units_lower.is_empty())
    }
}

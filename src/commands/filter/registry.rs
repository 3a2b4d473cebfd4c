use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PropertyFilter {
    pub(crate) keyword_filter: &'static str,
    pub(crate) ner_filter: &'static str,
    pub(crate) property: &'static str,
}

pub(crate) const PROPERTY_FILTERS: &[PropertyFilter] = &[
    PropertyFilter {
        keyword_filter: "property_tg",
        ner_filter: "ner_tg",
        property: "glass transition temperature",
    },
    PropertyFilter {
        keyword_filter: "property_tm",
        ner_filter: "ner_tm",
        property: "melting temperature",
    },
    PropertyFilter {
        keyword_filter: "property_td",
        ner_filter: "ner_td",
        property: "thermal decomposition temperature",
    },
    PropertyFilter {
        keyword_filter: "property_thermal_conductivity",
        ner_filter: "ner_thermal_conductivity",
        property: "thermal conductivity",
    },
    PropertyFilter {
        keyword_filter: "property_bandgap",
        ner_filter: "ner_bandgap",
        property: "bandgap",
    },
    PropertyFilter {
        keyword_filter: "property_ts",
        ner_filter: "ner_ts",
        property: "tensile strength",
    },
    PropertyFilter {
        keyword_filter: "property_ym",
        ner_filter: "ner_ym",
        property: "youngs modulus",
    },
    PropertyFilter {
        keyword_filter: "property_eab",
        ner_filter: "ner_eab",
        property: "elongation at break",
    },
    PropertyFilter {
        keyword_filter: "property_cs",
        ner_filter: "ner_cs",
        property: "compressive strength",
    },
    PropertyFilter {
        keyword_filter: "property_is",
        ner_filter: "ner_is",
        property: "impact strength",
    },
    PropertyFilter {
        keyword_filter: "property_hardness",
        ner_filter: "ner_hardness",
        property: "hardness",
    },
    PropertyFilter {
        keyword_filter: "property_fs",
        ner_filter: "ner_fs",
        property: "flexural strength",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FilterStage {
    Keyword,
    Ner,
}

impl FilterStage {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Ner => "ner",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ResolvedFilter {
    pub(crate) stage: FilterStage,
    pub(crate) entry: &'static PropertyFilter,
}

impl ResolvedFilter {
    pub(crate) fn name(&self) -> &'static str {
        match self.stage {
            FilterStage::Keyword => self.entry.keyword_filter,
            FilterStage::Ner => self.entry.ner_filter,
        }
    }

    pub(crate) fn property(&self) -> &'static str {
        self.entry.property
    }

    /// Filter whose passes feed this one, if any.
    pub(crate) fn upstream(&self) -> Option<&'static str> {
        match self.stage {
            FilterStage::Keyword => None,
            FilterStage::Ner => Some(self.entry.keyword_filter),
        }
    }
}

pub(crate) fn resolve_filter(name: &str) -> Result<ResolvedFilter, PipelineError> {
    let name = name.trim();
    PROPERTY_FILTERS
        .iter()
        .find_map(|entry| {
            if entry.keyword_filter == name {
                Some(ResolvedFilter {
                    stage: FilterStage::Keyword,
                    entry,
                })
            } else if entry.ner_filter == name {
                Some(ResolvedFilter {
                    stage: FilterStage::Ner,
                    entry,
                })
            } else {
                None
            }
        })
        .ok_or_else(|| PipelineError::UnknownFilter(name.to_string()))
}

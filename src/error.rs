use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unknown filter name: {0}")]
    UnknownFilter(String),

    #[error("no property metadata found for {0:?}")]
    MissingProperty(String),

    #[error("extraction method {0} does not exist")]
    MissingMethod(i64),

    #[error("filter {0} needs an entity tagger (--tagger-cmd)")]
    MissingTagger(String),

    #[error("property {name:?} has lower limit {lower} above upper limit {upper}")]
    InvalidLimits { name: String, lower: f64, upper: f64 },

    #[error("row {0} has no text")]
    MissingText(i64),

    #[error("row {0} has no entity name")]
    MissingEntityName(i64),

    #[error("row {id} has malformed numeric value {value:?}")]
    MalformedValue { id: i64, value: Option<f64> },

    #[error("entity tagger failed: {0}")]
    TaggerFailed(String),
}

impl PipelineError {
    /// Row-level data problems are skipped; everything else aborts the run.
    pub fn is_row_error(&self) -> bool {
        matches!(
            self,
            Self::MissingText(_) | Self::MissingEntityName(_) | Self::MalformedValue { .. }
        )
    }
}

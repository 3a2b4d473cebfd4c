use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "propmine",
    version,
    about = "Incremental paragraph filters and property validators for material-property mining"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Init(InitArgs),
    Filter(FilterArgs),
    Validate(ValidateArgs),
    Classify(ClassifyArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InitArgs {
    #[arg(long, default_value = ".cache/propmine")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// JSON array of property metadata objects to upsert.
    #[arg(long)]
    pub properties_file: Option<PathBuf>,

    /// JSON array of extraction method objects to upsert.
    #[arg(long)]
    pub methods_file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    #[arg(long, default_value = ".cache/propmine")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Filter name, e.g. `property_tg` (keyword stage) or `ner_tg` (NER stage).
    #[arg(short = 'r', long)]
    pub filter: String,

    /// Restrict the keyword stage to paragraphs of a single document.
    #[arg(long)]
    pub doc_id: Option<String>,

    /// External NER tagger program, required by `ner_*` filters.
    #[arg(long)]
    pub tagger_cmd: Option<String>,

    #[arg(long = "tagger-arg")]
    pub tagger_args: Vec<String>,

    #[arg(long, default_value_t = 0)]
    pub debug_count: usize,

    #[arg(long, default_value_t = 50)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 100)]
    pub progress_every: usize,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ValidatorKind {
    Name,
    Range,
    Unit,
    NerName,
}

impl ValidatorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Range => "range",
            Self::Unit => "unit",
            Self::NerName => "ner-name",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(long, default_value = ".cache/propmine")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub validator: ValidatorKind,

    #[arg(long)]
    pub method_id: i64,

    /// Canonical property name as stored in `property_metadata`.
    #[arg(long)]
    pub property: String,

    #[arg(long, default_value_t = 0)]
    pub debug_count: usize,

    #[arg(long, default_value_t = 50)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 100)]
    pub progress_every: usize,
}

#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    /// JSONL file of known polymers (`{"polymer": ..., "normalized_name": ...}`).
    #[arg(long)]
    pub namelist: PathBuf,

    #[arg(long = "material", required = true)]
    pub materials: Vec<String>,

    #[arg(long, default_value_t = 90.0)]
    pub score_cutoff: f64,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/propmine")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

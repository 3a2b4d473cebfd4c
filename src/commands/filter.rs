//! Paragraph filter chain: a keyword stage over raw paragraphs followed by an
//! NER stage over the keyword survivors, both run per property.

mod keyword;
mod ner;
mod registry;
mod run;
mod tagger;

pub use run::run;

use keyword::*;
use ner::*;
use registry::*;
use tagger::*;

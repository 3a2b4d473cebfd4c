//! Property validator chain over `extracted_properties`.

mod run;
mod validators;

pub use run::run;

use validators::*;

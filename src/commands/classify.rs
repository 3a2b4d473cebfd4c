//! Material mention classification: known-polymer lookup, solvent vocabulary,
//! polymer topology and role tagging.

mod classifier;
mod matcher;
mod rules;
#[cfg(test)]
mod tests;

use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::ClassifyArgs;

use classifier::MaterialClassifier;

pub fn run(args: ClassifyArgs) -> Result<()> {
    let classifier = MaterialClassifier::from_namelist(&args.namelist, args.score_cutoff)?;
    info!(
        namelist = %args.namelist.display(),
        known_polymers = classifier.known_polymers(),
        score_cutoff = args.score_cutoff,
        "loaded polymer name list"
    );

    let mut output = io::BufWriter::new(io::stdout().lock());
    for material in &args.materials {
        let mention = classifier.classify(material);
        serde_json::to_writer(&mut output, &mention)
            .context("failed to serialize material mention")?;
        writeln!(output)?;
    }
    output.flush()?;

    Ok(())
}

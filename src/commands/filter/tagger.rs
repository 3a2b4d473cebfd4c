use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;

use tracing::trace;

use crate::error::PipelineError;
use crate::model::Entity;

/// Named-entity tagger used by the NER stage.
pub(crate) trait EntityTagger {
    fn tag(&mut self, text: &str) -> Result<Vec<Entity>, PipelineError>;
}

/// Runs an external tagger once per paragraph: the text goes to stdin, a JSON
/// array of `{"entity_group", "word"}` objects is expected on stdout.
#[derive(Debug, Clone)]
pub(crate) struct CommandTagger {
    program: String,
    args: Vec<String>,
}

impl CommandTagger {
    pub(crate) fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl EntityTagger for CommandTagger {
    fn tag(&mut self, text: &str) -> Result<Vec<Entity>, PipelineError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                PipelineError::TaggerFailed(format!("failed to execute {}: {err}", self.program))
            })?;

        // stdin is written while stdout and stderr drain; the child is reaped
        // whether or not the write succeeds.
        let stdin = child.stdin.take();
        let (written, output) = thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(text.as_bytes()),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            (writer.join(), output)
        });

        let output = output.map_err(|err| {
            PipelineError::TaggerFailed(format!("failed to wait for {}: {err}", self.program))
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::TaggerFailed(format!(
                "{} returned non-zero exit status: {}",
                self.program,
                stderr.trim()
            )));
        }

        match written {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                return Err(PipelineError::TaggerFailed(format!(
                    "failed to write to {}: {err}",
                    self.program
                )));
            }
            Err(_) => {
                return Err(PipelineError::TaggerFailed(format!(
                    "stdin writer for {} panicked",
                    self.program
                )));
            }
        }

        let entities = parse_entities(&output.stdout)?;
        trace!(program = %self.program, entities = entities.len(), "tagged paragraph");
        Ok(entities)
    }
}

pub(crate) fn parse_entities(raw: &[u8]) -> Result<Vec<Entity>, PipelineError> {
    serde_json::from_slice(raw)
        .map_err(|err| PipelineError::TaggerFailed(format!("invalid tagger output: {err}")))
}

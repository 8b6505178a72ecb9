use anyhow::{anyhow, Context, Result};
use std::process::Command;

/// Upper bound on dump invocations while waiting for a stable entry count.
///
/// A directory under continuous mutation would otherwise keep the reader
/// spinning forever.
pub const MAX_QUIESCENCE_ATTEMPTS: usize = 10;

/// A source that produces one full LDIF export per invocation.
///
/// Abstracted so the pipeline can be exercised against scripted exports in
/// tests without spawning real processes.
pub trait DumpSource {
    fn dump(&mut self) -> Result<String>;
}

/// Runs an external dump command (e.g. `/usr/sbin/slapcat`) through the shell
/// and captures its stdout as the export stream.
pub struct CommandDumpSource {
    command: String,
}

impl CommandDumpSource {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
        }
    }
}

impl DumpSource for CommandDumpSource {
    fn dump(&mut self) -> Result<String> {
        let output = Command::new("sh")
            .args(["-c", &self.command])
            .output()
            .with_context(|| format!("Failed to run dump command '{}'", self.command))?;

        if !output.status.success() {
            return Err(anyhow!(
                "Dump command '{}' exited with {}: {}",
                self.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Split an export stream into raw entry records.
///
/// Entries are separated by a blank line (two consecutive newlines). Runs of
/// extra blank lines produce empty fragments, which are dropped.
pub fn split_records(stream: &str) -> Vec<String> {
    stream
        .split("\n\n")
        .map(|record| record.trim_matches('\n'))
        .filter(|record| !record.trim().is_empty())
        .map(|record| record.to_string())
        .collect()
}

/// Read the export until two consecutive invocations agree on entry count.
///
/// A live directory may be mutated mid-dump; matching counts across two full
/// reads is a cheap heuristic that the snapshot is not torn. Execution
/// failures are never retried, only count instability is, and at most
/// [`MAX_QUIESCENCE_ATTEMPTS`] reads happen in total.
pub fn read_stable(source: &mut dyn DumpSource) -> Result<Vec<String>> {
    let mut previous_count = split_records(&source.dump()?).len();

    for attempt in 2..=MAX_QUIESCENCE_ATTEMPTS {
        let records = split_records(&source.dump()?);
        if records.len() == previous_count {
            log::debug!(
                "Export stabilized at {} entries after {attempt} reads",
                records.len()
            );
            return Ok(records);
        }
        log::info!(
            "Export entry count changed from {previous_count} to {} (read {attempt}); retrying",
            records.len()
        );
        previous_count = records.len();
    }

    Err(anyhow!(
        "Export entry count did not stabilize within {MAX_QUIESCENCE_ATTEMPTS} reads; \
         the source directory appears to be under continuous mutation"
    ))
}

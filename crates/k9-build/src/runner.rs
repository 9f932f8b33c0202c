//! Execution of tool invocations.
//!
//! [`SystemRunner`] spawns real processes. [`RecordingRunner`] only records
//! what would have run; it backs `--dry-run` and the tests.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, info};

use crate::error::{BuildError, Result};
use crate::invocation::ToolInvocation;

/// Runs tool invocations, failing on the first non-zero exit.
pub trait CommandRunner {
    fn run(&mut self, invocation: &ToolInvocation) -> Result<()>;
}

/// Runs invocations as child processes with inherited stdio.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, invocation: &ToolInvocation) -> Result<()> {
        info!("running {invocation}");
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(cwd) = &invocation.cwd {
            command.current_dir(cwd);
        }
        let status = command.status().map_err(|e| match e.kind() {
            ErrorKind::NotFound => BuildError::ToolMissing {
                tool: invocation.program.clone(),
            },
            _ => BuildError::Io(e),
        })?;
        if !status.success() {
            return Err(BuildError::ToolFailed {
                tool: invocation.program.clone(),
                status: status.code().unwrap_or(-1),
            });
        }
        Ok(())
    }
}

/// Records invocations without running them.
///
/// Optionally simulates tool behaviour: a program can be made to fail with a
/// given status, or to "produce" files when it runs.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    pub invocations: Vec<ToolInvocation>,
    failures: HashMap<String, i32>,
    outputs: HashMap<String, Vec<PathBuf>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every run of `program` exit with `status`.
    pub fn fail(mut self, program: &str, status: i32) -> Self {
        self.failures.insert(program.to_string(), status);
        self
    }

    /// Create `path` whenever `program` runs.
    pub fn produce(mut self, program: &str, path: impl Into<PathBuf>) -> Self {
        self.outputs
            .entry(program.to_string())
            .or_default()
            .push(path.into());
        self
    }

    /// Names of the programs run so far, in order.
    pub fn programs(&self) -> Vec<&str> {
        self.invocations.iter().map(|i| i.program.as_str()).collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&mut self, invocation: &ToolInvocation) -> Result<()> {
        debug!("recorded {invocation}");
        self.invocations.push(invocation.clone());
        if let Some(&status) = self.failures.get(&invocation.program) {
            return Err(BuildError::ToolFailed {
                tool: invocation.program.clone(),
                status,
            });
        }
        if let Some(paths) = self.outputs.get(&invocation.program) {
            for path in paths {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, invocation.program.as_bytes())?;
            }
        }
        Ok(())
    }
}

/// First line of `tool --version`-style output, or `None` if the tool
/// cannot be started.
pub fn probe_tool(tool: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(tool).args(args).output().ok()?;
    let text = if output.stdout.is_empty() {
        String::from_utf8_lossy(&output.stderr).into_owned()
    } else {
        String::from_utf8_lossy(&output.stdout).into_owned()
    };
    Some(
        text.lines()
            .next()
            .unwrap_or("(unknown version)")
            .trim()
            .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_runner_simulates_failures_and_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("gw/top.bit");
        let mut runner = RecordingRunner::new()
            .produce("vivado", &out)
            .fail("openFPGALoader", 2);

        runner.run(&ToolInvocation::new("vivado")).unwrap();
        assert!(out.exists());

        let err = runner.run(&ToolInvocation::new("openFPGALoader")).unwrap_err();
        assert!(matches!(err, BuildError::ToolFailed { status: 2, .. }));
        assert_eq!(runner.programs(), vec!["vivado", "openFPGALoader"]);
    }

    #[test]
    fn missing_tool() {
        let err = SystemRunner
            .run(&ToolInvocation::new("k9-definitely-not-a-real-tool"))
            .unwrap_err();
        assert!(matches!(err, BuildError::ToolMissing { .. }));
        assert!(probe_tool("k9-definitely-not-a-real-tool", &["--version"]).is_none());
    }
}

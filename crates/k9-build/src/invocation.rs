//! External tool invocations.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// One external command: program, arguments and working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory; `None` inherits the caller's.
    pub cwd: Option<PathBuf>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Whether any argument equals `arg`.
    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

fn quote(s: &str) -> String {
    if !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=+,@".contains(c))
    {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(cwd) = &self.cwd {
            write!(f, "(cd {} && ", quote(&cwd.display().to_string()))?;
        }
        f.write_str(&quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        if self.cwd.is_some() {
            f.write_str(")")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_quotes_when_needed() {
        let inv = ToolInvocation::new("yosys")
            .arg("-p")
            .arg("synth_xilinx -top top")
            .current_dir("/tmp/gw");
        assert_eq!(
            inv.to_string(),
            "(cd /tmp/gw && yosys -p 'synth_xilinx -top top')"
        );
    }

    #[test]
    fn plain_command() {
        let inv = ToolInvocation::new("openFPGALoader").args(["--cable", "ch347_jtag"]);
        assert_eq!(inv.to_string(), "openFPGALoader --cable ch347_jtag");
        assert!(inv.has_arg("ch347_jtag"));
        assert!(inv.cwd.is_none());
    }
}

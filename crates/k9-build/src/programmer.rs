//! Device programming through openFPGALoader.

use std::path::Path;

use k9_platform::Platform;
use tracing::info;

use crate::builder::BitstreamMode;
use crate::error::{BuildError, Result};
use crate::invocation::ToolInvocation;
use crate::runner::CommandRunner;

/// What to do with a bitstream. Exactly one action per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramAction {
    /// Configure the FPGA over JTAG; lost at power-off.
    Load,
    /// Write the configuration flash at `offset`.
    Flash { offset: u32 },
}

impl ProgramAction {
    /// The bitstream flavour the action consumes.
    pub fn mode(self) -> BitstreamMode {
        match self {
            ProgramAction::Load => BitstreamMode::Sram,
            ProgramAction::Flash { .. } => BitstreamMode::Flash,
        }
    }
}

/// openFPGALoader bound to one cable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenFpgaLoader {
    pub cable: String,
}

impl OpenFpgaLoader {
    pub fn new(cable: impl Into<String>) -> Self {
        Self {
            cable: cable.into(),
        }
    }

    /// The programmer a platform declares.
    pub fn for_platform(platform: &Platform) -> Self {
        Self::new(platform.programmer_cable.clone())
    }

    fn base(&self) -> ToolInvocation {
        ToolInvocation::new("openFPGALoader")
            .arg("--cable")
            .arg(self.cable.clone())
    }

    pub fn load_bitstream(&self, bitstream: &Path) -> ToolInvocation {
        self.base()
            .arg("--bitstream")
            .arg(bitstream.display().to_string())
    }

    pub fn flash(&self, offset: u32, bitstream: &Path) -> ToolInvocation {
        self.base()
            .arg("--write-flash")
            .arg("--offset")
            .arg(offset.to_string())
            .arg("--bitstream")
            .arg(bitstream.display().to_string())
    }

    pub fn invocation(&self, action: ProgramAction, bitstream: &Path) -> ToolInvocation {
        match action {
            ProgramAction::Load => self.load_bitstream(bitstream),
            ProgramAction::Flash { offset } => self.flash(offset, bitstream),
        }
    }

    /// Program `bitstream`, which must exist.
    pub fn program(
        &self,
        runner: &mut dyn CommandRunner,
        action: ProgramAction,
        bitstream: &Path,
    ) -> Result<()> {
        if !bitstream.exists() {
            return Err(BuildError::MissingArtifact {
                path: bitstream.to_path_buf(),
            });
        }
        info!("{action:?} {} over {}", bitstream.display(), self.cable);
        runner.run(&self.invocation(action, bitstream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::RecordingRunner;

    #[test]
    fn command_lines() {
        let p = OpenFpgaLoader::new("ch347_jtag");
        assert_eq!(
            p.load_bitstream(Path::new("gw/top.bit")).to_string(),
            "openFPGALoader --cable ch347_jtag --bitstream gw/top.bit"
        );
        assert_eq!(
            p.flash(0, Path::new("gw/top.bin")).to_string(),
            "openFPGALoader --cable ch347_jtag --write-flash --offset 0 --bitstream gw/top.bin"
        );
    }

    #[test]
    fn k9plus_cable() {
        let platform = Platform::colorlight_k9plus_ext().unwrap();
        assert_eq!(OpenFpgaLoader::for_platform(&platform).cable, "ch347_jtag");
        assert_eq!(ProgramAction::Flash { offset: 0 }.mode(), BitstreamMode::Flash);
    }

    #[test]
    fn missing_bitstream_is_not_programmed() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = RecordingRunner::new();
        let err = OpenFpgaLoader::new("ch347_jtag")
            .program(&mut runner, ProgramAction::Load, &dir.path().join("top.bit"))
            .unwrap_err();
        assert!(matches!(err, BuildError::MissingArtifact { .. }));
        assert!(runner.invocations.is_empty());
    }
}

//! Build driver: writes the build directory and runs the synthesis flow.
//!
//! Layout of a build directory:
//! ```text
//! {build_dir}/
//!   soc.json                     elaborated system description
//!   csr.json                     CSR map and constants
//!   gateware/
//!     {build_name}.xdc           pin and timing constraints
//!     {build_name}.tcl           Vivado script (or build_{build_name}.sh)
//!     {build_name}.bit           bitstream
//!     {build_name}.bin           flash image (Vivado)
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use k9_platform::{emit_xdc, Toolchain};
use k9_soc::Elaboration;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{BuildError, Result};
use crate::invocation::ToolInvocation;
use crate::runner::CommandRunner;
use crate::toolchain::{flow_for, FlowContext};

/// Default build name, also the top-level module name.
pub const DEFAULT_BUILD_NAME: &str = "colorlight_k9plus_ext";

/// Which configuration target a bitstream file is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BitstreamMode {
    /// Volatile configuration over JTAG.
    Sram,
    /// Image for the configuration flash.
    Flash,
}

impl FromStr for BitstreamMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "sram" => Ok(BitstreamMode::Sram),
            "flash" => Ok(BitstreamMode::Flash),
            other => Err(format!("unknown bitstream mode '{other}' (expected sram or flash)")),
        }
    }
}

/// Options of one build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOptions {
    pub build_dir: PathBuf,
    pub build_name: String,
    /// Overrides the platform's default toolchain.
    pub toolchain: Option<Toolchain>,
    /// HDL sources; `gateware/{build_name}.v` when empty.
    pub sources: Vec<PathBuf>,
    /// Run the synthesis flow after writing the build directory.
    pub compile: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            build_dir: Path::new("build").join(DEFAULT_BUILD_NAME),
            build_name: DEFAULT_BUILD_NAME.to_string(),
            toolchain: None,
            sources: Vec::new(),
            compile: true,
        }
    }
}

impl BuildOptions {
    pub fn gateware_dir(&self) -> PathBuf {
        self.build_dir.join("gateware")
    }

    /// Bitstream path for a mode, as produced by `toolchain`.
    ///
    /// Loading and flashing use this too, so they always reference what the
    /// build wrote.
    pub fn bitstream_filename(&self, toolchain: Toolchain, mode: BitstreamMode) -> PathBuf {
        let name = match mode {
            BitstreamMode::Sram => format!("{}.bit", self.build_name),
            BitstreamMode::Flash => flow_for(toolchain).flash_image_name(&self.build_name),
        };
        self.gateware_dir().join(name)
    }

    fn resolved_sources(&self) -> Result<Vec<PathBuf>> {
        if self.sources.is_empty() {
            return Ok(vec![absolute(
                &self.gateware_dir().join(format!("{}.v", self.build_name)),
            )?]);
        }
        self.sources.iter().map(|s| absolute(s)).collect()
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Everything `prepare` wrote and what `build` will run.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    pub toolchain: Toolchain,
    pub gateware_dir: PathBuf,
    /// Files written into the build directory.
    pub written: Vec<PathBuf>,
    pub invocations: Vec<ToolInvocation>,
    pub bitstream: PathBuf,
    pub flash_image: PathBuf,
}

/// A produced file and its digest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artifact {
    pub path: PathBuf,
    pub bytes: u64,
    /// Lowercase hex SHA-256.
    pub sha256: String,
}

impl Artifact {
    pub fn digest(path: &Path) -> Result<Self> {
        let data = fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BuildError::MissingArtifact {
                path: path.to_path_buf(),
            },
            _ => BuildError::Io(e),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            bytes: data.len() as u64,
            sha256: format!("{:x}", Sha256::digest(&data)),
        })
    }
}

/// Outcome of a build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub build_name: String,
    pub toolchain: Toolchain,
    /// Whether the synthesis flow ran.
    pub compiled: bool,
    pub steps_run: usize,
    pub artifacts: Vec<Artifact>,
    /// Expected outputs the flow did not produce.
    pub missing: Vec<PathBuf>,
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Build Report ===")?;
        writeln!(f, "Build: {} ({})", self.build_name, self.toolchain)?;
        if self.compiled {
            writeln!(f, "Tool steps: {}", self.steps_run)?;
        } else {
            writeln!(f, "Tool steps: skipped")?;
        }
        writeln!(f)?;
        writeln!(f, "--- Artifacts ---")?;
        for a in &self.artifacts {
            writeln!(f, "  {}  {:>9} B  {}", &a.sha256[..16], a.bytes, a.path.display())?;
        }
        for path in &self.missing {
            writeln!(f, "  missing: {}", path.display())?;
        }
        Ok(())
    }
}

/// Drives one build of an elaborated SoC.
#[derive(Debug)]
pub struct Builder {
    elaboration: Elaboration,
    options: BuildOptions,
    toolchain: Toolchain,
}

impl Builder {
    pub fn new(elaboration: Elaboration, options: BuildOptions) -> Self {
        let toolchain = options
            .toolchain
            .unwrap_or(elaboration.platform().toolchain);
        Self {
            elaboration,
            options,
            toolchain,
        }
    }

    pub fn elaboration(&self) -> &Elaboration {
        &self.elaboration
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn toolchain(&self) -> Toolchain {
        self.toolchain
    }

    pub fn bitstream_filename(&self, mode: BitstreamMode) -> PathBuf {
        self.options.bitstream_filename(self.toolchain, mode)
    }

    /// Write constraints, the flow script and the JSON exports.
    pub fn prepare(&self) -> Result<BuildPlan> {
        let gateware_dir = self.options.gateware_dir();
        fs::create_dir_all(&gateware_dir)?;
        let name = &self.options.build_name;
        let platform = self.elaboration.platform();
        let flow = flow_for(self.toolchain);
        let sources = self.options.resolved_sources()?;
        let ctx = FlowContext {
            build_name: name,
            platform,
            gateware_dir: &gateware_dir,
            sources: &sources,
        };

        let mut written = Vec::new();
        let mut write = |path: PathBuf, contents: String| -> Result<()> {
            debug!("writing {}", path.display());
            fs::write(&path, contents)?;
            written.push(path);
            Ok(())
        };

        write(
            gateware_dir.join(ctx.xdc_name()),
            emit_xdc(platform.requests().requested(), &platform.timing),
        )?;
        write(gateware_dir.join(flow.script_name(name)), flow.script(&ctx))?;
        write(
            self.options.build_dir.join("soc.json"),
            serde_json::to_string_pretty(&self.elaboration.soc_json()?)?,
        )?;
        write(
            self.options.build_dir.join("csr.json"),
            serde_json::to_string_pretty(&self.elaboration.csr_json())?,
        )?;

        let plan = BuildPlan {
            toolchain: self.toolchain,
            invocations: flow.invocations(&ctx),
            bitstream: self.bitstream_filename(BitstreamMode::Sram),
            flash_image: self.bitstream_filename(BitstreamMode::Flash),
            gateware_dir,
            written,
        };
        info!(
            "prepared {} build in {} ({} tool steps)",
            self.toolchain,
            self.options.build_dir.display(),
            plan.invocations.len()
        );
        Ok(plan)
    }

    /// Prepare, then run the flow. The first failing step aborts the build.
    pub fn build(&self, runner: &mut dyn CommandRunner) -> Result<BuildReport> {
        let plan = self.prepare()?;
        let mut artifacts = plan
            .written
            .iter()
            .map(|p| Artifact::digest(p))
            .collect::<Result<Vec<_>>>()?;

        let mut missing = Vec::new();
        let mut steps_run = 0;
        if self.options.compile {
            for invocation in &plan.invocations {
                runner.run(invocation)?;
                steps_run += 1;
            }
            artifacts.push(Artifact::digest(&plan.bitstream)?);
            if plan.flash_image != plan.bitstream {
                if plan.flash_image.exists() {
                    artifacts.push(Artifact::digest(&plan.flash_image)?);
                } else {
                    warn!(
                        "flash image {} was not produced; flashing will fail",
                        plan.flash_image.display()
                    );
                    missing.push(plan.flash_image.clone());
                }
            }
            info!("bitstream {}", plan.bitstream.display());
        }

        Ok(BuildReport {
            build_name: self.options.build_name.clone(),
            toolchain: self.toolchain,
            compiled: self.options.compile,
            steps_run,
            artifacts,
            missing,
        })
    }
}

//! Build and programming driver for the Colorlight K9+.
//!
//! Turns an [`k9_soc::Elaboration`] into a build directory (constraints,
//! flow script, JSON exports), runs the selected synthesis flow and programs
//! the result with openFPGALoader. Every external tool goes through a
//! [`CommandRunner`], so builds can be dry-run and tested without the tools
//! installed.

pub mod builder;
pub mod error;
pub mod invocation;
pub mod programmer;
pub mod runner;
pub mod toolchain;

pub use builder::{Artifact, BitstreamMode, BuildOptions, BuildPlan, BuildReport, Builder, DEFAULT_BUILD_NAME};
pub use error::{BuildError, Result};
pub use invocation::ToolInvocation;
pub use programmer::{OpenFpgaLoader, ProgramAction};
pub use runner::{probe_tool, CommandRunner, RecordingRunner, SystemRunner};
pub use toolchain::{flow_for, Flow, FlowContext};

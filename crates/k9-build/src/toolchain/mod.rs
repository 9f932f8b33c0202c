//! Synthesis flows.
//!
//! A flow renders a reproducible script into the gateware directory and
//! lists the tool invocations that turn the top-level netlist into a
//! bitstream.

pub mod openxc7;
pub mod vivado;

use std::path::{Path, PathBuf};

use k9_platform::{Platform, Toolchain};

use crate::invocation::ToolInvocation;

pub use openxc7::Openxc7;
pub use vivado::Vivado;

/// Inputs shared by every flow.
#[derive(Debug, Clone, Copy)]
pub struct FlowContext<'a> {
    pub build_name: &'a str,
    pub platform: &'a Platform,
    /// Directory holding the constraints, the script and all tool outputs.
    pub gateware_dir: &'a Path,
    /// HDL sources, top module named `build_name`.
    pub sources: &'a [PathBuf],
}

impl FlowContext<'_> {
    pub fn xdc_name(&self) -> String {
        format!("{}.xdc", self.build_name)
    }

    pub fn bitstream_name(&self) -> String {
        format!("{}.bit", self.build_name)
    }
}

/// A synthesis and implementation flow.
pub trait Flow {
    fn toolchain(&self) -> Toolchain;

    /// File name of the script written next to the constraints.
    fn script_name(&self, build_name: &str) -> String;

    fn script(&self, ctx: &FlowContext<'_>) -> String;

    /// Tool invocations, in order.
    fn invocations(&self, ctx: &FlowContext<'_>) -> Vec<ToolInvocation>;

    /// File name of the image written to the configuration flash.
    fn flash_image_name(&self, build_name: &str) -> String;
}

/// The flow implementing `toolchain`.
pub fn flow_for(toolchain: Toolchain) -> Box<dyn Flow> {
    match toolchain {
        Toolchain::Vivado => Box::new(Vivado),
        Toolchain::Openxc7 => Box::new(Openxc7::from_env()),
    }
}

pub(crate) fn source_list(sources: &[PathBuf]) -> Vec<String> {
    sources.iter().map(|s| s.display().to_string()).collect()
}

//! AMD/Xilinx Vivado batch flow.

use std::fmt::Write;

use k9_platform::Toolchain;

use super::{source_list, Flow, FlowContext};
use crate::invocation::ToolInvocation;

#[derive(Debug, Clone, Copy, Default)]
pub struct Vivado;

impl Flow for Vivado {
    fn toolchain(&self) -> Toolchain {
        Toolchain::Vivado
    }

    fn script_name(&self, build_name: &str) -> String {
        format!("{build_name}.tcl")
    }

    fn script(&self, ctx: &FlowContext<'_>) -> String {
        let name = ctx.build_name;
        let part = ctx.platform.device.part();
        let mut tcl = String::new();

        let _ = writeln!(tcl, "# Create project");
        let _ = writeln!(tcl, "create_project -force -name {name} -part {part}");
        let _ = writeln!(tcl, "set_msg_config -id {{Common 17-55}} -new_severity {{Warning}}");
        let _ = writeln!(tcl);

        let _ = writeln!(tcl, "# Add sources");
        for source in source_list(ctx.sources) {
            let _ = writeln!(tcl, "read_verilog {{{source}}}");
        }
        let _ = writeln!(tcl, "read_xdc {}", ctx.xdc_name());
        let _ = writeln!(tcl);

        let _ = writeln!(tcl, "# Synthesis");
        let _ = writeln!(tcl, "synth_design -directive default -top {name} -part {part}");
        let _ = writeln!(tcl, "report_utilization -file {name}_utilization_synth.rpt");
        let _ = writeln!(tcl);

        let _ = writeln!(tcl, "# Implementation");
        let _ = writeln!(tcl, "opt_design -directive default");
        let _ = writeln!(tcl, "place_design -directive default");
        let _ = writeln!(tcl, "route_design -directive default");
        let _ = writeln!(tcl, "report_timing_summary -file {name}_timing.rpt");
        let _ = writeln!(tcl, "report_utilization -file {name}_utilization_place.rpt");
        let _ = writeln!(tcl);

        let _ = writeln!(tcl, "# Bitstream");
        for cmd in &ctx.platform.bitstream_commands {
            let _ = writeln!(tcl, "{cmd}");
        }
        let _ = writeln!(tcl, "write_bitstream -force {}", ctx.bitstream_name());
        for cmd in ctx.platform.resolved_additional_commands(name) {
            let _ = writeln!(tcl, "{cmd}");
        }
        let _ = writeln!(tcl);
        let _ = writeln!(tcl, "quit");
        tcl
    }

    fn invocations(&self, ctx: &FlowContext<'_>) -> Vec<ToolInvocation> {
        vec![ToolInvocation::new("vivado")
            .args(["-mode", "batch", "-nojournal", "-source"])
            .arg(self.script_name(ctx.build_name))
            .current_dir(ctx.gateware_dir)]
    }

    fn flash_image_name(&self, build_name: &str) -> String {
        format!("{build_name}.bin")
    }
}

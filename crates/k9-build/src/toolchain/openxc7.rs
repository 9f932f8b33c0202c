//! Open-source flow: yosys, nextpnr-xilinx and the prjxray frame tools.

use std::env;
use std::fmt::Write;
use std::path::PathBuf;

use k9_platform::Toolchain;

use super::{source_list, Flow, FlowContext};
use crate::invocation::ToolInvocation;

/// Default location of the nextpnr-xilinx chip databases.
pub const DEFAULT_CHIPDB_DIR: &str = "/usr/share/nextpnr/xilinx-chipdb";
/// Default location of the prjxray database.
pub const DEFAULT_PRJXRAY_DB_DIR: &str = "/usr/share/nextpnr/prjxray-db";

#[derive(Debug, Clone)]
pub struct Openxc7 {
    pub chipdb_dir: PathBuf,
    pub prjxray_db_dir: PathBuf,
}

impl Default for Openxc7 {
    fn default() -> Self {
        Self {
            chipdb_dir: PathBuf::from(DEFAULT_CHIPDB_DIR),
            prjxray_db_dir: PathBuf::from(DEFAULT_PRJXRAY_DB_DIR),
        }
    }
}

impl Openxc7 {
    /// Database locations from `CHIPDB` and `PRJXRAY_DB_DIR`, when set.
    pub fn from_env() -> Self {
        let mut flow = Self::default();
        if let Some(dir) = env::var_os("CHIPDB") {
            flow.chipdb_dir = dir.into();
        }
        if let Some(dir) = env::var_os("PRJXRAY_DB_DIR") {
            flow.prjxray_db_dir = dir.into();
        }
        flow
    }

    fn steps(&self, ctx: &FlowContext<'_>) -> Vec<ToolInvocation> {
        let name = ctx.build_name;
        let part = ctx.platform.device.part_without_speedgrade();
        let db = self
            .prjxray_db_dir
            .join(ctx.platform.device.family().db_name());
        let chipdb = self.chipdb_dir.join(format!("{part}.bin"));

        let synth = format!("synth_xilinx -flatten -abc9 -arch xc7 -top {name}; write_json {name}.json");
        vec![
            ToolInvocation::new("yosys")
                .args(["-q", "-p"])
                .arg(synth)
                .args(source_list(ctx.sources)),
            ToolInvocation::new("nextpnr-xilinx")
                .arg("--chipdb")
                .arg(chipdb.display().to_string())
                .arg("--xdc")
                .arg(ctx.xdc_name())
                .arg("--json")
                .arg(format!("{name}.json"))
                .arg("--write")
                .arg(format!("{name}_routed.json"))
                .arg("--fasm")
                .arg(format!("{name}.fasm")),
            ToolInvocation::new("fasm2frames")
                .arg("--part")
                .arg(part)
                .arg("--db-root")
                .arg(db.display().to_string())
                .arg(format!("{name}.fasm"))
                .arg(format!("{name}.frames")),
            ToolInvocation::new("xc7frames2bit")
                .arg("--part_file")
                .arg(db.join(part).join("part.yaml").display().to_string())
                .args(["--part_name", part])
                .arg("--frm_file")
                .arg(format!("{name}.frames"))
                .arg("--output_file")
                .arg(ctx.bitstream_name()),
        ]
        .into_iter()
        .map(|inv| inv.current_dir(ctx.gateware_dir))
        .collect()
    }
}

impl Flow for Openxc7 {
    fn toolchain(&self) -> Toolchain {
        Toolchain::Openxc7
    }

    fn script_name(&self, build_name: &str) -> String {
        format!("build_{build_name}.sh")
    }

    fn script(&self, ctx: &FlowContext<'_>) -> String {
        let mut sh = String::from("#!/bin/sh\nset -e\n");
        for step in self.steps(ctx) {
            let _ = writeln!(sh, "{}", ToolInvocation { cwd: None, ..step });
        }
        sh
    }

    fn invocations(&self, ctx: &FlowContext<'_>) -> Vec<ToolInvocation> {
        self.steps(ctx)
    }

    // The open flow has no cfgmem step; the flash takes the raw bitstream.
    fn flash_image_name(&self, build_name: &str) -> String {
        format!("{build_name}.bit")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k9_platform::Platform;
    use std::path::Path;

    #[test]
    fn four_steps_in_gateware_dir() {
        let platform = Platform::colorlight_k9plus_ext().unwrap();
        let sources = vec![PathBuf::from("top.v")];
        let ctx = FlowContext {
            build_name: "top",
            platform: &platform,
            gateware_dir: Path::new("/gw"),
            sources: &sources,
        };
        let flow = Openxc7::default();
        let steps = flow.invocations(&ctx);
        let programs: Vec<&str> = steps.iter().map(|s| s.program.as_str()).collect();
        assert_eq!(programs, vec!["yosys", "nextpnr-xilinx", "fasm2frames", "xc7frames2bit"]);
        assert!(steps.iter().all(|s| s.cwd.as_deref() == Some(Path::new("/gw"))));
        assert!(steps[1].has_arg("/usr/share/nextpnr/xilinx-chipdb/xc7a50tfgg484.bin"));
        assert!(steps[3].has_arg("top.bit"));

        let sh = flow.script(&ctx);
        assert!(sh.starts_with("#!/bin/sh\nset -e\n"));
        assert!(sh.contains("yosys -q -p 'synth_xilinx"));
        assert!(!sh.contains("cd /gw"));
        assert_eq!(flow.flash_image_name("top"), "top.bit");
    }
}

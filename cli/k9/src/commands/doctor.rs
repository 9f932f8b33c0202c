//! `k9 doctor`: toolchain diagnostics.

use anyhow::Result;
use k9_build::probe_tool;

use super::Project;

const TOOLS: &[(&str, &[&str])] = &[
    ("vivado", &["-version"]),
    ("yosys", &["-V"]),
    ("nextpnr-xilinx", &["--version"]),
    ("fasm2frames", &["--help"]),
    ("xc7frames2bit", &["--help"]),
    ("openFPGALoader", &["--Version"]),
];

/// Print toolchain diagnostic information.
pub fn run(project: &Project) -> Result<()> {
    println!("=== K9 Doctor ===");
    println!();
    println!("k9 version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("--- System Tools ---");
    for (tool, args) in TOOLS {
        match probe_tool(tool, args) {
            Some(version) => println!("  {tool}: {version}"),
            None => println!("  {tool}: not found"),
        }
    }
    println!();

    println!("--- Project Status ---");
    match &project.manifest {
        Some(manifest) => {
            println!("  k9.toml: found at {}", project.dir.display());
            println!("  Project: {} {}", manifest.project.name, manifest.project.version);
            if let Some(toolchain) = manifest.build.toolchain {
                println!("  Toolchain: {toolchain}");
            }
        }
        None => println!("  k9.toml: not found"),
    }
    match project.platform(None) {
        Ok(platform) => println!(
            "  Board: {} ({}, {} via {})",
            platform.name,
            platform.device.part(),
            platform.toolchain,
            platform.programmer_cable
        ),
        Err(e) => println!("  Board: error: {e:#}"),
    }
    Ok(())
}

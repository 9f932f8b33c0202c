//! `k9 build`: elaborate and run the toolchain flow.

use std::path::Path;

use anyhow::{Context, Result};
use k9_build::{BitstreamMode, Builder, OpenFpgaLoader, ProgramAction, SystemRunner};
use k9_platform::Toolchain;
use k9_soc::elaborate;

use super::{Project, SocArgs};

/// Options of `k9 build` besides the SoC flags.
#[derive(Debug, Default)]
pub struct BuildArgs<'a> {
    pub toolchain: Option<Toolchain>,
    pub build_dir: Option<&'a Path>,
    pub no_compile: bool,
    pub dry_run: bool,
    /// Program after a successful build.
    pub program: Option<ProgramAction>,
}

pub fn run(project: &Project, soc: &SocArgs, args: BuildArgs<'_>) -> Result<()> {
    let platform = project.platform(soc.board.as_deref())?;
    let config = project.soc_config(soc);
    let elaboration = elaborate(platform, config).context("elaborating SoC")?;
    println!("{}", elaboration.report);

    let mut options = project.build_options(args.build_dir, args.toolchain);
    options.compile = !args.no_compile;
    let builder = Builder::new(elaboration, options);
    let programmer = OpenFpgaLoader::for_platform(builder.elaboration().platform());

    if args.dry_run {
        let plan = builder.prepare().context("preparing build directory")?;
        println!("Wrote:");
        for path in &plan.written {
            println!("  {}", path.display());
        }
        println!();
        println!("Would run:");
        if builder.options().compile {
            for invocation in &plan.invocations {
                println!("  {invocation}");
            }
        }
        if let Some(action) = args.program {
            let bitstream = builder.bitstream_filename(action.mode());
            println!("  {}", programmer.invocation(action, &bitstream));
        }
        return Ok(());
    }

    let report = builder
        .build(&mut SystemRunner)
        .with_context(|| format!("building with {}", builder.toolchain()))?;
    println!("{report}");

    if let Some(action) = args.program {
        let bitstream = builder.bitstream_filename(action.mode());
        programmer.program(&mut SystemRunner, action, &bitstream)?;
        if action.mode() == BitstreamMode::Flash {
            println!("Flashed {}", bitstream.display());
        } else {
            println!("Loaded {}", bitstream.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dry_run_writes_but_runs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::discover(dir.path()).unwrap();
        run(
            &project,
            &SocArgs::default(),
            BuildArgs {
                dry_run: true,
                program: Some(ProgramAction::Load),
                ..Default::default()
            },
        )
        .unwrap();
        let gateware = dir.path().join("build/colorlight_k9plus_ext/gateware");
        assert!(gateware.join("colorlight_k9plus_ext.xdc").is_file());
        assert!(gateware.join("colorlight_k9plus_ext.tcl").is_file());
        assert!(!gateware.join("colorlight_k9plus_ext.bit").exists());
    }

    #[test]
    fn invalid_flags_fail_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::discover(dir.path()).unwrap();
        let soc = SocArgs {
            with_etherbone: true,
            eth_dynamic_ip: true,
            ..Default::default()
        };
        let err = run(&project, &soc, BuildArgs { dry_run: true, ..Default::default() }).unwrap_err();
        assert!(format!("{err:#}").contains("eth_dynamic_ip"));
        assert!(!dir.path().join("build").exists());
    }
}

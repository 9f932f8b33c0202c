//! `k9 load` / `k9 flash`: program an existing bitstream.

use std::path::Path;

use anyhow::{Context, Result};
use k9_build::{OpenFpgaLoader, ProgramAction, SystemRunner};

use super::Project;

/// Program the bitstream of the project's last build.
pub fn run(
    project: &Project,
    board: Option<&str>,
    build_dir: Option<&Path>,
    action: ProgramAction,
    dry_run: bool,
) -> Result<()> {
    let platform = project.platform(board)?;
    let options = project.build_options(build_dir, None);
    let toolchain = options.toolchain.unwrap_or(platform.toolchain);
    let bitstream = options.bitstream_filename(toolchain, action.mode());
    let programmer = OpenFpgaLoader::for_platform(&platform);

    if dry_run {
        println!("{}", programmer.invocation(action, &bitstream));
        return Ok(());
    }
    programmer
        .program(&mut SystemRunner, action, &bitstream)
        .with_context(|| format!("programming {}", bitstream.display()))?;
    println!("Programmed {}", bitstream.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use k9_build::BuildError;

    #[test]
    fn missing_bitstream_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::discover(dir.path()).unwrap();
        let err = run(&project, None, None, ProgramAction::Load, false).unwrap_err();
        let build_err = err.downcast_ref::<BuildError>().unwrap();
        assert!(matches!(build_err, BuildError::MissingArtifact { .. }));
    }

    #[test]
    fn dry_run_does_not_need_a_bitstream() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::discover(dir.path()).unwrap();
        run(&project, None, None, ProgramAction::Flash { offset: 0 }, true).unwrap();
    }
}

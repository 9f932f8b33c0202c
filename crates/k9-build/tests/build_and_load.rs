use k9_build::{
    BitstreamMode, BuildOptions, Builder, OpenFpgaLoader, ProgramAction, RecordingRunner,
};
use k9_platform::{Platform, Toolchain};
use k9_soc::{elaborate, SocConfig};

fn options(dir: &std::path::Path, toolchain: Toolchain) -> BuildOptions {
    BuildOptions {
        build_dir: dir.to_path_buf(),
        toolchain: Some(toolchain),
        sources: vec![dir.join("top.v")],
        ..Default::default()
    }
}

fn build(options: BuildOptions) -> Builder {
    let elaboration =
        elaborate(Platform::colorlight_k9plus_ext().unwrap(), SocConfig::default()).unwrap();
    Builder::new(elaboration, options)
}

#[test]
fn load_uses_the_bitstream_the_build_wrote() {
    for toolchain in [Toolchain::Vivado, Toolchain::Openxc7] {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path(), toolchain);
        let builder = build(opts.clone());

        let plan = builder.prepare().unwrap();
        let last_tool = plan.invocations.last().unwrap().program.clone();
        let mut runner = RecordingRunner::new()
            .produce(&last_tool, plan.bitstream.clone())
            .produce(&last_tool, plan.flash_image.clone());
        builder.build(&mut runner).unwrap();

        // A later `load` only knows the options, not the elaboration.
        let sram = opts.bitstream_filename(toolchain, BitstreamMode::Sram);
        assert_eq!(sram, plan.bitstream);
        assert!(sram.exists());

        let programmer = OpenFpgaLoader::new("ch347_jtag");
        let mut prog_runner = RecordingRunner::new();
        programmer
            .program(&mut prog_runner, ProgramAction::Load, &sram)
            .unwrap();
        let inv = &prog_runner.invocations[0];
        assert_eq!(inv.program, "openFPGALoader");
        assert!(inv.has_arg(&plan.bitstream.display().to_string()));
    }
}

#[test]
fn flash_uses_the_flash_image() {
    let dir = tempfile::tempdir().unwrap();
    let opts = options(dir.path(), Toolchain::Vivado);
    let builder = build(opts.clone());
    let flash = builder.bitstream_filename(BitstreamMode::Flash);
    assert_eq!(flash, dir.path().join("gateware/colorlight_k9plus_ext.bin"));

    let mut runner = RecordingRunner::new()
        .produce("vivado", builder.bitstream_filename(BitstreamMode::Sram))
        .produce("vivado", flash.clone());
    let report = builder.build(&mut runner).unwrap();
    assert!(report.artifacts.iter().any(|a| a.path == flash));

    let mut prog_runner = RecordingRunner::new();
    OpenFpgaLoader::new("ch347_jtag")
        .program(&mut prog_runner, ProgramAction::Flash { offset: 0 }, &flash)
        .unwrap();
    assert!(prog_runner.invocations[0].has_arg("--write-flash"));
}

#[test]
fn tool_failure_stops_the_build() {
    let dir = tempfile::tempdir().unwrap();
    let builder = build(options(dir.path(), Toolchain::Vivado));
    let mut runner = RecordingRunner::new().fail("vivado", 1);
    let err = builder.build(&mut runner).unwrap_err();
    assert_eq!(err.to_string(), "vivado failed with exit status 1");
    assert!(!builder.bitstream_filename(BitstreamMode::Sram).exists());
}

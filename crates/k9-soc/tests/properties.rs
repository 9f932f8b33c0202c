use std::collections::HashMap;

use k9_platform::{PinBinding, Platform, PlatformError, Subsignal};
use k9_soc::{elaborate, ElaborationError, SocConfig};

fn k9() -> Platform {
    Platform::colorlight_k9plus_ext().unwrap()
}

fn full_config() -> SocConfig {
    SocConfig {
        with_ethernet: true,
        with_spi_flash: true,
        with_dna: true,
        ..Default::default()
    }
}

#[test]
fn requested_bindings_never_share_a_pad() {
    let out = elaborate(k9(), full_config()).unwrap();
    let mut owners: HashMap<&str, String> = HashMap::new();
    for binding in out.platform().requests().requested() {
        for pad in binding.pads() {
            if let Some(first) = owners.insert(pad, binding.label()) {
                panic!("pad {pad} requested by {first} and {}", binding.label());
            }
        }
    }
    assert!(owners.len() > 50);
}

#[test]
fn ethernet_with_etherbone_is_rejected_up_front() {
    let config = SocConfig {
        with_ethernet: true,
        with_etherbone: true,
        ..Default::default()
    };
    match elaborate(k9(), config).unwrap_err() {
        ElaborationError::Config { option, .. } => assert_eq!(option, "with_etherbone"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn sys_clock_is_exact_and_cut_from_the_oscillator() {
    let out = elaborate(k9(), SocConfig::default()).unwrap();
    let sys = out.soc.domain("sys").unwrap();
    assert_eq!(sys.freq_hz, 100e6);
    let timing = &out.platform().timing;
    assert!(timing.has_false_path("sys_clk", "clk25"));
    assert_eq!(timing.period_of("clk25"), Some(40.0));
}

#[test]
fn port_selector_binds_one_phy() {
    for port in [0, 1] {
        let config = SocConfig {
            with_ethernet: true,
            eth_port: port,
            ..Default::default()
        };
        let out = elaborate(k9(), config).unwrap();
        let requests = out.platform().requests();
        let other = 1 - port;
        assert!(requests.is_requested("eth", port));
        assert!(requests.is_requested("eth_clocks", port));
        assert!(!requests.is_requested("eth", other));
        assert!(!requests.is_requested("eth_clocks", other));
    }
}

#[test]
fn etherbone_on_second_port() {
    let config = SocConfig {
        with_etherbone: true,
        eth_port: 1,
        ..Default::default()
    };
    let out = elaborate(k9(), config).unwrap();
    assert!(out.platform().requests().is_requested("eth", 1));
    assert_eq!(out.soc.bus().masters()[0].name, "etherbone");
}

fn bare_platform_with(extra: Vec<PinBinding>) -> Platform {
    let mut io = vec![
        PinBinding::pins("clk25", 0, "W19"),
        PinBinding::subsignals(
            "serial",
            0,
            vec![Subsignal::new("tx", "V17"), Subsignal::new("rx", "R16")],
        ),
    ];
    io.extend(extra);
    let mut platform = Platform::new("bare", "xc7a50tfgg484-1", io, Vec::new()).unwrap();
    platform.default_clk_name = "clk25".into();
    platform.default_clk_period_ns = 40.0;
    platform
}

fn bare_platform() -> Platform {
    bare_platform_with(Vec::new())
}

#[test]
fn sdram_without_sdram_pins_is_a_binding_error() {
    let config = SocConfig {
        with_led_chaser: false,
        with_sdcard: false,
        ..Default::default()
    };
    let platform = bare_platform_with(vec![PinBinding::pins("sdram_clock", 0, "C19")]);
    match elaborate(platform, config).unwrap_err() {
        ElaborationError::Binding(PlatformError::BindingNotFound { name, index }) => {
            assert_eq!(name, "sdram");
            assert_eq!(index, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn sdram_clock_is_requested_by_the_crg() {
    let config = SocConfig {
        with_led_chaser: false,
        with_sdcard: false,
        ..Default::default()
    };
    match elaborate(bare_platform(), config).unwrap_err() {
        ElaborationError::Binding(PlatformError::BindingNotFound { name, .. }) => {
            assert_eq!(name, "sdram_clock");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn oversized_integrated_main_ram_is_an_error() {
    for size in [u64::MAX, u64::MAX / 2 + 1, 0xc000_0000] {
        let config = SocConfig {
            with_sdram: false,
            integrated_main_ram_size: size,
            ..Default::default()
        };
        let err = elaborate(k9(), config).unwrap_err();
        assert!(
            matches!(
                err,
                ElaborationError::Exhausted { .. } | ElaborationError::RegionAlignment { .. }
            ),
            "size {size:#x}: {err}"
        );
    }
}

#[test]
fn bare_platform_without_reset_pad() {
    let config = SocConfig {
        with_sdram: false,
        integrated_main_ram_size: 0x4000,
        with_led_chaser: false,
        with_sdcard: false,
        ..Default::default()
    };
    let out = elaborate(bare_platform(), config).unwrap();
    assert_eq!(out.soc.crg().reset.to_string(), "soc_rst");
    assert_eq!(out.soc.bus().region("main_ram").unwrap().size, 0x4000);
}

#[test]
fn infeasible_video_mode_fails_the_whole_elaboration() {
    let config = SocConfig {
        video_timings: "1280x720@60Hz".into(),
        ..Default::default()
    };
    assert!(matches!(
        elaborate(k9(), config).unwrap_err(),
        ElaborationError::ClockInfeasible { .. }
    ));
}

#[test]
fn board_file_elaborates_like_builtin() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("k9.board.toml");
    std::fs::write(&path, k9_platform::parse::board_to_toml(&k9()).unwrap()).unwrap();

    let loaded = k9_platform::load_board_toml(&path).unwrap();
    let a = elaborate(loaded, full_config()).unwrap();
    let b = elaborate(k9(), full_config()).unwrap();
    assert_eq!(a.csr_json(), b.csr_json());
}

#[test]
fn exports_written_and_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let out = elaborate(k9(), full_config()).unwrap();

    let soc_path = dir.path().join("soc.json");
    let csr_path = dir.path().join("csr.json");
    std::fs::write(&soc_path, serde_json::to_string_pretty(&out.soc_json().unwrap()).unwrap())
        .unwrap();
    std::fs::write(&csr_path, serde_json::to_string_pretty(&out.csr_json()).unwrap()).unwrap();

    let soc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&soc_path).unwrap()).unwrap();
    assert_eq!(soc["device"], "xc7a50tfgg484-1");
    assert_eq!(soc["clock_domains"][0]["name"], "sys");

    let csr: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&csr_path).unwrap()).unwrap();
    assert_eq!(csr["memories"]["spiflash"]["base"], 0x2000_0000u64);
    assert_eq!(csr["memories"]["ethmac"]["base"], 0x8000_0000u64);
    assert_eq!(csr["constants"]["localip4"], 50);
}

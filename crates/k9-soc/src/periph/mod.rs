//! Peripheral cores composed into the SoC.
//!
//! Each submodule validates the pin group and clock domains a core needs and
//! derives its parameters. Registration with the bus and the clock domain
//! table happens in [`crate::soc::Soc`].

pub mod dna;
pub mod ethernet;
pub mod led;
pub mod sdcard;
pub mod sdram;
pub mod spiflash;
pub mod uart;
pub mod video;

use std::fmt;

use k9_platform::PinBinding;
use serde::Serialize;

use crate::error::{ElaborationError, Result};

/// Parameters of an instantiated core.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Core {
    Uart(uart::UartCore),
    Sdram(sdram::SdramCore),
    EthPhy(ethernet::RgmiiPhy),
    Ethernet(ethernet::EthernetCore),
    Etherbone(ethernet::EtherboneCore),
    VideoColorbars(video::VideoCore),
    SpiFlash(spiflash::SpiFlashCore),
    LedChaser(led::LedChaserCore),
    Sdcard(sdcard::SdcardCore),
    Dna(dna::DnaCore),
}

impl fmt::Display for Core {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Core::Uart(c) => write!(f, "{} baud, tuning word {:#010x}", c.baudrate, c.tuning_word),
            Core::Sdram(c) => write!(
                f,
                "{} {} MiB, {} CL{}, L2 {} B",
                c.module.name,
                c.module.size_bytes() >> 20,
                c.phy.phytype,
                c.phy.cl,
                c.l2_size
            ),
            Core::EthPhy(c) => write!(
                f,
                "RGMII port {}, rx delay {} taps",
                c.port, c.rx_delay_taps
            ),
            Core::Ethernet(c) => write!(
                f,
                "MAC {:012x} on port {}, {} IP {}",
                c.mac_address,
                c.port,
                if c.dynamic_ip { "dynamic" } else { "static" },
                c.local_ip
            ),
            Core::Etherbone(c) => write!(
                f,
                "port {}, {}:{}",
                c.port, c.ip_address, c.udp_port
            ),
            Core::VideoColorbars(c) => write!(f, "{} ({} MHz pixel clock)", c.timings.name, c.timings.pix_clk / 1e6),
            Core::SpiFlash(c) => write!(
                f,
                "{} {} MiB, {} {} ({:#04x}), rate {}",
                c.module,
                c.size_bytes >> 20,
                c.mode,
                c.read_opcode.name,
                c.read_opcode.code,
                c.rate
            ),
            Core::LedChaser(c) => write!(f, "{} leds, {} cycles per step", c.nleds, c.step_cycles),
            Core::Sdcard(c) => write!(f, "{}-bit bus", c.data_width),
            Core::Dna(c) => write!(f, "{}-bit device DNA, clock /{}", c.bits, c.clk_divider),
        }
    }
}

/// An instantiated peripheral.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Peripheral {
    /// Unique name (e.g., "sdram", "ethphy").
    pub name: String,
    /// Pin bindings consumed, as `name:index`.
    pub pins: Vec<String>,
    /// Clock domains the core runs in.
    pub clock_domains: Vec<String>,
    pub core: Core,
}

/// Check that a subsignal of a requested binding has the expected width.
pub(crate) fn expect_width(
    binding: &PinBinding,
    subsignal: &str,
    ok: impl Fn(usize) -> bool,
    expected: &str,
) -> Result<usize> {
    let found = binding.subsignal_width(subsignal);
    if ok(found) {
        Ok(found)
    } else {
        Err(ElaborationError::PadWidth {
            binding: binding.label(),
            subsignal: subsignal.to_string(),
            expected: expected.to_string(),
            found,
        })
    }
}

/// `ceil(t_ns / period)`, the number of clock cycles covering a duration.
pub(crate) fn ns_to_cycles(t_ns: f64, clk_freq: f64) -> u32 {
    let period_ns = 1e9 / clk_freq;
    (t_ns / period_ns).ceil() as u32
}

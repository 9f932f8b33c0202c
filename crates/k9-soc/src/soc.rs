//! The composed system.
//!
//! [`Soc`] owns the platform for the duration of one elaboration: every
//! `add_*` call requests its pins from it, checks that the clock domains it
//! depends on exist, and registers exactly one named peripheral with the bus.

use std::collections::BTreeMap;

use k9_platform::timing::PeriodConstraint;
use k9_platform::xdc::subsignal_port_name;
use k9_platform::Platform;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::bus::{BusMap, RegionKind, CSR_REGION_SIZE};
use crate::clock::{ClockDomain, ClockSource};
use crate::config::SocConfig;
use crate::crg::Crg;
use crate::error::{ElaborationError, Result};
use crate::periph::ethernet::{
    self, EtherboneCore, EthernetCore, DEFAULT_MAC_ADDRESS, DEFAULT_RX_DELAY_S,
    ETHERBONE_UDP_PORT, RGMII_CLK_FREQ,
};
use crate::periph::sdram::M12L64322A;
use crate::periph::video::VideoTimings;
use crate::periph::{dna, led, sdcard, sdram, spiflash, uart, video, Core, Peripheral};

/// Integrated boot ROM size.
pub const INTEGRATED_ROM_SIZE: u64 = 0x2_0000;
/// Integrated SRAM size.
pub const INTEGRATED_SRAM_SIZE: u64 = 0x2000;
/// Ethernet MAC buffer window.
pub const ETHMAC_REGION_SIZE: u64 = 0x2000;

/// A SoC under composition.
#[derive(Debug)]
pub struct Soc {
    platform: Platform,
    config: SocConfig,
    crg: Crg,
    bus: BusMap,
    domains: Vec<ClockDomain>,
    peripherals: Vec<Peripheral>,
}

#[derive(Serialize)]
struct SocDescription<'a> {
    platform: &'a str,
    device: &'a str,
    ident: &'a str,
    sys_clk_freq: f64,
    crg: &'a Crg,
    clock_domains: &'a [ClockDomain],
    peripherals: &'a [Peripheral],
    bus: &'a BusMap,
    pins: BTreeMap<String, Vec<&'a str>>,
    timing: &'a k9_platform::TimingConstraints,
}

impl Soc {
    /// Create the base SoC: boot ROM, SRAM, CSR space, control, identifier
    /// and timer.
    pub fn new(platform: Platform, config: SocConfig, crg: Crg) -> Result<Self> {
        let mut soc = Self {
            platform,
            domains: crg.domains.clone(),
            config,
            crg,
            bus: BusMap::new(),
            peripherals: Vec::new(),
        };
        soc.require_domain("soc", "sys")?;

        soc.bus
            .add_default_region("rom", INTEGRATED_ROM_SIZE, RegionKind::Cached, true)?;
        soc.bus
            .add_default_region("sram", INTEGRATED_SRAM_SIZE, RegionKind::Cached, false)?;
        soc.bus
            .add_default_region("csr", CSR_REGION_SIZE, RegionKind::Io, false)?;
        if soc.config.integrated_main_ram_size > 0 {
            let size = soc.config.integrated_main_ram_size;
            soc.bus
                .add_default_region("main_ram", size, RegionKind::Cached, false)?;
        }
        for csr in ["ctrl", "identifier_mem", "timer0"] {
            soc.bus.add_csr(csr)?;
        }
        soc.bus.add_irq("timer0")?;
        info!("base SoC on {} at {:.3} MHz", soc.platform.name, soc.config.sys_clk_freq / 1e6);
        Ok(soc)
    }

    fn require_domain(&self, peripheral: &str, domain: &str) -> Result<&ClockDomain> {
        self.domains
            .iter()
            .find(|d| d.name == domain)
            .ok_or_else(|| ElaborationError::MissingClockDomain {
                peripheral: peripheral.to_string(),
                domain: domain.to_string(),
            })
    }

    fn add_peripheral(
        &mut self,
        name: &str,
        pins: Vec<String>,
        clock_domains: &[&str],
        core: Core,
    ) -> Result<()> {
        if self.peripheral(name).is_some() {
            return Err(ElaborationError::DuplicatePeripheral {
                name: name.to_string(),
            });
        }
        for domain in clock_domains {
            self.require_domain(name, domain)?;
        }
        info!("added {name}: {core}");
        self.peripherals.push(Peripheral {
            name: name.to_string(),
            pins,
            clock_domains: clock_domains.iter().map(|d| d.to_string()).collect(),
            core,
        });
        Ok(())
    }

    fn ensure_absent(&self, name: &str) -> Result<()> {
        match self.peripheral(name) {
            Some(_) => Err(ElaborationError::DuplicatePeripheral {
                name: name.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Serial console on `serial:0`.
    pub fn add_uart(&mut self) -> Result<()> {
        self.ensure_absent("uart")?;
        self.require_domain("uart", "sys")?;
        let pads = self.platform.request("serial", 0)?;
        let core = uart::uart(&pads, self.config.sys_clk_freq)?;
        self.bus.add_csr("uart")?;
        self.bus.add_irq("uart")?;
        self.add_peripheral("uart", vec![pads.label()], &["sys"], Core::Uart(core))
    }

    /// SDR SDRAM on `sdram:0` as main RAM, clocked out by `sys_ps`.
    pub fn add_sdram(&mut self) -> Result<()> {
        self.ensure_absent("sdram")?;
        self.require_domain("sdram", "sys")?;
        self.require_domain("sdram", "sys_ps")?;
        let pads = self.platform.request("sdram", 0)?;
        let core = sdram::sdram(&pads, M12L64322A, self.config.sys_clk_freq, self.config.l2_size)?;
        self.bus.add_default_region(
            "main_ram",
            core.module.size_bytes(),
            RegionKind::Cached,
            false,
        )?;
        self.bus.add_csr("sdram")?;
        self.add_peripheral("sdram", vec![pads.label()], &["sys", "sys_ps"], Core::Sdram(core))
    }

    fn add_rgmii(&mut self) -> Result<ethernet::RgmiiPhy> {
        let port = self.config.eth_port;
        let idelay = self.domains.iter().find(|d| d.name == "idelay").cloned();
        let clock_pads = self.platform.request("eth_clocks", port)?;
        let pads = self.platform.request("eth", port)?;
        let phy = ethernet::rgmii_phy(
            port,
            &clock_pads,
            &pads,
            idelay.as_ref(),
            0.0,
            DEFAULT_RX_DELAY_S,
        )?;

        for (name, sub) in [("eth_rx", "rx"), ("eth_tx", "tx")] {
            let domain = ClockDomain {
                name: name.to_string(),
                freq_hz: RGMII_CLK_FREQ,
                phase_deg: 0.0,
                reset: format!("{name}_rst"),
                source: ClockSource::Pad {
                    binding: subsignal_port_name(&clock_pads, sub),
                },
            };
            self.platform.timing.add_period(PeriodConstraint {
                clock: domain.clk_net(),
                target: domain.clk_net(),
                is_port: false,
                period_ns: domain.period_ns(),
            });
            self.platform.add_false_path_constraint("sys_clk", &domain.clk_net());
            self.domains.push(domain);
        }

        let mut phy_domains = vec!["eth_rx", "eth_tx"];
        if phy.rx_delay_taps > 0 {
            phy_domains.push("idelay");
        }
        self.bus.add_csr("ethphy")?;
        self.add_peripheral(
            "ethphy",
            vec![clock_pads.label(), pads.label()],
            &phy_domains,
            Core::EthPhy(phy.clone()),
        )?;
        Ok(phy)
    }

    /// Ethernet MAC behind the RGMII PHY selected by `eth_port`.
    pub fn add_ethernet(&mut self) -> Result<()> {
        self.ensure_absent("ethmac")?;
        self.ensure_absent("etherbone")?;
        let phy = self.add_rgmii()?;
        self.bus.add_default_region("ethmac", ETHMAC_REGION_SIZE, RegionKind::Io, false)?;
        self.bus.add_csr("ethmac")?;
        self.bus.add_irq("ethmac")?;
        let core = EthernetCore {
            port: phy.port,
            mac_address: DEFAULT_MAC_ADDRESS,
            dynamic_ip: self.config.eth_dynamic_ip,
            local_ip: self.config.eth_ip,
        };
        self.add_peripheral("ethmac", Vec::new(), &["sys", "eth_rx", "eth_tx"], Core::Ethernet(core))
    }

    /// Etherbone bridge: a bus master reachable over UDP at `eth_ip`.
    pub fn add_etherbone(&mut self) -> Result<()> {
        self.ensure_absent("etherbone")?;
        self.ensure_absent("ethmac")?;
        let phy = self.add_rgmii()?;
        let core = EtherboneCore {
            port: phy.port,
            mac_address: DEFAULT_MAC_ADDRESS,
            ip_address: self.config.eth_ip,
            udp_port: ETHERBONE_UDP_PORT,
        };
        self.bus.add_master(
            "etherbone",
            format!("{}:{}", core.ip_address, core.udp_port),
        )?;
        self.add_peripheral("etherbone", Vec::new(), &["sys", "eth_rx", "eth_tx"], Core::Etherbone(core))
    }

    /// HDMI colorbar test pattern on `hdmi_out:0`.
    pub fn add_video_colorbars(&mut self) -> Result<()> {
        self.ensure_absent("video_colorbars")?;
        let timings = *VideoTimings::lookup(&self.config.video_timings).ok_or_else(|| {
            ElaborationError::config(
                "video_timings",
                format!("unknown video mode '{}'", self.config.video_timings),
            )
        })?;
        let hdmi = self.require_domain("video_colorbars", "hdmi")?.clone();
        let hdmi5x = self.require_domain("video_colorbars", "hdmi5x")?.clone();
        let pads = self.platform.request("hdmi_out", 0)?;
        let core = video::colorbars(&pads, timings, &hdmi, &hdmi5x)?;
        self.bus.add_csr("video_timing_generator")?;
        self.add_peripheral(
            "video_colorbars",
            vec![pads.label()],
            &["sys", "hdmi", "hdmi5x"],
            Core::VideoColorbars(core),
        )
    }

    /// Memory-mapped SPI flash in the configured bus width.
    pub fn add_spi_flash(&mut self) -> Result<()> {
        self.ensure_absent("spiflash")?;
        self.require_domain("spiflash", "sys")?;
        let mode = self.config.spi_flash_mode;
        let pads = self.platform.request(mode.binding_name(), 0)?;
        let core = spiflash::spi_flash(&pads, mode)?;
        self.bus
            .add_default_region("spiflash", core.size_bytes, RegionKind::Cached, true)?;
        self.bus.add_csr("spiflash_core")?;
        self.bus.add_csr("spiflash_phy")?;
        self.add_peripheral("spiflash", vec![pads.label()], &["sys"], Core::SpiFlash(core))
    }

    /// LED chaser on every usable `user_led`.
    pub fn add_led_chaser(&mut self) -> Result<()> {
        self.ensure_absent("leds")?;
        self.require_domain("leds", "sys")?;
        let pads = self.platform.request_all("user_led")?;
        let core = led::led_chaser(&pads, self.config.sys_clk_freq)?;
        self.bus.add_csr("leds")?;
        self.add_peripheral(
            "leds",
            pads.iter().map(|p| p.label()).collect(),
            &["sys"],
            Core::LedChaser(core),
        )
    }

    /// SD card with block DMA on `sdcard:0`.
    pub fn add_sdcard(&mut self) -> Result<()> {
        self.ensure_absent("sdcard")?;
        self.require_domain("sdcard", "sys")?;
        let pads = self.platform.request("sdcard", 0)?;
        let core = sdcard::sdcard(&pads, self.config.sys_clk_freq)?;
        for csr in ["sdcard_phy", "sdcard_core", "sdcard_block2mem", "sdcard_mem2block"] {
            self.bus.add_csr(csr)?;
        }
        self.bus.add_irq("sdcard")?;
        self.add_peripheral("sdcard", vec![pads.label()], &["sys"], Core::Sdcard(core))
    }

    /// Device DNA reader.
    pub fn add_dna(&mut self) -> Result<()> {
        self.ensure_absent("dna")?;
        self.require_domain("dna", "sys")?;
        self.bus.add_csr("dna")?;
        self.add_peripheral("dna", Vec::new(), &["sys"], Core::Dna(dna::dna()))
    }

    /// Final checks: no pad is driven twice, and every clock domain a
    /// peripheral runs in exists. Also constrains the board clock.
    pub fn finalize(&mut self) -> Result<()> {
        if let Some((pad, first, second)) = self.platform.requests().shared_pad() {
            return Err(ElaborationError::SharedPad { pad, first, second });
        }
        for p in &self.peripherals {
            for d in &p.clock_domains {
                self.require_domain(&p.name, d)?;
            }
        }
        self.platform.finalize()?;
        Ok(())
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn config(&self) -> &SocConfig {
        &self.config
    }

    pub fn crg(&self) -> &Crg {
        &self.crg
    }

    pub fn bus(&self) -> &BusMap {
        &self.bus
    }

    /// Every clock domain: PLL outputs, then pad-sourced domains.
    pub fn clock_domains(&self) -> &[ClockDomain] {
        &self.domains
    }

    pub fn domain(&self, name: &str) -> Option<&ClockDomain> {
        self.domains.iter().find(|d| d.name == name)
    }

    pub fn peripherals(&self) -> &[Peripheral] {
        &self.peripherals
    }

    pub fn peripheral(&self, name: &str) -> Option<&Peripheral> {
        self.peripherals.iter().find(|p| p.name == name)
    }

    /// Constants exported with the CSR map.
    pub fn constants(&self) -> BTreeMap<String, Value> {
        let mut constants = BTreeMap::new();
        constants.insert(
            "config_clock_frequency".to_string(),
            json!(self.config.sys_clk_freq as u64),
        );
        constants.insert("config_ident".to_string(), json!(self.config.ident));
        if let Some(Peripheral {
            core: Core::Sdram(c),
            ..
        }) = self.peripheral("sdram")
        {
            constants.insert("config_l2_size".to_string(), json!(c.l2_size));
        }
        if let Some(Peripheral {
            core: Core::Ethernet(c),
            ..
        }) = self.peripheral("ethmac")
        {
            let ip = c.local_ip.octets();
            for (i, octet) in ip.iter().enumerate() {
                constants.insert(format!("localip{}", i + 1), json!(octet));
            }
        }
        constants
    }

    /// The CSR map (`csr.json`).
    pub fn csr_json(&self) -> Value {
        self.bus.csr_json(&self.constants())
    }

    /// The full elaborated description (`soc.json`).
    pub fn to_json(&self) -> Result<Value> {
        let pins = self
            .platform
            .requests()
            .requested()
            .iter()
            .map(|b| (b.label(), b.pads()))
            .collect();
        let description = SocDescription {
            platform: &self.platform.name,
            device: self.platform.device.part(),
            ident: &self.config.ident,
            sys_clk_freq: self.config.sys_clk_freq,
            crg: &self.crg,
            clock_domains: &self.domains,
            peripherals: &self.peripherals,
            bus: &self.bus,
            pins,
            timing: &self.platform.timing,
        };
        Ok(serde_json::to_value(description)?)
    }
}

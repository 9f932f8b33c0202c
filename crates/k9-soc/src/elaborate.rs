//! Elaboration pipeline orchestrator.

use std::time::Instant;

use k9_platform::Platform;
use serde_json::Value;
use tracing::info;

use crate::config::SocConfig;
use crate::crg::Crg;
use crate::error::Result;
use crate::report::ElaborationReport;
use crate::soc::Soc;

/// Output of a successful elaboration.
#[derive(Debug)]
pub struct Elaboration {
    /// The composed system, owning the platform and its pin requests.
    pub soc: Soc,
    pub report: ElaborationReport,
}

impl Elaboration {
    pub fn platform(&self) -> &Platform {
        self.soc.platform()
    }

    /// `soc.json`.
    pub fn soc_json(&self) -> Result<Value> {
        self.soc.to_json()
    }

    /// `csr.json`.
    pub fn csr_json(&self) -> Value {
        self.soc.csr_json()
    }
}

/// Run the full elaboration:
/// validate -> CRG -> base SoC -> peripherals -> final checks -> report.
///
/// Peripherals are added in dependency order: uart, sdram, ethernet or
/// etherbone, video, SPI flash, LEDs, SD card, DNA. The first error aborts.
pub fn elaborate(platform: Platform, config: SocConfig) -> Result<Elaboration> {
    let start = Instant::now();

    // Stage 1: Configuration
    config.validate()?;

    // Stage 2: Clocks and reset
    let mut platform = platform;
    let crg = Crg::build(&mut platform, &config)?;

    // Stage 3: Base SoC
    let mut soc = Soc::new(platform, config.clone(), crg)?;

    // Stage 4: Peripherals
    if config.with_uart {
        soc.add_uart()?;
    }
    if config.with_sdram {
        soc.add_sdram()?;
    }
    if config.with_ethernet {
        soc.add_ethernet()?;
    }
    if config.with_etherbone {
        soc.add_etherbone()?;
    }
    if config.with_video_colorbars {
        soc.add_video_colorbars()?;
    }
    if config.with_spi_flash {
        soc.add_spi_flash()?;
    }
    if config.with_led_chaser {
        soc.add_led_chaser()?;
    }
    if config.with_sdcard {
        soc.add_sdcard()?;
    }
    if config.with_dna {
        soc.add_dna()?;
    }

    // Stage 5: Final checks
    soc.finalize()?;

    let duration_ms = start.elapsed().as_millis() as u64;
    let report = ElaborationReport::from_soc(&soc, duration_ms);
    info!(
        "elaborated {} peripherals on {} in {duration_ms} ms",
        report.peripherals.len(),
        report.target
    );

    Ok(Elaboration { soc, report })
}

//! Clock and reset generator.
//!
//! Derives every synchronous clock domain of the SoC from the board
//! oscillator through one PLL, and registers the matching timing constraints
//! on the platform.

use std::fmt;

use k9_platform::xdc::port_name;
use k9_platform::Platform;
use serde::Serialize;
use tracing::{debug, info};

use crate::clock::{ClockDomain, ClockSource, PllConfig, S7Pll, DEFAULT_MARGIN};
use crate::config::SocConfig;
use crate::error::{ElaborationError, Result};
use crate::periph::video::VideoTimings;

/// Reference clock of the input delay calibration block.
pub const IDELAY_REF_FREQ: f64 = 200e6;
/// Accepted IDELAYCTRL reference range.
pub const IDELAY_REF_RANGE: (f64, f64) = (190e6, 210e6);
/// Phase of the SDRAM clock relative to `sys`.
pub const SDRAM_CLK_PHASE: f64 = 90.0;

/// Hard blocks instantiated by the CRG besides the PLL.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    /// IDELAYCTRL calibrating the input delay lines.
    Idelayctrl { domain: String, ref_hz: f64 },
    /// DDR output register forwarding a clock to a pad.
    DdrOutput { domain: String, port: String },
}

/// Reset network of the PLL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrgReset {
    /// Board reset pad, if the board has one.
    pub pad: Option<String>,
    /// The pad is active low.
    pub active_low: bool,
}

impl fmt::Display for CrgReset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pad {
            Some(pad) if self.active_low => write!(f, "soc_rst | ~{pad}"),
            Some(pad) => write!(f, "soc_rst | {pad}"),
            None => f.write_str("soc_rst"),
        }
    }
}

/// The clock/reset generator of the SoC.
#[derive(Debug, Clone, Serialize)]
pub struct Crg {
    /// Port of the reference clock.
    pub clkin: String,
    pub clkin_hz: f64,
    pub reset: CrgReset,
    pub pll: PllConfig,
    pub domains: Vec<ClockDomain>,
    pub primitives: Vec<Primitive>,
}

impl Crg {
    /// Request the clock and reset pads, solve the PLL and create the domains.
    ///
    /// Domains, in PLL output order: `sys`, `idelay`, `hdmi`, `hdmi5x`, and
    /// `sys_ps` when SDRAM is enabled.
    pub fn build(platform: &mut Platform, config: &SocConfig) -> Result<Self> {
        info!("building CRG from {}", platform.default_clk_name);

        let clk_name = platform.default_clk_name.clone();
        let clk_binding = platform.request(&clk_name, 0)?;
        let clkin = port_name(&clk_binding);
        let clkin_hz = platform.default_clk_freq();

        let reset = if platform.io.contains("cpu_reset") {
            let pad = platform.request("cpu_reset", 0)?;
            CrgReset {
                pad: Some(port_name(&pad)),
                active_low: true,
            }
        } else {
            debug!("no cpu_reset on {}, PLL reset by the SoC only", platform.name);
            CrgReset {
                pad: None,
                active_low: false,
            }
        };

        let timings = VideoTimings::lookup(&config.video_timings).ok_or_else(|| {
            ElaborationError::config(
                "video_timings",
                format!("unknown video mode '{}'", config.video_timings),
            )
        })?;

        let mut pll = S7Pll::new(platform.device.speedgrade())?;
        pll.register_clkin(clkin_hz)?;
        pll.create_clkout("sys", config.sys_clk_freq, 0.0, DEFAULT_MARGIN)?;
        pll.create_clkout("idelay", IDELAY_REF_FREQ, 0.0, DEFAULT_MARGIN)?;
        pll.create_clkout("hdmi", timings.pix_clk, 0.0, 0.0)?;
        pll.create_clkout("hdmi5x", 5.0 * timings.pix_clk, 0.0, 0.0)?;
        if config.with_sdram {
            pll.create_clkout("sys_ps", config.sys_clk_freq, SDRAM_CLK_PHASE, DEFAULT_MARGIN)?;
        }
        let pll = pll.compute_config()?;

        let domains: Vec<ClockDomain> = pll
            .outputs
            .iter()
            .enumerate()
            .map(|(index, o)| ClockDomain {
                name: o.name.clone(),
                freq_hz: o.freq_hz,
                phase_deg: o.phase_deg,
                reset: format!("{}_rst", o.name),
                source: ClockSource::Pll {
                    index,
                    divide: o.divide,
                },
            })
            .collect();

        let mut primitives = Vec::new();

        let idelay = domains
            .iter()
            .find(|d| d.name == "idelay")
            .ok_or_else(|| ElaborationError::infeasible("idelay", "domain was not created"))?;
        let (min, max) = IDELAY_REF_RANGE;
        if !(min..=max).contains(&idelay.freq_hz) {
            return Err(ElaborationError::infeasible(
                "idelay",
                format!(
                    "IDELAYCTRL reference must be {:.0}-{:.0} MHz, got {:.3} MHz",
                    min / 1e6,
                    max / 1e6,
                    idelay.freq_hz / 1e6
                ),
            ));
        }
        primitives.push(Primitive::Idelayctrl {
            domain: idelay.name.clone(),
            ref_hz: idelay.freq_hz,
        });

        // The SoC reset crosses from sys back into the PLL input.
        platform.add_false_path_constraint("sys_clk", &clkin);
        platform.add_period_constraint(&clkin, platform.default_clk_period_ns);

        if config.with_sdram {
            let sdram_clock = platform.request("sdram_clock", 0)?;
            primitives.push(Primitive::DdrOutput {
                domain: "sys_ps".into(),
                port: port_name(&sdram_clock),
            });
        }

        for d in &domains {
            debug!("clock domain {d}");
        }

        Ok(Self {
            clkin,
            clkin_hz,
            reset,
            pll,
            domains,
            primitives,
        })
    }

    pub fn domain(&self, name: &str) -> Option<&ClockDomain> {
        self.domains.iter().find(|d| d.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k9() -> Platform {
        Platform::colorlight_k9plus_ext().unwrap()
    }

    #[test]
    fn default_domains() {
        let mut platform = k9();
        let crg = Crg::build(&mut platform, &SocConfig::default()).unwrap();
        let names: Vec<&str> = crg.domains.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["sys", "idelay", "hdmi", "hdmi5x", "sys_ps"]);
        assert_eq!(crg.domain("sys").unwrap().freq_hz, 100e6);
        assert_eq!(crg.domain("sys_ps").unwrap().phase_deg, 90.0);
        assert_eq!(crg.domain("idelay").unwrap().freq_hz, 200e6);
        assert_eq!(crg.reset.to_string(), "soc_rst | ~cpu_reset");
    }

    #[test]
    fn registers_constraints_and_pads() {
        let mut platform = k9();
        let crg = Crg::build(&mut platform, &SocConfig::default()).unwrap();
        assert!(platform.timing.has_false_path("sys_clk", "clk25"));
        assert_eq!(platform.timing.period_of("clk25"), Some(40.0));
        assert!(platform.requests().is_requested("clk25", 0));
        assert!(platform.requests().is_requested("cpu_reset", 0));
        assert!(platform.requests().is_requested("sdram_clock", 0));
        assert!(crg.primitives.contains(&Primitive::DdrOutput {
            domain: "sys_ps".into(),
            port: "sdram_clock".into(),
        }));
    }

    #[test]
    fn without_sdram_no_phase_shifted_clock() {
        let mut platform = k9();
        let config = SocConfig {
            with_sdram: false,
            ..Default::default()
        };
        let crg = Crg::build(&mut platform, &config).unwrap();
        assert!(crg.domain("sys_ps").is_none());
        assert!(!platform.requests().is_requested("sdram_clock", 0));
    }

    #[test]
    fn infeasible_sys_clock_fails_fast() {
        let mut platform = k9();
        let config = SocConfig {
            sys_clk_freq: 2e9,
            ..Default::default()
        };
        let err = Crg::build(&mut platform, &config).unwrap_err();
        assert!(matches!(err, ElaborationError::ClockInfeasible { .. }));
    }

    #[test]
    fn hd_video_mode_is_infeasible_from_25mhz() {
        let mut platform = k9();
        let config = SocConfig {
            video_timings: "1280x720@60Hz".into(),
            ..Default::default()
        };
        let err = Crg::build(&mut platform, &config).unwrap_err();
        match err {
            ElaborationError::ClockInfeasible { domain, .. } => assert_eq!(domain, "hdmi"),
            other => panic!("unexpected error: {other}"),
        }
    }
}

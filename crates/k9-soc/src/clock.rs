//! Clock domains and the 7-series PLL feasibility model.
//!
//! [`S7Pll`] mirrors the parameter space of the PLLE2_BASE primitive: one
//! input clock, a shared VCO set by an input divider and a feedback
//! multiplier, and up to six outputs each with its own integer divider and
//! phase offset. [`S7Pll::compute_config`] searches that space the same way
//! for every design, so a given set of requests always yields the same
//! dividers.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::error::{ElaborationError, Result};

/// Default tolerance between requested and achieved output frequency.
pub const DEFAULT_MARGIN: f64 = 1e-2;

const CLKIN_FREQ_RANGE: (f64, f64) = (19e6, 800e6);
const DIVCLK_DIVIDE_RANGE: (u32, u32) = (1, 56);
const CLKFBOUT_MULT_RANGE: (u32, u32) = (2, 64);
const CLKOUT_DIVIDE_RANGE: (u32, u32) = (1, 128);
const NCLKOUTS: usize = 6;

/// Where a clock domain's clock comes from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ClockSource {
    /// Output `index` of the CRG PLL.
    Pll { index: usize, divide: u32 },
    /// Recovered from a pad (e.g., an RGMII receive clock).
    Pad { binding: String },
}

/// A named synchronous clock domain.
///
/// Created once during elaboration and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClockDomain {
    pub name: String,
    /// Achieved frequency in Hz.
    pub freq_hz: f64,
    /// Phase offset in degrees, after quantization to the VCO step.
    pub phase_deg: f64,
    /// Reset net of the domain.
    pub reset: String,
    pub source: ClockSource,
}

impl ClockDomain {
    /// Net carrying the domain's clock (`sys` -> `sys_clk`).
    pub fn clk_net(&self) -> String {
        format!("{}_clk", self.name)
    }

    pub fn period_ns(&self) -> f64 {
        1e9 / self.freq_hz
    }
}

impl fmt::Display for ClockDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<8} {:>10.3} MHz", self.name, self.freq_hz / 1e6)?;
        if self.phase_deg != 0.0 {
            write!(f, " @ {:.3} deg", self.phase_deg)?;
        }
        match &self.source {
            ClockSource::Pll { index, divide } => write!(f, "  (pll clkout{index}, /{divide})"),
            ClockSource::Pad { binding } => write!(f, "  (pad {binding})"),
        }
    }
}

/// One requested PLL output.
#[derive(Debug, Clone, PartialEq)]
pub struct PllRequest {
    pub name: String,
    pub freq_hz: f64,
    pub phase_deg: f64,
    pub margin: f64,
}

/// One solved PLL output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PllOutput {
    pub name: String,
    pub divide: u32,
    pub freq_hz: f64,
    pub phase_deg: f64,
}

/// A feasible PLL configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PllConfig {
    pub clkin_hz: f64,
    pub divclk_divide: u32,
    pub clkfbout_mult: u32,
    pub vco_hz: f64,
    pub outputs: Vec<PllOutput>,
}

impl PllConfig {
    pub fn output(&self, name: &str) -> Option<&PllOutput> {
        self.outputs.iter().find(|o| o.name == name)
    }
}

/// 7-series PLLE2 model.
#[derive(Debug, Clone)]
pub struct S7Pll {
    speedgrade: i8,
    clkin_hz: Option<f64>,
    requests: Vec<PllRequest>,
}

impl S7Pll {
    /// A PLL for a device of the given speed grade (-1, -2 or -3).
    pub fn new(speedgrade: i8) -> Result<Self> {
        if !(-3..=-1).contains(&speedgrade) {
            return Err(ElaborationError::infeasible(
                "pll",
                format!("unsupported speed grade {speedgrade}"),
            ));
        }
        Ok(Self {
            speedgrade,
            clkin_hz: None,
            requests: Vec::new(),
        })
    }

    /// VCO operating range for the speed grade, in Hz.
    pub fn vco_freq_range(&self) -> (f64, f64) {
        match self.speedgrade {
            -1 => (800e6, 1600e6),
            -2 => (800e6, 1866e6),
            _ => (800e6, 2133e6),
        }
    }

    /// Phase-frequency detector range for the speed grade, in Hz.
    pub fn pfd_freq_range(&self) -> (f64, f64) {
        match self.speedgrade {
            -1 => (19e6, 450e6),
            -2 => (19e6, 500e6),
            _ => (19e6, 550e6),
        }
    }

    /// Register the reference clock.
    pub fn register_clkin(&mut self, freq_hz: f64) -> Result<()> {
        let (min, max) = CLKIN_FREQ_RANGE;
        if !(min..=max).contains(&freq_hz) {
            return Err(ElaborationError::infeasible(
                "pll",
                format!(
                    "input clock {:.3} MHz outside {:.0}-{:.0} MHz",
                    freq_hz / 1e6,
                    min / 1e6,
                    max / 1e6
                ),
            ));
        }
        self.clkin_hz = Some(freq_hz);
        Ok(())
    }

    /// Request an output clock.
    pub fn create_clkout(
        &mut self,
        name: &str,
        freq_hz: f64,
        phase_deg: f64,
        margin: f64,
    ) -> Result<()> {
        if self.requests.len() >= NCLKOUTS {
            return Err(ElaborationError::infeasible(
                name,
                format!("PLL has only {NCLKOUTS} outputs"),
            ));
        }
        if !(freq_hz > 0.0) {
            return Err(ElaborationError::infeasible(
                name,
                format!("{freq_hz} Hz is not a positive frequency"),
            ));
        }
        if phase_deg <= -360.0 || phase_deg >= 360.0 {
            return Err(ElaborationError::infeasible(
                name,
                format!("phase {phase_deg} deg outside (-360, 360)"),
            ));
        }
        self.requests.push(PllRequest {
            name: name.to_string(),
            freq_hz,
            phase_deg,
            margin,
        });
        Ok(())
    }

    pub fn requests(&self) -> &[PllRequest] {
        &self.requests
    }

    /// Find the first feasible configuration.
    ///
    /// Input dividers are tried in ascending order and feedback multipliers in
    /// descending order (highest VCO first). For each candidate VCO every
    /// output picks the smallest divider within its margin.
    pub fn compute_config(&self) -> Result<PllConfig> {
        let clkin_hz = self
            .clkin_hz
            .ok_or_else(|| ElaborationError::infeasible("pll", "no input clock registered"))?;
        let (vco_min, vco_max) = self.vco_freq_range();
        let (pfd_min, pfd_max) = self.pfd_freq_range();

        for divclk_divide in DIVCLK_DIVIDE_RANGE.0..=DIVCLK_DIVIDE_RANGE.1 {
            let pfd = clkin_hz / divclk_divide as f64;
            if pfd < pfd_min || pfd > pfd_max {
                continue;
            }
            for clkfbout_mult in (CLKFBOUT_MULT_RANGE.0..=CLKFBOUT_MULT_RANGE.1).rev() {
                let vco_hz = clkin_hz * clkfbout_mult as f64 / divclk_divide as f64;
                if vco_hz < vco_min || vco_hz > vco_max {
                    continue;
                }
                if let Some(outputs) = self.solve_outputs(vco_hz) {
                    let config = PllConfig {
                        clkin_hz,
                        divclk_divide,
                        clkfbout_mult,
                        vco_hz,
                        outputs,
                    };
                    debug!(
                        "pll: vco {:.3} MHz (mult {}, div {})",
                        vco_hz / 1e6,
                        clkfbout_mult,
                        divclk_divide
                    );
                    for o in &config.outputs {
                        debug!(
                            "pll:   {} {:.3} MHz /{} @ {:.3} deg",
                            o.name,
                            o.freq_hz / 1e6,
                            o.divide,
                            o.phase_deg
                        );
                    }
                    return Ok(config);
                }
            }
        }

        Err(self.explain_infeasible(clkin_hz))
    }

    fn solve_outputs(&self, vco_hz: f64) -> Option<Vec<PllOutput>> {
        self.requests
            .iter()
            .map(|r| {
                (CLKOUT_DIVIDE_RANGE.0..=CLKOUT_DIVIDE_RANGE.1).find_map(|divide| {
                    let freq_hz = vco_hz / divide as f64;
                    if (freq_hz - r.freq_hz).abs() > r.freq_hz * r.margin {
                        return None;
                    }
                    let step = 45.0 / divide as f64;
                    let phase_deg = (r.phase_deg / step).round() * step;
                    if phase_deg <= -360.0 || phase_deg >= 360.0 {
                        return None;
                    }
                    Some(PllOutput {
                        name: r.name.clone(),
                        divide,
                        freq_hz,
                        phase_deg,
                    })
                })
            })
            .collect()
    }

    /// Name the first output that no VCO frequency can serve.
    fn explain_infeasible(&self, clkin_hz: f64) -> ElaborationError {
        let (vco_min, vco_max) = self.vco_freq_range();
        let (pfd_min, pfd_max) = self.pfd_freq_range();
        let vcos: Vec<f64> = (DIVCLK_DIVIDE_RANGE.0..=DIVCLK_DIVIDE_RANGE.1)
            .filter(|d| (pfd_min..=pfd_max).contains(&(clkin_hz / *d as f64)))
            .flat_map(|d| {
                (CLKFBOUT_MULT_RANGE.0..=CLKFBOUT_MULT_RANGE.1)
                    .map(move |m| clkin_hz * m as f64 / d as f64)
            })
            .filter(|v| (vco_min..=vco_max).contains(v))
            .collect();

        let unreachable = self.requests.iter().find(|r| {
            !vcos.iter().any(|vco| {
                (CLKOUT_DIVIDE_RANGE.0..=CLKOUT_DIVIDE_RANGE.1)
                    .any(|d| (vco / d as f64 - r.freq_hz).abs() <= r.freq_hz * r.margin)
            })
        });

        match unreachable {
            Some(r) => ElaborationError::infeasible(
                &r.name,
                format!(
                    "{:.3} MHz (margin {}%) is not reachable from a {:.3} MHz input",
                    r.freq_hz / 1e6,
                    r.margin * 100.0,
                    clkin_hz / 1e6
                ),
            ),
            None => {
                let wanted: Vec<String> = self
                    .requests
                    .iter()
                    .map(|r| format!("{} {:.3} MHz", r.name, r.freq_hz / 1e6))
                    .collect();
                ElaborationError::infeasible(
                    &self
                        .requests
                        .last()
                        .map(|r| r.name.clone())
                        .unwrap_or_else(|| "pll".into()),
                    format!(
                        "no single VCO frequency serves all outputs together ({})",
                        wanted.join(", ")
                    ),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k9_pll() -> S7Pll {
        let mut pll = S7Pll::new(-1).unwrap();
        pll.register_clkin(25e6).unwrap();
        pll
    }

    #[test]
    fn sys_100mhz_from_25mhz() {
        let mut pll = k9_pll();
        pll.create_clkout("sys", 100e6, 0.0, DEFAULT_MARGIN).unwrap();
        let config = pll.compute_config().unwrap();
        assert_eq!(config.clkfbout_mult, 64);
        assert_eq!(config.divclk_divide, 1);
        assert_eq!(config.vco_hz, 1600e6);
        assert_eq!(config.output("sys").unwrap().freq_hz, 100e6);
        assert_eq!(config.output("sys").unwrap().divide, 16);
    }

    #[test]
    fn full_crg_set_settles_on_1ghz_vco() {
        let mut pll = k9_pll();
        pll.create_clkout("sys", 100e6, 0.0, DEFAULT_MARGIN).unwrap();
        pll.create_clkout("idelay", 200e6, 0.0, DEFAULT_MARGIN).unwrap();
        pll.create_clkout("hdmi", 25e6, 0.0, 0.0).unwrap();
        pll.create_clkout("hdmi5x", 125e6, 0.0, 0.0).unwrap();
        pll.create_clkout("sys_ps", 100e6, 90.0, DEFAULT_MARGIN).unwrap();
        let config = pll.compute_config().unwrap();
        assert_eq!(config.vco_hz, 1000e6);
        assert_eq!(config.clkfbout_mult, 40);
        let divides: Vec<u32> = config.outputs.iter().map(|o| o.divide).collect();
        assert_eq!(divides, vec![10, 5, 40, 8, 10]);
        assert_eq!(config.output("sys_ps").unwrap().phase_deg, 90.0);
    }

    #[test]
    fn phase_is_quantized() {
        let mut pll = k9_pll();
        pll.create_clkout("sys_ps", 100e6, 91.0, DEFAULT_MARGIN).unwrap();
        let config = pll.compute_config().unwrap();
        // Divider 16 gives a 2.8125 degree step.
        assert_eq!(config.output("sys_ps").unwrap().phase_deg, 90.0);
    }

    #[test]
    fn pixel_clock_of_720p_is_infeasible() {
        let mut pll = k9_pll();
        pll.create_clkout("hdmi", 74.25e6, 0.0, 0.0).unwrap();
        pll.create_clkout("hdmi5x", 371.25e6, 0.0, 0.0).unwrap();
        let err = pll.compute_config().unwrap_err();
        match err {
            ElaborationError::ClockInfeasible { domain, .. } => assert_eq!(domain, "hdmi"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn combination_infeasible_names_detail() {
        let mut pll = k9_pll();
        // Each alone is reachable, together they need incompatible VCOs.
        pll.create_clkout("a", 100e6, 0.0, 0.0).unwrap();
        pll.create_clkout("b", 30e6, 0.0, 0.0).unwrap();
        pll.create_clkout("c", 33e6, 0.0, 0.0).unwrap();
        let err = pll.compute_config().unwrap_err();
        assert!(err.to_string().contains("no single VCO"), "{err}");
    }

    #[test]
    fn output_limit() {
        let mut pll = k9_pll();
        for i in 0..6 {
            pll.create_clkout(&format!("o{i}"), 100e6, 0.0, DEFAULT_MARGIN)
                .unwrap();
        }
        assert!(pll.create_clkout("o6", 100e6, 0.0, DEFAULT_MARGIN).is_err());
    }

    #[test]
    fn input_range_and_phase_bounds() {
        let mut pll = S7Pll::new(-1).unwrap();
        assert!(pll.register_clkin(10e6).is_err());
        assert!(pll.compute_config().is_err());
        pll.register_clkin(25e6).unwrap();
        assert!(pll.create_clkout("x", 100e6, 360.0, DEFAULT_MARGIN).is_err());
        assert!(pll.create_clkout("x", 100e6, -360.0, DEFAULT_MARGIN).is_err());
        assert!(S7Pll::new(-4).is_err());
    }

    #[test]
    fn faster_grades_reach_higher_vco() {
        let solve = |speedgrade| {
            let mut pll = S7Pll::new(speedgrade).unwrap();
            pll.register_clkin(50e6).unwrap();
            pll.create_clkout("fast", 925e6, 0.0, 0.0).unwrap();
            pll.compute_config().unwrap()
        };
        let fast = solve(-2);
        assert_eq!((fast.vco_hz, fast.divclk_divide, fast.clkfbout_mult), (1850e6, 1, 37));
        assert_eq!(fast.outputs[0].divide, 2);
        let slow = solve(-1);
        assert_eq!((slow.vco_hz, slow.divclk_divide, slow.clkfbout_mult), (925e6, 2, 37));
    }
}

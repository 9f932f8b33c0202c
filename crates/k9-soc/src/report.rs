//! Elaboration report summarizing the composed SoC.

use std::fmt;

use serde::Serialize;

use crate::bus::{BusMaster, Irq, Region};
use crate::clock::{ClockDomain, ClockSource};
use crate::soc::Soc;

/// One line per instantiated peripheral.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeripheralSummary {
    pub name: String,
    pub summary: String,
}

/// Summary report of one elaboration.
#[derive(Debug, Clone, Serialize)]
pub struct ElaborationReport {
    /// Platform name.
    pub target: String,
    /// FPGA part.
    pub device: String,
    pub ident: String,
    /// Total elaboration duration in milliseconds.
    pub duration_ms: u64,
    /// PLL input frequency.
    pub clkin_hz: f64,
    pub vco_hz: f64,
    pub clkfbout_mult: u32,
    pub divclk_divide: u32,
    /// Every clock domain, PLL outputs first.
    pub clock_domains: Vec<ClockDomain>,
    pub peripherals: Vec<PeripheralSummary>,
    pub regions: Vec<Region>,
    /// Number of allocated CSR pages.
    pub csr_pages: usize,
    pub irqs: Vec<Irq>,
    pub masters: Vec<BusMaster>,
    /// Bindings requested from the pin map.
    pub pins_requested: usize,
    /// Physical pads behind the requested bindings.
    pub pads_used: usize,
    pub false_paths: usize,
}

impl ElaborationReport {
    pub fn from_soc(soc: &Soc, duration_ms: u64) -> Self {
        let platform = soc.platform();
        let requested = platform.requests().requested();
        let pll = &soc.crg().pll;
        Self {
            target: platform.name.clone(),
            device: platform.device.part().to_string(),
            ident: soc.config().ident.clone(),
            duration_ms,
            clkin_hz: pll.clkin_hz,
            vco_hz: pll.vco_hz,
            clkfbout_mult: pll.clkfbout_mult,
            divclk_divide: pll.divclk_divide,
            clock_domains: soc.clock_domains().to_vec(),
            peripherals: soc
                .peripherals()
                .iter()
                .map(|p| PeripheralSummary {
                    name: p.name.clone(),
                    summary: p.core.to_string(),
                })
                .collect(),
            regions: soc.bus().regions().to_vec(),
            csr_pages: soc.bus().csrs().len(),
            irqs: soc.bus().irqs().to_vec(),
            masters: soc.bus().masters().to_vec(),
            pins_requested: requested.len(),
            pads_used: requested.iter().map(|b| b.pads().len()).sum(),
            false_paths: platform.timing.false_paths.len(),
        }
    }
}

impl fmt::Display for ElaborationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Elaboration Report ===")?;
        writeln!(f, "Target: {} ({})", self.target, self.device)?;
        writeln!(f, "Ident: {}", self.ident)?;
        writeln!(f, "Duration: {} ms", self.duration_ms)?;
        writeln!(f)?;

        writeln!(f, "--- Clocks ---")?;
        writeln!(
            f,
            "  PLL: {:.3} MHz in, VCO {:.3} MHz (mult {}, div {})",
            self.clkin_hz / 1e6,
            self.vco_hz / 1e6,
            self.clkfbout_mult,
            self.divclk_divide,
        )?;
        for d in &self.clock_domains {
            let source = match &d.source {
                ClockSource::Pll { index, divide } => format!("CLKOUT{index} /{divide}"),
                ClockSource::Pad { binding } => format!("pad {binding}"),
            };
            writeln!(
                f,
                "  {:<8} {:>9.3} MHz {:>5.1} deg  {}",
                d.name,
                d.freq_hz / 1e6,
                d.phase_deg,
                source
            )?;
        }

        writeln!(f)?;
        writeln!(f, "--- Peripherals ({}) ---", self.peripherals.len())?;
        for p in &self.peripherals {
            writeln!(f, "  {:<16} {}", p.name, p.summary)?;
        }

        writeln!(f)?;
        writeln!(f, "--- Bus ---")?;
        for r in &self.regions {
            writeln!(
                f,
                "  {:<10} {:#010x} - {:#010x}{}",
                r.name,
                r.origin,
                r.last(),
                if r.read_only { " (ro)" } else { "" }
            )?;
        }
        writeln!(f, "  CSR pages: {}", self.csr_pages)?;
        if !self.irqs.is_empty() {
            let irqs: Vec<String> = self
                .irqs
                .iter()
                .map(|i| format!("{}={}", i.name, i.number))
                .collect();
            writeln!(f, "  IRQs: {}", irqs.join(", "))?;
        }
        for m in &self.masters {
            writeln!(f, "  Master: {} ({})", m.name, m.detail)?;
        }

        writeln!(f)?;
        writeln!(f, "--- Pins ---")?;
        writeln!(
            f,
            "  {} bindings requested, {} pads used",
            self.pins_requested, self.pads_used
        )?;
        writeln!(f, "  {} false paths", self.false_paths)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_display() {
        let report = ElaborationReport {
            target: "colorlight_k9plus_ext".into(),
            device: "xc7a50tfgg484-1".into(),
            ident: "test".into(),
            duration_ms: 3,
            clkin_hz: 25e6,
            vco_hz: 1000e6,
            clkfbout_mult: 40,
            divclk_divide: 1,
            clock_domains: vec![ClockDomain {
                name: "sys".into(),
                freq_hz: 100e6,
                phase_deg: 0.0,
                reset: "sys_rst".into(),
                source: ClockSource::Pll { index: 0, divide: 10 },
            }],
            peripherals: vec![PeripheralSummary {
                name: "uart".into(),
                summary: "115200 baud".into(),
            }],
            regions: Vec::new(),
            csr_pages: 4,
            irqs: vec![Irq {
                name: "timer0".into(),
                number: 0,
            }],
            masters: Vec::new(),
            pins_requested: 3,
            pads_used: 4,
            false_paths: 1,
        };

        let output = format!("{report}");
        assert!(output.contains("Elaboration Report"));
        assert!(output.contains("VCO 1000.000 MHz (mult 40, div 1)"));
        assert!(output.contains("CLKOUT0 /10"));
        assert!(output.contains("timer0=0"));
        assert!(output.contains("3 bindings requested, 4 pads used"));
    }
}

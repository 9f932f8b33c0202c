//! SDR SDRAM: module geometry and timings, and the generic SDR PHY.

use k9_platform::PinBinding;
use serde::Serialize;

use super::{expect_width, ns_to_cycles};
use crate::error::Result;

/// Geometry and datasheet timings of an SDRAM chip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SdramModule {
    pub name: &'static str,
    pub memtype: &'static str,
    pub nbanks: u32,
    pub nrows: u32,
    pub ncols: u32,
    /// Data bus width in bits.
    pub databits: u32,
    pub trp_ns: f64,
    pub trcd_ns: f64,
    pub twr_ns: f64,
    pub trfc_ns: f64,
    pub tras_ns: f64,
    pub trrd_ns: f64,
    /// Average refresh interval.
    pub trefi_ns: f64,
    pub twtr_ck: u32,
    pub tccd_ck: u32,
}

/// Elite M12L64322A, 512K x 32 x 4 banks.
pub const M12L64322A: SdramModule = SdramModule {
    name: "M12L64322A",
    memtype: "SDR",
    nbanks: 4,
    nrows: 2048,
    ncols: 256,
    databits: 32,
    trp_ns: 15.0,
    trcd_ns: 15.0,
    twr_ns: 15.0,
    trfc_ns: 55.0,
    tras_ns: 40.0,
    trrd_ns: 10.0,
    trefi_ns: 64e6 / 4096.0,
    twtr_ck: 2,
    tccd_ck: 1,
};

impl SdramModule {
    pub fn size_bytes(&self) -> u64 {
        self.nbanks as u64 * self.nrows as u64 * self.ncols as u64 * (self.databits / 8) as u64
    }

    pub fn rowbits(&self) -> u32 {
        self.nrows.ilog2()
    }

    pub fn colbits(&self) -> u32 {
        self.ncols.ilog2()
    }

    pub fn bankbits(&self) -> u32 {
        self.nbanks.ilog2()
    }

    /// Timings in controller cycles at `clk_freq`, for a 1:1 PHY.
    pub fn timings_at(&self, clk_freq: f64) -> SdramTimings {
        SdramTimings {
            trp: ns_to_cycles(self.trp_ns, clk_freq),
            trcd: ns_to_cycles(self.trcd_ns, clk_freq),
            twr: ns_to_cycles(self.twr_ns, clk_freq),
            trfc: ns_to_cycles(self.trfc_ns, clk_freq),
            tras: ns_to_cycles(self.tras_ns, clk_freq),
            trrd: ns_to_cycles(self.trrd_ns, clk_freq).max(1),
            trefi: ns_to_cycles(self.trefi_ns, clk_freq),
            twtr: self.twtr_ck,
            tccd: self.tccd_ck,
        }
    }
}

/// Controller timings in cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SdramTimings {
    pub trp: u32,
    pub trcd: u32,
    pub twr: u32,
    pub trfc: u32,
    pub tras: u32,
    pub trrd: u32,
    pub trefi: u32,
    pub twtr: u32,
    pub tccd: u32,
}

/// Settings of the generic SDR PHY.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhySettings {
    pub phytype: &'static str,
    /// Controller to DRAM clock ratio.
    pub rate: &'static str,
    pub databits: u32,
    pub nphases: u32,
    pub cl: u32,
    pub read_latency: u32,
    pub write_latency: u32,
}

/// Generic SDR PHY at 1:1 with CAS latency 2.
pub fn gensdrphy(databits: u32) -> PhySettings {
    let cl = 2;
    PhySettings {
        phytype: "GENSDRPHY",
        rate: "1:1",
        databits,
        nphases: 1,
        cl,
        read_latency: cl,
        write_latency: 0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SdramCore {
    pub module: SdramModule,
    pub phy: PhySettings,
    pub timings: SdramTimings,
    /// Address pads driven by the PHY.
    pub address_width: usize,
    pub l2_size: u64,
}

/// Check the pads against the module and derive controller settings.
pub fn sdram(
    pads: &PinBinding,
    module: SdramModule,
    sys_clk_freq: f64,
    l2_size: u64,
) -> Result<SdramCore> {
    let rowbits = module.rowbits() as usize;
    let address_width = expect_width(
        pads,
        "a",
        |w| w >= rowbits && w >= module.colbits() as usize,
        &format!("at least {rowbits}"),
    )?;
    let databits = module.databits as usize;
    expect_width(pads, "dq", |w| w == databits, &databits.to_string())?;
    let bankbits = module.bankbits() as usize;
    expect_width(pads, "ba", |w| w == bankbits, &bankbits.to_string())?;
    for strobe in ["we_n", "ras_n", "cas_n"] {
        expect_width(pads, strobe, |w| w == 1, "1")?;
    }

    Ok(SdramCore {
        phy: gensdrphy(module.databits),
        timings: module.timings_at(sys_clk_freq),
        module,
        address_width,
        l2_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use k9_platform::Platform;

    #[test]
    fn m12l64322a_geometry() {
        assert_eq!(M12L64322A.size_bytes(), 8 << 20);
        assert_eq!(M12L64322A.rowbits(), 11);
        assert_eq!(M12L64322A.colbits(), 8);
        assert_eq!(M12L64322A.bankbits(), 2);
    }

    #[test]
    fn timings_at_100mhz() {
        let t = M12L64322A.timings_at(100e6);
        assert_eq!((t.trp, t.trcd, t.twr, t.trfc, t.tras), (2, 2, 2, 6, 4));
        assert_eq!(t.trefi, 1563);
        assert_eq!(t.trrd, 1);
    }

    #[test]
    fn k9plus_pads_fit_the_module() {
        let p = Platform::colorlight_k9plus_ext().unwrap();
        let core = sdram(p.io.lookup("sdram", 0).unwrap(), M12L64322A, 100e6, 8192).unwrap();
        assert_eq!(core.address_width, 11);
        assert_eq!(core.phy.databits, 32);
        assert_eq!(core.phy.cl, 2);
    }

    #[test]
    fn narrow_data_bus_rejected() {
        let pads = PinBinding::subsignals(
            "sdram",
            0,
            vec![
                k9_platform::Subsignal::new("a", "A1 A2 A3 A4 A5 A6 A7 A8 A9 A10 A11"),
                k9_platform::Subsignal::new("dq", "B1 B2 B3 B4 B5 B6 B7 B8"),
                k9_platform::Subsignal::new("ba", "C1 C2"),
            ],
        );
        assert!(sdram(&pads, M12L64322A, 100e6, 8192).is_err());
    }
}

//! 7-series device DNA reader.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DnaCore {
    pub bits: u32,
    pub clk_divider: u32,
}

pub fn dna() -> DnaCore {
    DnaCore {
        bits: 57,
        clk_divider: 2,
    }
}

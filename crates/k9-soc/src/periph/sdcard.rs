//! SD card in native 4-bit (or 1-bit) mode with DMA.

use k9_platform::PinBinding;
use serde::Serialize;

use super::expect_width;
use crate::error::Result;

/// Initialization clock of the card interface.
pub const SDCARD_INIT_CLK_FREQ: f64 = 400e3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SdcardCore {
    pub data_width: usize,
    /// Card clock divider during initialization.
    pub init_clk_divider: u32,
    pub with_dma: bool,
}

pub fn sdcard(pads: &PinBinding, sys_clk_freq: f64) -> Result<SdcardCore> {
    let data_width = expect_width(pads, "data", |w| w == 4 || w == 1, "1 or 4")?;
    expect_width(pads, "cmd", |w| w == 1, "1")?;
    expect_width(pads, "clk", |w| w == 1, "1")?;
    Ok(SdcardCore {
        data_width,
        init_clk_divider: (sys_clk_freq / SDCARD_INIT_CLK_FREQ).ceil() as u32,
        with_dma: true,
    })
}

//! Serial console.

use k9_platform::PinBinding;
use serde::Serialize;

use super::expect_width;
use crate::error::Result;

pub const DEFAULT_BAUDRATE: u32 = 115_200;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UartCore {
    pub baudrate: u32,
    /// Phase accumulator increment per system clock cycle.
    pub tuning_word: u32,
}

/// Accumulator increment for `baudrate` at `sys_clk_freq`: `baud * 2^32 / f`.
pub fn tuning_word(baudrate: u32, sys_clk_freq: f64) -> u32 {
    (baudrate as f64 / sys_clk_freq * 4294967296.0) as u32
}

pub fn uart(pads: &PinBinding, sys_clk_freq: f64) -> Result<UartCore> {
    expect_width(pads, "tx", |w| w == 1, "1")?;
    expect_width(pads, "rx", |w| w == 1, "1")?;
    Ok(UartCore {
        baudrate: DEFAULT_BAUDRATE,
        tuning_word: tuning_word(DEFAULT_BAUDRATE, sys_clk_freq),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuning_word_at_100mhz() {
        assert_eq!(tuning_word(115_200, 100e6), 4_947_802);
        assert_eq!(tuning_word(1_000_000, 50e6), 85_899_345);
    }
}

//! Memory-mapped SPI NOR flash.

use k9_platform::PinBinding;
use serde::Serialize;

use super::expect_width;
use crate::config::SpiFlashMode;
use crate::error::Result;

/// A SPI NOR read command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadOpcode {
    pub name: &'static str,
    pub code: u8,
    pub dummy_cycles: u32,
    /// Data lines used by the transfer.
    pub width: u32,
}

pub const FAST_READ: ReadOpcode = ReadOpcode {
    name: "READ_1_1_1_FAST",
    code: 0x0b,
    dummy_cycles: 8,
    width: 1,
};

pub const READ_1_1_4: ReadOpcode = ReadOpcode {
    name: "READ_1_1_4",
    code: 0x6b,
    dummy_cycles: 8,
    width: 4,
};

/// Macronix MX25L12833F, 128 Mbit.
pub const MX25L12833F: &str = "MX25L12833F";
pub const MX25L12833F_SIZE: u64 = 16 << 20;
pub const MX25L12833F_PAGE_SIZE: u32 = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpiFlashCore {
    pub module: &'static str,
    pub size_bytes: u64,
    pub page_size: u32,
    pub mode: SpiFlashMode,
    pub read_opcode: ReadOpcode,
    /// PHY to flash clock ratio.
    pub rate: &'static str,
}

pub fn spi_flash(pads: &PinBinding, mode: SpiFlashMode) -> Result<SpiFlashCore> {
    expect_width(pads, "cs_n", |w| w == 1, "1")?;
    expect_width(pads, "clk", |w| w == 1, "1")?;
    let read_opcode = match mode {
        SpiFlashMode::X4 => {
            expect_width(pads, "dq", |w| w == 4, "4")?;
            READ_1_1_4
        }
        SpiFlashMode::X1 => {
            expect_width(pads, "mosi", |w| w == 1, "1")?;
            expect_width(pads, "miso", |w| w == 1, "1")?;
            FAST_READ
        }
    };
    Ok(SpiFlashCore {
        module: MX25L12833F,
        size_bytes: MX25L12833F_SIZE,
        page_size: MX25L12833F_PAGE_SIZE,
        mode,
        read_opcode,
        rate: "1:2",
    })
}

//! Built-in board: Colorlight K9+ with the "ext" carrier.
//!
//! Artix-7 `xc7a50tfgg484-1`, 25 MHz oscillator, 8 MiB SDR SDRAM
//! (M12L64322A), two RGMII Ethernet PHYs (B50612D) sharing one MDIO bus,
//! SPI configuration flash, micro-SD slot and three usable LEDs.

use crate::error::Result;
use crate::io::{IoStandard, PinBinding, Subsignal};
use crate::platform::Platform;

pub const K9PLUS_NAME: &str = "colorlight_k9plus_ext";
pub const K9PLUS_PART: &str = "xc7a50tfgg484-1";
pub const K9PLUS_CABLE: &str = "ch347_jtag";

fn io(b: PinBinding) -> PinBinding {
    b.with_iostandard(IoStandard::lvcmos33())
}

fn k9plus_io() -> Vec<PinBinding> {
    vec![
        // Clk / Rst.
        io(PinBinding::pins("clk25", 0, "W19")),
        io(PinBinding::pins("cpu_reset", 0, "P16")),
        // Leds.
        io(PinBinding::pins("user_led", 0, "V18")),
        io(PinBinding::pins("user_led", 1, "P17")),
        io(PinBinding::pins("user_led", 2, "V20")),
        io(PinBinding::pins("user_led", 3, "V22"))
            .disabled_because("V22 is the SPI flash clock"),
        io(PinBinding::pins("user_led", 4, "U21")).disabled_because("disabled on the ext carrier"),
        // Serial.
        io(PinBinding::subsignals(
            "serial",
            0,
            vec![Subsignal::new("tx", "V17"), Subsignal::new("rx", "R16")],
        )),
        // SD card.
        io(PinBinding::subsignals(
            "sdcard",
            0,
            vec![
                Subsignal::new("data", "P6 P5 T5 T4").with_misc("PULLUP True"),
                Subsignal::new("cmd", "R4").with_misc("PULLUP True"),
                Subsignal::new("clk", "N5"),
            ],
        ))
        .with_misc("SLEW=FAST"),
        // RGMII Ethernet (B50612D), PHY 0.
        io(PinBinding::subsignals(
            "eth_clocks",
            0,
            vec![Subsignal::new("tx", "W4"), Subsignal::new("rx", "V4")],
        )),
        io(PinBinding::subsignals(
            "eth",
            0,
            vec![
                Subsignal::new("rst_n", "W22"),
                Subsignal::new("mdio", "Y22"),
                Subsignal::new("mdc", "W21"),
                Subsignal::new("rx_ctl", "AB18"),
                Subsignal::new("rx_data", "AA18 Y19 AA19 AB20"),
                Subsignal::new("tx_ctl", "Y4"),
                Subsignal::new("tx_data", "AA3 AA4 AB5 AA5"),
            ],
        ))
        .with_alternate_group("eth-mdio"),
        // RGMII Ethernet (B50612D), PHY 1.
        io(PinBinding::subsignals(
            "eth_clocks",
            1,
            vec![Subsignal::new("tx", "W20"), Subsignal::new("rx", "Y18")],
        )),
        io(PinBinding::subsignals(
            "eth",
            1,
            vec![
                Subsignal::new("rst_n", "W22"),
                Subsignal::new("mdio", "Y22"),
                Subsignal::new("mdc", "W21"),
                Subsignal::new("rx_ctl", "AA1"),
                Subsignal::new("rx_data", "AB1 AB2 Y3 AB3"),
                Subsignal::new("tx_ctl", "AA20"),
                Subsignal::new("tx_data", "AB21 AA21 AB22 Y21"),
            ],
        ))
        .with_alternate_group("eth-mdio"),
        // SPI flash.
        io(PinBinding::subsignals(
            "spiflash",
            0,
            vec![
                Subsignal::new("cs_n", "T19"),
                Subsignal::new("clk", "V22"),
                Subsignal::new("mosi", "P22"),
                Subsignal::new("miso", "R22"),
                Subsignal::new("wp", "P21"),
                Subsignal::new("hold", "R21"),
            ],
        ))
        .with_alternate_group("spiflash"),
        io(PinBinding::subsignals(
            "spiflash4x",
            0,
            vec![
                Subsignal::new("cs_n", "T19"),
                Subsignal::new("clk", "V22"),
                Subsignal::new("dq", "P22 R22 P21 R21"),
            ],
        ))
        .with_alternate_group("spiflash"),
        // SDR SDRAM (M12L64322A). A11 is routed but not connected on the chip;
        // cs_n, cke and dm are strapped on the board.
        io(PinBinding::pins("sdram_clock", 0, "C19")),
        io(PinBinding::subsignals(
            "sdram",
            0,
            vec![
                Subsignal::new("a", "F14 D14 E14 E17 D19 F18 D17 F19 E18 E16 F15"),
                Subsignal::new(
                    "dq",
                    "A13 A19 B13 A20 C13 C18 B18 A18 \
                     D22 E19 E21 F21 E22 F20 G22 G21 \
                     A14 B17 C17 A15 B16 B15 A16 C15 \
                     A21 C20 B21 C22 B22 D20 B20 D21",
                ),
                Subsignal::new("we_n", "C14"),
                Subsignal::new("ras_n", "F13"),
                Subsignal::new("cas_n", "D16"),
                Subsignal::new("ba", "F16 D15"),
            ],
        ))
        .with_misc("SLEWRATE=FAST"),
    ]
}

impl Platform {
    /// Colorlight K9+ on the "ext" carrier board.
    pub fn colorlight_k9plus_ext() -> Result<Self> {
        let mut p = Self::new(K9PLUS_NAME, K9PLUS_PART, k9plus_io(), Vec::new())?;
        p.default_clk_name = "clk25".into();
        p.default_clk_period_ns = 1e9 / 25e6;
        p.programmer_cable = K9PLUS_CABLE.into();
        p.bitstream_commands = vec![
            "set_property BITSTREAM.CONFIG.SPI_BUSWIDTH 1 [current_design]".into(),
            "set_property CONFIG_MODE SPIx1 [current_design]".into(),
            "set_property BITSTREAM.CONFIG.CONFIGRATE 50 [current_design]".into(),
            "set_property BITSTREAM.CONFIG.SPI_32BIT_ADDR NO [current_design]".into(),
        ];
        p.additional_commands = vec![
            "write_cfgmem -force -format bin -interface spix1 -size 16 \
             -loadbit \"up 0x0 {build_name}.bit\" -file {build_name}.bin"
                .into(),
        ];
        Ok(p)
    }
}

//! Peripheral configuration record.
//!
//! Supplied once before elaboration and never mutated afterwards. Loaded from
//! the `[soc]` table of a project manifest, then overridden by command-line
//! flags.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ElaborationError, Result};
use crate::periph::video::VideoTimings;

/// SPI flash bus width.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpiFlashMode {
    #[serde(rename = "1x")]
    X1,
    #[default]
    #[serde(rename = "4x")]
    X4,
}

impl SpiFlashMode {
    /// Pin group carrying the flash in this mode.
    pub fn binding_name(self) -> &'static str {
        match self {
            SpiFlashMode::X1 => "spiflash",
            SpiFlashMode::X4 => "spiflash4x",
        }
    }
}

impl FromStr for SpiFlashMode {
    type Err = ElaborationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1x" => Ok(SpiFlashMode::X1),
            "4x" => Ok(SpiFlashMode::X4),
            _ => Err(ElaborationError::config(
                "spi_flash_mode",
                format!("'{s}' is not one of 1x, 4x"),
            )),
        }
    }
}

impl fmt::Display for SpiFlashMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpiFlashMode::X1 => f.write_str("1x"),
            SpiFlashMode::X4 => f.write_str("4x"),
        }
    }
}

/// Which optional peripherals are present, and their parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocConfig {
    /// System clock frequency in Hz.
    pub sys_clk_freq: f64,
    /// Identification string stored in the SoC.
    pub ident: String,
    /// External SDR SDRAM as main RAM.
    pub with_sdram: bool,
    /// Integrated main RAM size in bytes (0 = none).
    pub integrated_main_ram_size: u64,
    /// L2 cache size in front of the SDRAM, in bytes.
    pub l2_size: u64,
    pub with_ethernet: bool,
    pub with_etherbone: bool,
    /// Ethernet PHY selector (0 or 1).
    pub eth_port: u32,
    /// Etherbone/Ethernet IP address.
    pub eth_ip: Ipv4Addr,
    pub eth_dynamic_ip: bool,
    pub with_led_chaser: bool,
    pub with_spi_flash: bool,
    pub spi_flash_mode: SpiFlashMode,
    pub with_sdcard: bool,
    pub with_video_colorbars: bool,
    /// Video mode name, e.g. `640x480@60Hz`.
    pub video_timings: String,
    pub with_uart: bool,
    /// 7-series device DNA reader.
    pub with_dna: bool,
}

impl Default for SocConfig {
    fn default() -> Self {
        Self {
            sys_clk_freq: 100e6,
            ident: "LiteX SoC on Colorlight K9+".into(),
            with_sdram: true,
            integrated_main_ram_size: 0,
            l2_size: 8192,
            with_ethernet: false,
            with_etherbone: false,
            eth_port: 0,
            eth_ip: Ipv4Addr::new(192, 168, 1, 50),
            eth_dynamic_ip: false,
            with_led_chaser: true,
            with_spi_flash: false,
            spi_flash_mode: SpiFlashMode::X4,
            with_sdcard: true,
            with_video_colorbars: false,
            video_timings: "640x480@60Hz".into(),
            with_uart: true,
            with_dna: false,
        }
    }
}

impl SocConfig {
    /// Reject invalid or conflicting option combinations.
    ///
    /// Runs before any pin is requested or clock is created.
    pub fn validate(&self) -> Result<()> {
        if self.with_ethernet && self.with_etherbone {
            return Err(ElaborationError::config(
                "with_etherbone",
                "Ethernet and Etherbone share one PHY and are mutually exclusive",
            ));
        }
        if self.with_etherbone && self.eth_dynamic_ip {
            return Err(ElaborationError::config(
                "eth_dynamic_ip",
                "Etherbone requires a static IP address",
            ));
        }
        if self.eth_port > 1 {
            return Err(ElaborationError::config(
                "eth_port",
                format!("port {} does not exist (expected 0 or 1)", self.eth_port),
            ));
        }
        if !(self.sys_clk_freq > 0.0) {
            return Err(ElaborationError::config(
                "sys_clk_freq",
                format!("{} Hz is not a positive frequency", self.sys_clk_freq),
            ));
        }
        if self.with_sdram && self.integrated_main_ram_size > 0 {
            return Err(ElaborationError::config(
                "integrated_main_ram_size",
                "main RAM is already provided by the SDRAM",
            ));
        }
        if VideoTimings::lookup(&self.video_timings).is_none() {
            return Err(ElaborationError::config(
                "video_timings",
                format!(
                    "unknown video mode '{}' (known: {})",
                    self.video_timings,
                    VideoTimings::names().join(", ")
                ),
            ));
        }
        if self.with_sdram && !self.l2_size.is_power_of_two() {
            return Err(ElaborationError::config(
                "l2_size",
                format!("{} is not a power of two", self.l2_size),
            ));
        }
        Ok(())
    }

    /// Whether an Ethernet PHY is instantiated (for a MAC or a bridge).
    pub fn with_eth_phy(&self) -> bool {
        self.with_ethernet || self.with_etherbone
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option_of(err: ElaborationError) -> String {
        match err {
            ElaborationError::Config { option, .. } => option,
            other => panic!("expected a configuration error, got {other}"),
        }
    }

    #[test]
    fn defaults_are_valid() {
        let config = SocConfig::default();
        config.validate().unwrap();
        assert_eq!(config.sys_clk_freq, 100e6);
        assert_eq!(config.eth_ip, Ipv4Addr::new(192, 168, 1, 50));
        assert!(config.with_sdram && config.with_sdcard && config.with_led_chaser);
        assert!(!config.with_eth_phy());
    }

    #[test]
    fn ethernet_and_etherbone_conflict() {
        let config = SocConfig {
            with_ethernet: true,
            with_etherbone: true,
            ..Default::default()
        };
        assert_eq!(option_of(config.validate().unwrap_err()), "with_etherbone");
    }

    #[test]
    fn etherbone_needs_static_ip() {
        let config = SocConfig {
            with_etherbone: true,
            eth_dynamic_ip: true,
            ..Default::default()
        };
        assert_eq!(option_of(config.validate().unwrap_err()), "eth_dynamic_ip");
    }

    #[test]
    fn ethernet_with_dynamic_ip_is_fine() {
        let config = SocConfig {
            with_ethernet: true,
            eth_dynamic_ip: true,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bad_port_and_frequency() {
        let config = SocConfig {
            eth_port: 2,
            ..Default::default()
        };
        assert_eq!(option_of(config.validate().unwrap_err()), "eth_port");

        let config = SocConfig {
            sys_clk_freq: 0.0,
            ..Default::default()
        };
        assert_eq!(option_of(config.validate().unwrap_err()), "sys_clk_freq");

        let config = SocConfig {
            sys_clk_freq: f64::NAN,
            ..Default::default()
        };
        assert_eq!(option_of(config.validate().unwrap_err()), "sys_clk_freq");
    }

    #[test]
    fn sdram_excludes_integrated_ram() {
        let config = SocConfig {
            integrated_main_ram_size: 0x4000,
            ..Default::default()
        };
        assert_eq!(
            option_of(config.validate().unwrap_err()),
            "integrated_main_ram_size"
        );
        let config = SocConfig {
            with_sdram: false,
            integrated_main_ram_size: 0x4000,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_video_mode_and_l2() {
        let config = SocConfig {
            video_timings: "1024x768@75Hz".into(),
            ..Default::default()
        };
        assert_eq!(option_of(config.validate().unwrap_err()), "video_timings");

        let config = SocConfig {
            l2_size: 3000,
            ..Default::default()
        };
        assert_eq!(option_of(config.validate().unwrap_err()), "l2_size");
    }

    #[test]
    fn spi_flash_mode_parsing() {
        assert_eq!("1x".parse::<SpiFlashMode>().unwrap(), SpiFlashMode::X1);
        assert_eq!(SpiFlashMode::X4.binding_name(), "spiflash4x");
        assert!("2x".parse::<SpiFlashMode>().is_err());
    }

    #[test]
    fn partial_table_uses_defaults() {
        let config: SocConfig = serde_json::from_str(
            r#"{ "sys_clk_freq": 50000000.0, "with_ethernet": true, "eth_port": 1,
                 "eth_ip": "10.0.0.2", "spi_flash_mode": "1x" }"#,
        )
        .unwrap();
        assert_eq!(config.sys_clk_freq, 50e6);
        assert_eq!(config.eth_port, 1);
        assert_eq!(config.eth_ip, Ipv4Addr::new(10, 0, 0, 2));
        assert_eq!(config.spi_flash_mode, SpiFlashMode::X1);
        assert!(config.with_sdram);
    }
}

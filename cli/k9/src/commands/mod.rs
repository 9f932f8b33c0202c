//! CLI command implementations.

pub mod board;
pub mod build;
pub mod describe;
pub mod doctor;
pub mod pins;
pub mod program;

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use k9_build::BuildOptions;
use k9_platform::parse::discover_boards;
use k9_platform::{load_board_toml, Platform, Toolchain};
use k9_soc::{SocConfig, SpiFlashMode};
use tracing::debug;

use crate::manifest::K9Manifest;

/// SoC options shared by `build` and `describe`. Unset flags keep the
/// manifest value.
#[derive(Debug, Default, Args)]
pub struct SocArgs {
    /// System clock frequency in Hz
    #[arg(long)]
    pub sys_clk_freq: Option<f64>,
    /// Enable the Ethernet MAC
    #[arg(long, conflicts_with = "with_etherbone")]
    pub with_ethernet: bool,
    /// Enable the Etherbone bridge
    #[arg(long)]
    pub with_etherbone: bool,
    /// Ethernet port to use (0 or 1)
    #[arg(long)]
    pub eth_port: Option<u32>,
    /// Ethernet/Etherbone IP address
    #[arg(long)]
    pub eth_ip: Option<Ipv4Addr>,
    /// Obtain the IP address at runtime
    #[arg(long)]
    pub eth_dynamic_ip: bool,
    /// Enable the memory-mapped SPI flash
    #[arg(long)]
    pub with_spi_flash: bool,
    /// SPI flash bus width (1x or 4x)
    #[arg(long)]
    pub spi_flash_mode: Option<SpiFlashMode>,
    /// Enable the HDMI colorbar generator
    #[arg(long)]
    pub with_video_colorbars: bool,
    /// Video mode (e.g., 800x600@60Hz)
    #[arg(long)]
    pub video_timings: Option<String>,
    /// Disable the LED chaser
    #[arg(long)]
    pub no_led_chaser: bool,
    /// Disable the SD card
    #[arg(long)]
    pub no_sdcard: bool,
    /// Enable the device DNA reader
    #[arg(long)]
    pub with_dna: bool,
    /// Board file, or the name of a board under boards/
    #[arg(long)]
    pub board: Option<String>,
}

impl SocArgs {
    /// Apply the flags on top of `base`.
    pub fn apply(&self, base: SocConfig) -> SocConfig {
        let mut config = base;
        if let Some(f) = self.sys_clk_freq {
            config.sys_clk_freq = f;
        }
        config.with_ethernet |= self.with_ethernet;
        config.with_etherbone |= self.with_etherbone;
        if let Some(port) = self.eth_port {
            config.eth_port = port;
        }
        if let Some(ip) = self.eth_ip {
            config.eth_ip = ip;
        }
        config.eth_dynamic_ip |= self.eth_dynamic_ip;
        config.with_spi_flash |= self.with_spi_flash;
        if let Some(mode) = self.spi_flash_mode {
            config.spi_flash_mode = mode;
        }
        config.with_video_colorbars |= self.with_video_colorbars;
        if let Some(timings) = &self.video_timings {
            config.video_timings = timings.clone();
        }
        if self.no_led_chaser {
            config.with_led_chaser = false;
        }
        if self.no_sdcard {
            config.with_sdcard = false;
        }
        config.with_dna |= self.with_dna;
        config
    }
}

/// The project a command runs in: the directory holding `k9.toml`, or the
/// working directory when there is none.
#[derive(Debug)]
pub struct Project {
    pub dir: PathBuf,
    pub manifest: Option<K9Manifest>,
}

impl Project {
    pub fn discover(cwd: &Path) -> Result<Self> {
        match K9Manifest::find_and_load(cwd)? {
            Some((manifest, dir)) => {
                debug!("using {}", dir.join(crate::manifest::MANIFEST_NAME).display());
                Ok(Self {
                    dir,
                    manifest: Some(manifest),
                })
            }
            None => Ok(Self {
                dir: cwd.to_path_buf(),
                manifest: None,
            }),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.dir.join(path)
        }
    }

    /// The platform to build for: `board` (flag), then the manifest's board,
    /// then the built-in K9+.
    pub fn platform(&self, board: Option<&str>) -> Result<Platform> {
        let board = board.or_else(|| {
            self.manifest
                .as_ref()
                .and_then(|m| m.build.board.as_deref())
        });
        let Some(board) = board else {
            return Ok(Platform::colorlight_k9plus_ext()?);
        };

        let path = self.resolve(Path::new(board));
        if path.is_file() {
            return load_board_toml(&path).with_context(|| format!("loading {}", path.display()));
        }
        for (name, file) in discover_boards(&self.dir)? {
            if name == board {
                return load_board_toml(&file)
                    .with_context(|| format!("loading {}", file.display()));
            }
        }
        bail!("unknown board '{board}': not a file and not in boards/. Use 'k9 board list'.")
    }

    /// Manifest `[soc]` with command-line flags applied.
    pub fn soc_config(&self, args: &SocArgs) -> SocConfig {
        let base = self
            .manifest
            .as_ref()
            .map(|m| m.soc.clone())
            .unwrap_or_default();
        args.apply(base)
    }

    /// Build options from the manifest `[build]` table, `build_dir` and
    /// `toolchain` overriding it.
    pub fn build_options(
        &self,
        build_dir: Option<&Path>,
        toolchain: Option<Toolchain>,
    ) -> BuildOptions {
        let mut options = BuildOptions::default();
        if let Some(build) = self.manifest.as_ref().map(|m| &m.build) {
            if let Some(name) = &build.build_name {
                options.build_name = name.clone();
            }
            if let Some(dir) = &build.build_dir {
                options.build_dir = dir.clone();
            }
            options.toolchain = build.toolchain;
            options.sources = build.sources.iter().map(|s| self.resolve(s)).collect();
        }
        if let Some(dir) = build_dir {
            options.build_dir = dir.to_path_buf();
        }
        options.build_dir = self.resolve(&options.build_dir);
        if toolchain.is_some() {
            options.toolchain = toolchain;
        }
        options
    }
}

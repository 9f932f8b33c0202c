//! `k9.toml` manifest parsing and project configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use k9_platform::Toolchain;
use k9_soc::SocConfig;
use serde::{Deserialize, Serialize};

pub const MANIFEST_NAME: &str = "k9.toml";

/// The top-level manifest structure for a K9 project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct K9Manifest {
    /// Project metadata (required).
    pub project: ProjectConfig,
    /// Peripheral configuration; omitted fields take their defaults.
    #[serde(default)]
    pub soc: SocConfig,
    #[serde(default)]
    pub build: BuildConfig,
}

/// Project metadata section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name (required).
    pub name: String,
    /// Project version.
    #[serde(default = "default_version")]
    pub version: String,
    /// Short description.
    #[serde(default)]
    pub description: Option<String>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// Build configuration section. Relative paths are relative to the project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildConfig {
    /// Overrides the board's default toolchain.
    #[serde(default)]
    pub toolchain: Option<Toolchain>,
    #[serde(default)]
    pub build_dir: Option<PathBuf>,
    #[serde(default)]
    pub build_name: Option<String>,
    /// HDL sources of the top-level netlist.
    #[serde(default)]
    pub sources: Vec<PathBuf>,
    /// Board file or name under `boards/`; the built-in K9+ when absent.
    #[serde(default)]
    pub board: Option<String>,
}

impl K9Manifest {
    /// Search upward from `start_dir` for a `k9.toml` file, parse and return it
    /// along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_NAME);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest: K9Manifest = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Parse a manifest from a TOML string.
    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing k9.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn parse_full_manifest() {
        let toml_str = r#"
[project]
name = "blinky"
version = "1.2.0"
description = "LED chaser and UART"

[soc]
sys_clk_freq = 50e6
with_etherbone = true
eth_port = 1
eth_ip = "10.0.0.9"
spi_flash_mode = "1x"

[build]
toolchain = "openxc7"
build-dir = "out"
build-name = "top"
sources = ["rtl/top.v"]
board = "k9-rev2"
"#;
        let manifest = K9Manifest::from_str(toml_str).unwrap();
        assert_eq!(manifest.project.name, "blinky");
        assert_eq!(manifest.soc.sys_clk_freq, 50e6);
        assert!(manifest.soc.with_etherbone);
        assert_eq!(manifest.soc.eth_ip, Ipv4Addr::new(10, 0, 0, 9));
        assert!(manifest.soc.with_sdram);
        assert_eq!(manifest.build.toolchain, Some(Toolchain::Openxc7));
        assert_eq!(manifest.build.build_name.as_deref(), Some("top"));
        assert_eq!(manifest.build.sources, vec![PathBuf::from("rtl/top.v")]);
        assert_eq!(manifest.build.board.as_deref(), Some("k9-rev2"));
    }

    #[test]
    fn parse_minimal_manifest() {
        let manifest = K9Manifest::from_str("[project]\nname = \"minimal\"\n").unwrap();
        assert_eq!(manifest.project.version, "0.1.0");
        assert_eq!(manifest.soc, SocConfig::default());
        assert!(manifest.build.toolchain.is_none());
    }

    #[test]
    fn reject_invalid_toml() {
        assert!(K9Manifest::from_str("this is not valid toml [[[").is_err());
        assert!(K9Manifest::from_str("[project]\nname = \"x\"\n[soc]\neth_ip = \"nope\"\n").is_err());
    }

    #[test]
    fn find_and_load_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("k9.toml"), "[project]\nname = \"parent\"\n").unwrap();

        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let (manifest, found_dir) = K9Manifest::find_and_load(&nested).unwrap().unwrap();
        assert_eq!(manifest.project.name, "parent");
        assert_eq!(found_dir, dir.path());
    }
}

//! Complete platform model.
//!
//! Assembles device + pin map + toolchain settings into a unified board
//! description used by SoC elaboration and the build driver.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::device::Device;
use crate::error::{PlatformError, Result};
use crate::io::{PinBinding, Pins};
use crate::pinmap::PinMap;
use crate::request::PinRequests;
use crate::timing::{PeriodConstraint, TimingConstraints};

/// Synthesis/implementation flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Toolchain {
    /// AMD/Xilinx Vivado.
    #[default]
    Vivado,
    /// Open-source flow: yosys + nextpnr-xilinx + prjxray.
    Openxc7,
}

impl FromStr for Toolchain {
    type Err = PlatformError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vivado" => Ok(Toolchain::Vivado),
            "openxc7" | "yosys+nextpnr" => Ok(Toolchain::Openxc7),
            _ => Err(PlatformError::UnknownToolchain { name: s.to_string() }),
        }
    }
}

impl fmt::Display for Toolchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Toolchain::Vivado => f.write_str("vivado"),
            Toolchain::Openxc7 => f.write_str("openxc7"),
        }
    }
}

/// An expansion connector: indexed pins mapped to pads (`-` when not connected).
///
/// Bindings may name a connector pin as `connector:index` instead of a pad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Connector {
    pub name: String,
    pub pins: Pins,
}

/// A complete board description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BoardFile", into = "BoardFile")]
pub struct Platform {
    /// Board name (e.g., "colorlight_k9plus_ext").
    pub name: String,
    /// Target FPGA part.
    pub device: Device,
    /// Default synthesis flow.
    pub toolchain: Toolchain,
    /// Binding carrying the board's reference oscillator.
    pub default_clk_name: String,
    /// Period of the reference oscillator in nanoseconds.
    pub default_clk_period_ns: f64,
    /// Debug-probe cable used by the programmer.
    pub programmer_cable: String,
    /// Vendor commands inserted before bitstream generation.
    pub bitstream_commands: Vec<String>,
    /// Vendor commands run after bitstream generation; `{build_name}` is substituted.
    pub additional_commands: Vec<String>,
    /// Expansion connectors.
    pub connectors: Vec<Connector>,
    /// Pin bindings.
    pub io: PinMap,
    /// Timing constraints registered during elaboration.
    pub timing: TimingConstraints,
    requests: PinRequests,
}

/// On-disk form of a [`Platform`] (`.board.toml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BoardFile {
    pub name: String,
    pub device: String,
    #[serde(default)]
    pub toolchain: Toolchain,
    pub default_clk_name: String,
    pub default_clk_period_ns: f64,
    pub programmer_cable: String,
    #[serde(default)]
    pub bitstream_commands: Vec<String>,
    #[serde(default)]
    pub additional_commands: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connectors: Vec<Connector>,
    #[serde(default)]
    pub io: Vec<PinBinding>,
}

impl TryFrom<BoardFile> for Platform {
    type Error = PlatformError;

    fn try_from(f: BoardFile) -> Result<Self> {
        let mut platform = Platform::new(&f.name, &f.device, f.io, f.connectors)?;
        platform.toolchain = f.toolchain;
        platform.default_clk_name = f.default_clk_name;
        platform.default_clk_period_ns = f.default_clk_period_ns;
        platform.programmer_cable = f.programmer_cable;
        platform.bitstream_commands = f.bitstream_commands;
        platform.additional_commands = f.additional_commands;
        Ok(platform)
    }
}

impl From<Platform> for BoardFile {
    fn from(p: Platform) -> Self {
        Self {
            name: p.name,
            device: p.device.part().to_string(),
            toolchain: p.toolchain,
            default_clk_name: p.default_clk_name,
            default_clk_period_ns: p.default_clk_period_ns,
            programmer_cable: p.programmer_cable,
            bitstream_commands: p.bitstream_commands,
            additional_commands: p.additional_commands,
            connectors: p.connectors,
            io: p.io.into(),
        }
    }
}

impl Platform {
    /// Build a platform, resolving connector references and validating the pin map.
    pub fn new(
        name: impl Into<String>,
        part: &str,
        io: Vec<PinBinding>,
        connectors: Vec<Connector>,
    ) -> Result<Self> {
        let device: Device = part.parse()?;
        let io = resolve_connectors(io, &connectors)?;
        Ok(Self {
            name: name.into(),
            device,
            toolchain: Toolchain::default(),
            default_clk_name: String::new(),
            default_clk_period_ns: 0.0,
            programmer_cable: String::new(),
            bitstream_commands: Vec::new(),
            additional_commands: Vec::new(),
            connectors,
            io: PinMap::new(io)?,
            timing: TimingConstraints::default(),
            requests: PinRequests::new(),
        })
    }

    /// Request a binding for exclusive use by one peripheral.
    pub fn request(&mut self, name: &str, index: u32) -> Result<PinBinding> {
        self.requests.request(&self.io, name, index)
    }

    /// Request every active binding with the given name.
    pub fn request_all(&mut self, name: &str) -> Result<Vec<PinBinding>> {
        self.requests.request_all(&self.io, name)
    }

    /// A previously requested binding. With `loose`, absence is not an error.
    pub fn lookup_request(&self, name: &str, index: u32, loose: bool) -> Result<Option<&PinBinding>> {
        self.requests.lookup_request(name, index, loose)
    }

    pub fn requests(&self) -> &PinRequests {
        &self.requests
    }

    /// Constrain the period of a clock arriving on a top-level port.
    pub fn add_period_constraint(&mut self, port: &str, period_ns: f64) {
        self.timing.add_period(PeriodConstraint {
            clock: port.to_string(),
            target: port.to_string(),
            is_port: true,
            period_ns,
        });
    }

    /// Declare two clock nets unrelated for timing analysis.
    pub fn add_false_path_constraint(&mut self, from: &str, to: &str) {
        debug!("false path {from} <-> {to}");
        self.timing.add_false_path(from, to);
    }

    /// Reference oscillator frequency in Hz.
    pub fn default_clk_freq(&self) -> f64 {
        if self.default_clk_period_ns > 0.0 {
            1e9 / self.default_clk_period_ns
        } else {
            0.0
        }
    }

    /// Final platform pass: constrain the default clock when it was requested.
    pub fn finalize(&mut self) -> Result<()> {
        let requested = self
            .lookup_request(&self.default_clk_name, 0, true)?
            .is_some();
        if requested {
            let name = self.default_clk_name.clone();
            self.add_period_constraint(&name, self.default_clk_period_ns);
        }
        Ok(())
    }

    /// Additional commands with `{build_name}` substituted.
    pub fn resolved_additional_commands(&self, build_name: &str) -> Vec<String> {
        self.additional_commands
            .iter()
            .map(|c| c.replace("{build_name}", build_name))
            .collect()
    }
}

fn resolve_connectors(io: Vec<PinBinding>, connectors: &[Connector]) -> Result<Vec<PinBinding>> {
    let resolve = |pins: &Pins| -> Result<Pins> {
        let mut pads = Vec::with_capacity(pins.len());
        for pad in pins.iter() {
            pads.push(resolve_pad(pad, connectors)?);
        }
        Ok(Pins::from_vec(pads))
    };

    io.into_iter()
        .map(|mut b| {
            if let Some(pins) = &b.pins {
                b.pins = Some(resolve(pins)?);
            }
            for sub in &mut b.subsignals {
                sub.pins = resolve(&sub.pins)?;
            }
            Ok(b)
        })
        .collect()
}

fn resolve_pad(pad: &str, connectors: &[Connector]) -> Result<String> {
    let Some((conn_name, pin)) = pad.split_once(':') else {
        return Ok(pad.to_string());
    };
    let err = |detail: &str| PlatformError::ConnectorPin {
        reference: pad.to_string(),
        detail: detail.to_string(),
    };
    let connector = connectors
        .iter()
        .find(|c| c.name == conn_name)
        .ok_or_else(|| err("unknown connector"))?;
    let index: usize = pin.parse().map_err(|_| err("pin index is not a number"))?;
    match connector.pins.as_slice().get(index).map(String::as_str) {
        Some("-") => Err(err("pin is not connected")),
        Some(resolved) => Ok(resolved.to_string()),
        None => Err(err("pin index out of range")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pmod_platform(io: Vec<PinBinding>) -> Result<Platform> {
        Platform::new(
            "pmod-test",
            "xc7a35ticsg324-1",
            io,
            vec![Connector {
                name: "pmoda".into(),
                pins: Pins::new("G13 B11 A11 - D12"),
            }],
        )
    }

    #[test]
    fn connector_pins_are_resolved() {
        let p = pmod_platform(vec![PinBinding::pins("pmod_led", 0, "pmoda:0 pmoda:4")]).unwrap();
        assert_eq!(p.io.lookup("pmod_led", 0).unwrap().pads(), vec!["G13", "D12"]);
    }

    #[test]
    fn unconnected_connector_pin_rejected() {
        let err = pmod_platform(vec![PinBinding::pins("x", 0, "pmoda:3")]).unwrap_err();
        assert!(matches!(err, PlatformError::ConnectorPin { .. }));
        let err = pmod_platform(vec![PinBinding::pins("x", 0, "pmodb:0")]).unwrap_err();
        assert!(matches!(err, PlatformError::ConnectorPin { .. }));
        let err = pmod_platform(vec![PinBinding::pins("x", 0, "pmoda:9")]).unwrap_err();
        assert!(matches!(err, PlatformError::ConnectorPin { .. }));
    }

    #[test]
    fn toolchain_from_str() {
        assert_eq!("vivado".parse::<Toolchain>().unwrap(), Toolchain::Vivado);
        assert_eq!("OpenXC7".parse::<Toolchain>().unwrap(), Toolchain::Openxc7);
        assert!("quartus".parse::<Toolchain>().is_err());
    }

    #[test]
    fn finalize_constrains_requested_default_clock() {
        let mut p = pmod_platform(vec![PinBinding::pins("clk100", 0, "E3")]).unwrap();
        p.default_clk_name = "clk100".into();
        p.default_clk_period_ns = 10.0;

        p.finalize().unwrap();
        assert!(p.timing.periods.is_empty());

        p.request("clk100", 0).unwrap();
        p.finalize().unwrap();
        assert_eq!(p.timing.period_of("clk100"), Some(10.0));
        assert_eq!(p.default_clk_freq(), 100e6);
    }
}

//! SoC composition for the Colorlight K9+.
//!
//! Elaboration turns a [`k9_platform::Platform`] and a [`SocConfig`] into a
//! fully resolved system in one pass:
//! - **Clocks:** one PLL solved against the board oscillator ([`clock`], [`crg`])
//! - **Peripherals:** cores that request pins and depend on clock domains ([`periph`], [`soc`])
//! - **Bus:** memory regions, CSR pages, interrupts and bus masters ([`bus`])
//!
//! The entry point is [`elaborate()`].

pub mod bus;
pub mod clock;
pub mod config;
pub mod crg;
pub mod elaborate;
pub mod error;
pub mod periph;
pub mod report;
pub mod soc;

pub use bus::{BusMap, RegionKind};
pub use clock::{ClockDomain, ClockSource, PllConfig, S7Pll};
pub use config::{SocConfig, SpiFlashMode};
pub use crg::Crg;
pub use elaborate::{elaborate, Elaboration};
pub use error::{ElaborationError, Result};
pub use periph::{Core, Peripheral};
pub use report::ElaborationReport;
pub use soc::Soc;

//! Board support definitions for the Colorlight K9+ (ext) FPGA board.
//!
//! A platform is assembled from three layers:
//! - **Device:** the FPGA part, its family and speed grade
//! - **Pin map:** logical signal names bound to physical pads and electrical attributes
//! - **Timing:** period and false-path constraints registered during elaboration
//!
//! The built-in board is [`Platform::colorlight_k9plus_ext`]. Other boards can be
//! described in `.board.toml` files and loaded with [`parse::load_board_toml`].

pub mod board;
pub mod device;
pub mod error;
pub mod io;
pub mod parse;
pub mod pinmap;
pub mod platform;
pub mod request;
pub mod timing;
pub mod xdc;

pub use device::{Device, Family};
pub use error::{PlatformError, Result};
pub use io::{IoStandard, Misc, PinBinding, Pins, Slew, Subsignal};
pub use pinmap::PinMap;
pub use platform::{Connector, Platform, Toolchain};
pub use request::PinRequests;
pub use timing::{FalsePath, PeriodConstraint, TimingConstraints};
pub use parse::{load_board_toml, parse_board_toml, validate_board, Severity, ValidationIssue};
pub use xdc::emit_xdc;

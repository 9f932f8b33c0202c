//! Elaboration errors.

use k9_platform::PlatformError;
use thiserror::Error;

/// Errors that can occur while composing a SoC.
///
/// Every variant is fatal: elaboration stops at the first one and produces no
/// partial description.
#[derive(Debug, Error)]
pub enum ElaborationError {
    /// Invalid or conflicting configuration, detected before elaboration starts.
    #[error("invalid configuration for '{option}': {detail}")]
    Config { option: String, detail: String },

    /// A pin binding could not be requested.
    #[error("pin binding error: {0}")]
    Binding(#[from] PlatformError),

    /// No PLL configuration satisfies the requested clock.
    #[error("clock '{domain}' is infeasible: {detail}")]
    ClockInfeasible { domain: String, detail: String },

    /// A peripheral depends on a clock domain that was never created.
    #[error("{peripheral} requires clock domain '{domain}', which does not exist")]
    MissingClockDomain { peripheral: String, domain: String },

    /// A peripheral was added twice.
    #[error("peripheral '{name}' is already present")]
    DuplicatePeripheral { name: String },

    /// A name registered twice in the same namespace (region, CSR, IRQ, master).
    #[error("{kind} '{name}' is already registered")]
    DuplicateName { kind: &'static str, name: String },

    /// Two bus regions overlap.
    #[error("region '{name}' overlaps region '{other}'")]
    RegionOverlap { name: String, other: String },

    /// A bus region is not aligned to its size.
    #[error("region '{name}' at {origin:#010x} is not aligned to its size {size:#x}")]
    RegionAlignment { name: String, origin: u64, size: u64 },

    /// A namespace ran out of slots.
    #[error("no free {kind} for '{name}'")]
    Exhausted { kind: &'static str, name: String },

    /// A requested pin group does not have the shape a peripheral expects.
    #[error("{binding}: subsignal '{subsignal}' has {found} pads, expected {expected}")]
    PadWidth {
        binding: String,
        subsignal: String,
        expected: String,
        found: usize,
    },

    /// Two requested bindings drive the same physical pad.
    #[error("pad {pad} is requested by both {first} and {second}")]
    SharedPad {
        pad: String,
        first: String,
        second: String,
    },

    /// JSON export failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ElaborationError {
    pub(crate) fn config(option: &str, detail: impl Into<String>) -> Self {
        ElaborationError::Config {
            option: option.to_string(),
            detail: detail.into(),
        }
    }

    pub(crate) fn infeasible(domain: &str, detail: impl Into<String>) -> Self {
        ElaborationError::ClockInfeasible {
            domain: domain.to_string(),
            detail: detail.into(),
        }
    }
}

/// Result type for elaboration operations.
pub type Result<T> = std::result::Result<T, ElaborationError>;

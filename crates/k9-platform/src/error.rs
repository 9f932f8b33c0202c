//! Error types for platform and pin map operations.

use std::path::PathBuf;

/// Errors that can occur while declaring, loading or requesting platform resources.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// I/O error reading/writing board files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Board file not found.
    #[error("board file not found: {}", path.display())]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// Validation error in a board definition.
    #[error("validation error: {detail}")]
    Validation {
        /// Description of the validation failure.
        detail: String,
    },

    /// A `(name, index)` pair that was never declared.
    #[error("binding not found: {name}:{index}")]
    BindingNotFound { name: String, index: u32 },

    /// A declared binding that is deliberately disabled.
    #[error("binding {name}:{index} is disabled: {reason}")]
    BindingDisabled {
        name: String,
        index: u32,
        reason: String,
    },

    /// The same `(name, index)` pair declared twice.
    #[error("binding {name}:{index} declared more than once")]
    DuplicateBinding { name: String, index: u32 },

    /// A binding without any pads.
    #[error("binding {name}:{index} has no pads")]
    EmptyBinding { name: String, index: u32 },

    /// A physical pad claimed by two active bindings.
    #[error("pad {pad} is used by both {first} and {second}")]
    PadConflict {
        pad: String,
        first: String,
        second: String,
    },

    /// A binding requested twice during one elaboration.
    #[error("binding {name}:{index} already requested")]
    AlreadyRequested { name: String, index: u32 },

    /// Two members of the same alternate group requested together.
    #[error("binding {name}:{index} conflicts with {other} (alternate group '{group}')")]
    AlternateConflict {
        name: String,
        index: u32,
        group: String,
        other: String,
    },

    /// The part number does not name a supported device.
    #[error("unknown device '{part}': {detail}")]
    UnknownDevice { part: String, detail: String },

    /// An unknown toolchain name.
    #[error("unknown toolchain '{name}' (expected vivado or openxc7)")]
    UnknownToolchain { name: String },

    /// A pad references a connector pin that does not exist.
    #[error("connector pin '{reference}' cannot be resolved: {detail}")]
    ConnectorPin { reference: String, detail: String },
}

/// Result type for platform operations.
pub type Result<T> = std::result::Result<T, PlatformError>;

//! `.board.toml` files: a whole [`Platform`] as kebab-case TOML.
//!
//! Projects keep extra boards under `boards/`. A parsed board has already
//! passed pin map checks; [`validate_board`] adds the softer checks that only
//! matter when the board is used for a build.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{PlatformError, Result};
use crate::io::Misc;
use crate::platform::Platform;

/// Pad attributes understood by 7-series constraints.
const XILINX_MISC_KEYS: &[&str] = &[
    "PULLUP", "PULLDOWN", "KEEPER", "SLEW", "DRIVE", "IOB", "DIFF_TERM", "IN_TERM",
    "IBUF_LOW_PWR",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// The board can still be used.
    Warning,
    /// Elaboration against the board would fail.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub message: String,
}

impl ValidationIssue {
    fn error(message: String) -> Self {
        Self {
            severity: Severity::Error,
            message,
        }
    }

    fn warning(message: String) -> Self {
        Self {
            severity: Severity::Warning,
            message,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Load a board from a `.board.toml` file.
pub fn load_board_toml(path: &Path) -> Result<Platform> {
    if !path.exists() {
        return Err(PlatformError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    parse_board_toml(&content)
}

/// Parse a board from a TOML string.
pub fn parse_board_toml(toml_str: &str) -> Result<Platform> {
    let platform: Platform = toml::from_str(toml_str)?;
    Ok(platform)
}

/// Serialize a board to pretty TOML.
pub fn board_to_toml(platform: &Platform) -> Result<String> {
    let toml_str = toml::to_string_pretty(platform)?;
    Ok(toml_str)
}

/// Whether a pad name follows the BGA ball grammar (`W19`, `AB18`).
fn is_ball_name(pad: &str) -> bool {
    let letters = pad.chars().take_while(|c| c.is_ascii_uppercase()).count();
    let digits = &pad[letters..];
    (1..=2).contains(&letters)
        && (1..=2).contains(&digits.len())
        && digits.chars().all(|c| c.is_ascii_digit())
}

/// Checks a parsed board for problems the pin map does not catch.
///
/// Any issue, warnings included, is reported through `Err`; the caller
/// decides what to do with warnings.
pub fn validate_board(platform: &Platform) -> std::result::Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    if let Err(e) = platform.io.lookup(&platform.default_clk_name, 0) {
        issues.push(ValidationIssue::error(format!(
            "default clock '{}': {e}",
            platform.default_clk_name
        )));
    }

    if platform.default_clk_period_ns <= 0.0 {
        issues.push(ValidationIssue::error(format!(
            "default-clk-period-ns must be positive (got {})",
            platform.default_clk_period_ns
        )));
    }

    for (pad, owners) in platform.io.pads() {
        if !is_ball_name(pad) {
            issues.push(ValidationIssue::error(format!(
                "pad '{pad}' of {} is not a package ball name",
                owners[0].label()
            )));
        }
    }

    // Unknown attributes are emitted verbatim and rejected by the tools.
    for b in platform.io.active() {
        let all_misc = b
            .misc
            .iter()
            .chain(b.subsignals.iter().flat_map(|s| s.misc.iter()));
        for m in all_misc {
            if let Misc::Other { key, .. } = m {
                if !XILINX_MISC_KEYS.contains(&key.to_ascii_uppercase().as_str()) {
                    issues.push(ValidationIssue::warning(format!(
                        "{}: attribute '{m}' is not a {:?} pad property",
                        b.label(),
                        platform.device.family()
                    )));
                }
            }
        }
    }

    for b in platform.io.active() {
        let missing = b.iostandard.is_none()
            && (b.pins.is_some() || b.subsignals.iter().any(|s| s.iostandard.is_none()));
        if missing {
            issues.push(ValidationIssue::warning(format!(
                "{} has pads without an IO standard",
                b.label()
            )));
        }
    }

    if platform.programmer_cable.is_empty() {
        issues.push(ValidationIssue::warning(
            "programmer-cable is empty; load/flash will fail".into(),
        ));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Generate a template `.board.toml` for a new board.
///
/// Seeds from the Colorlight K9+ with the given custom name.
pub fn generate_template(name: &str) -> Result<String> {
    let mut platform = Platform::colorlight_k9plus_ext()?;
    platform.name = name.into();
    board_to_toml(&platform)
}

/// Discover all `.board.toml` files in a project's `boards/` directory.
///
/// Returns a list of (board_name, file_path) pairs.
pub fn discover_boards(project_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let boards_dir = project_dir.join("boards");
    if !boards_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut boards = Vec::new();
    for entry in std::fs::read_dir(&boards_dir)? {
        let path = entry?.path();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_suffix(".board.toml"))
            .map(str::to_string);
        if let Some(name) = name {
            boards.push((name, path));
        }
    }
    boards.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(boards)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_k9plus() {
        let original = Platform::colorlight_k9plus_ext().unwrap();
        let toml_str = board_to_toml(&original).unwrap();
        let parsed = parse_board_toml(&toml_str).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn parse_minimal_toml() {
        let toml_str = r#"
name = "minimal"
device = "xc7a35ticsg324-1L"
default-clk-name = "clk100"
default-clk-period-ns = 10.0
programmer-cable = "digilent"

[[io]]
name = "clk100"
index = 0
pins = "E3"
iostandard = "LVCMOS33"

[[io]]
name = "serial"
index = 0
iostandard = "LVCMOS33"
subsignals = [
    { name = "tx", pins = "D10" },
    { name = "rx", pins = "A9", misc = ["PULLUP True"] },
]
"#;
        let platform = parse_board_toml(toml_str).unwrap();
        assert_eq!(platform.name, "minimal");
        assert_eq!(platform.device.speedgrade(), -1);
        assert_eq!(platform.io.bindings().len(), 2);
        assert_eq!(
            platform.io.lookup("serial", 0).unwrap().subsignal("rx").unwrap().misc,
            vec![Misc::Pullup(true)]
        );
        assert!(validate_board(&platform).is_ok());
    }

    #[test]
    fn parse_rejects_pad_conflict() {
        let toml_str = r#"
name = "broken"
device = "xc7a50tfgg484-1"
default-clk-name = "clk25"
default-clk-period-ns = 40.0
programmer-cable = "ch347_jtag"

[[io]]
name = "clk25"
index = 0
pins = "W19"

[[io]]
name = "user_led"
index = 0
pins = "W19"
"#;
        let err = parse_board_toml(toml_str).unwrap_err();
        assert!(err.to_string().contains("W19"), "{err}");
    }

    #[test]
    fn parse_invalid_returns_error() {
        assert!(parse_board_toml("this is not valid toml [[[").is_err());
    }

    #[test]
    fn parse_missing_field_returns_error() {
        assert!(parse_board_toml("name = \"incomplete\"\n").is_err());
    }

    #[test]
    fn validate_k9plus_warns_on_slewrate() {
        let platform = Platform::colorlight_k9plus_ext().unwrap();
        let issues = validate_board(&platform).unwrap_err();
        assert!(issues.iter().all(|i| i.severity == Severity::Warning));
        assert!(issues.iter().any(|i| i.message.contains("SLEWRATE")));
    }

    #[test]
    fn issues_display_with_severity() {
        let issue = ValidationIssue::error("pad 'Q' is not a package ball name".into());
        assert!(issue.is_error());
        assert_eq!(issue.to_string(), "error: pad 'Q' is not a package ball name");
        assert!(Severity::Error > Severity::Warning);
    }

    #[test]
    fn validate_missing_default_clock() {
        let mut platform = Platform::colorlight_k9plus_ext().unwrap();
        platform.default_clk_name = "clk100".into();
        let issues = validate_board(&platform).unwrap_err();
        assert!(issues
            .iter()
            .any(|i| i.is_error() && i.message.contains("clk100")));
    }

    #[test]
    fn validate_bad_pad_name() {
        let toml_str = r#"
name = "odd"
device = "xc7a50tfgg484-1"
default-clk-name = "clk"
default-clk-period-ns = 40.0
programmer-cable = "ch347_jtag"

[[io]]
name = "clk"
index = 0
pins = "IO_L12P"
iostandard = "LVCMOS33"
"#;
        let platform = parse_board_toml(toml_str).unwrap();
        let issues = validate_board(&platform).unwrap_err();
        assert!(issues.iter().any(|i| i.message.contains("IO_L12P")));
    }

    #[test]
    fn ball_names() {
        assert!(is_ball_name("W19"));
        assert!(is_ball_name("AB18"));
        assert!(is_ball_name("E3"));
        assert!(!is_ball_name("ABC1"));
        assert!(!is_ball_name("W190"));
        assert!(!is_ball_name("19"));
    }

    #[test]
    fn generate_template_is_parseable() {
        let toml_str = generate_template("my-board").unwrap();
        let platform = parse_board_toml(&toml_str).unwrap();
        assert_eq!(platform.name, "my-board");
        assert_eq!(platform.device.part(), "xc7a50tfgg484-1");
    }

    #[test]
    fn discover_boards_finds_files() {
        let dir = tempfile::tempdir().unwrap();
        let boards_dir = dir.path().join("boards");
        std::fs::create_dir_all(&boards_dir).unwrap();

        let template = generate_template("board-a").unwrap();
        std::fs::write(boards_dir.join("board-a.board.toml"), &template).unwrap();
        std::fs::write(boards_dir.join("board-b.board.toml"), &template).unwrap();
        std::fs::write(boards_dir.join("notes.txt"), "ignore me").unwrap();

        let boards = discover_boards(dir.path()).unwrap();
        assert_eq!(boards.len(), 2);
        assert_eq!(boards[0].0, "board-a");
        assert_eq!(boards[1].0, "board-b");
    }

    #[test]
    fn discover_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_boards(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn load_not_found() {
        let result = load_board_toml(Path::new("/nonexistent/path.board.toml"));
        assert!(matches!(result.unwrap_err(), PlatformError::NotFound { .. }));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.board.toml");
        std::fs::write(&path, generate_template("file-test").unwrap()).unwrap();
        let platform = load_board_toml(&path).unwrap();
        assert_eq!(platform.name, "file-test");
    }
}

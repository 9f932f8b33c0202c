//! `k9 board`: manage board files.

use std::path::Path;

use anyhow::{bail, Context, Result};
use k9_platform::parse::{discover_boards, generate_template};
use k9_platform::{load_board_toml, validate_board, Platform};

use super::Project;

/// List the built-in board and every board under `boards/`.
pub fn list(project: &Project) -> Result<()> {
    let builtin = Platform::colorlight_k9plus_ext()?;
    println!("Boards:");
    println!();
    println!("  {:<25} {} (built-in)", builtin.name, builtin.device.part());
    for (name, path) in discover_boards(&project.dir)? {
        match load_board_toml(&path) {
            Ok(p) => println!("  {:<25} {} ({})", name, p.device.part(), path.display()),
            Err(e) => println!("  {:<25} error: {e}", name),
        }
    }
    println!();
    println!("Use 'k9 pins --board <name>' for details.");
    Ok(())
}

/// Print a board template seeded from the K9+.
pub fn template(name: &str) -> Result<()> {
    print!("{}", generate_template(name)?);
    Ok(())
}

/// Validate a board file. Errors fail the command; warnings are printed.
pub fn validate(file: &Path) -> Result<()> {
    let platform =
        load_board_toml(file).with_context(|| format!("loading {}", file.display()))?;
    match validate_board(&platform) {
        Ok(()) => {
            println!("{}: valid", platform.name);
            Ok(())
        }
        Err(issues) => {
            let errors = issues.iter().filter(|i| i.is_error()).count();
            for issue in &issues {
                eprintln!("{issue}");
            }
            if errors > 0 {
                bail!("{}: {errors} error(s)", platform.name);
            }
            println!("{}: valid with {} warning(s)", platform.name, issues.len());
            Ok(())
        }
    }
}

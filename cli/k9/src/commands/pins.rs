//! `k9 pins`: print a board's pin map.

use anyhow::Result;
use k9_platform::PinBinding;

use super::Project;

fn describe_binding(b: &PinBinding) -> String {
    let mut parts = Vec::new();
    if let Some(pins) = &b.pins {
        parts.push(pins.iter().collect::<Vec<_>>().join(" "));
    }
    for sub in &b.subsignals {
        parts.push(format!("{}={}", sub.name, sub.pins.iter().collect::<Vec<_>>().join(" ")));
    }
    parts.join("  ")
}

pub fn run(project: &Project, board: Option<&str>, all: bool) -> Result<()> {
    let platform = project.platform(board)?;
    println!("=== Pins: {} ({}) ===", platform.name, platform.device.part());
    println!();
    for b in platform.io.bindings() {
        if !all && !b.is_active() {
            continue;
        }
        let iostandard = b
            .iostandard
            .as_ref()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".into());
        println!("  {:<14} {:<10} {}", b.label(), iostandard, describe_binding(b));
        if let Some(group) = &b.alternate_group {
            println!("  {:<14} alternate group '{group}'", "");
        }
        if let Some(reason) = &b.disabled {
            println!("  {:<14} disabled: {reason}", "");
        }
    }
    if !platform.connectors.is_empty() {
        println!();
        println!("--- Connectors ---");
        for c in &platform.connectors {
            println!("  {:<14} {} pins", c.name, c.pins.len());
        }
    }
    Ok(())
}

//! `k9 describe`: elaborate without building.

use anyhow::{Context, Result};
use k9_soc::elaborate;

use super::{Project, SocArgs};

pub fn run(project: &Project, soc: &SocArgs, json: bool) -> Result<()> {
    let platform = project.platform(soc.board.as_deref())?;
    let elaboration = elaborate(platform, project.soc_config(soc)).context("elaborating SoC")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&elaboration.soc_json()?)?);
        return Ok(());
    }

    println!("{}", elaboration.report);
    println!("--- Peripheral pins ---");
    for p in elaboration.soc.peripherals() {
        if !p.pins.is_empty() {
            println!("  {:<16} {}", p.name, p.pins.join(", "));
        }
    }
    Ok(())
}

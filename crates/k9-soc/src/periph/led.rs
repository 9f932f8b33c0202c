//! LED chaser.

use k9_platform::PinBinding;
use serde::Serialize;

use crate::error::{ElaborationError, Result};

/// Duration of one full sweep, in seconds.
pub const CHASER_PERIOD_S: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedChaserCore {
    pub nleds: usize,
    /// Cycles for a full sweep.
    pub period_cycles: u64,
    /// Cycles between two steps (a sweep goes out and back).
    pub step_cycles: u64,
}

pub fn led_chaser(pads: &[PinBinding], sys_clk_freq: f64) -> Result<LedChaserCore> {
    let nleds: usize = pads.iter().map(PinBinding::width).sum();
    if nleds == 0 {
        return Err(ElaborationError::PadWidth {
            binding: "user_led".into(),
            subsignal: "-".into(),
            expected: "at least 1".into(),
            found: 0,
        });
    }
    let period_cycles = (CHASER_PERIOD_S * sys_clk_freq) as u64;
    Ok(LedChaserCore {
        nleds,
        period_cycles,
        step_cycles: period_cycles / (2 * nleds as u64),
    })
}

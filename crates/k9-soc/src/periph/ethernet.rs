//! RGMII Ethernet PHY, MAC and Etherbone bridge.

use std::net::Ipv4Addr;

use k9_platform::PinBinding;
use serde::Serialize;

use super::expect_width;
use crate::clock::ClockDomain;
use crate::error::{ElaborationError, Result};

/// RGMII clock frequency at gigabit speed.
pub const RGMII_CLK_FREQ: f64 = 125e6;
/// Taps of the 7-series IDELAYE2 line.
pub const IDELAY_TAPS: u32 = 32;
/// Default receive data delay on the K9+ (the B50612D does not delay RX clock).
pub const DEFAULT_RX_DELAY_S: f64 = 2e-9;
pub const DEFAULT_MAC_ADDRESS: u64 = 0x10e2_d500_0000;
pub const ETHERBONE_UDP_PORT: u16 = 1234;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RgmiiPhy {
    pub port: u32,
    pub tx_delay_s: f64,
    pub rx_delay_s: f64,
    /// IDELAYE2 taps applied to the receive path.
    pub rx_delay_taps: u32,
    /// Reference frequency of the delay line, when one is used.
    pub idelay_ref_hz: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EthernetCore {
    /// PHY port the MAC is attached to.
    pub port: u32,
    pub mac_address: u64,
    pub dynamic_ip: bool,
    pub local_ip: Ipv4Addr,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EtherboneCore {
    pub port: u32,
    pub mac_address: u64,
    pub ip_address: Ipv4Addr,
    pub udp_port: u16,
}

/// IDELAYE2 taps for a delay: `floor(delay * 64 * f_ref)`.
pub fn delay_taps(delay_s: f64, ref_freq: f64) -> u32 {
    (delay_s * 64.0 * ref_freq).floor() as u32
}

/// Validate the RGMII pads of one port and compute the delay line setting.
///
/// `idelay` is the delay-calibration domain; it is mandatory when
/// `rx_delay_s` is non-zero.
pub fn rgmii_phy(
    port: u32,
    clock_pads: &PinBinding,
    pads: &PinBinding,
    idelay: Option<&ClockDomain>,
    tx_delay_s: f64,
    rx_delay_s: f64,
) -> Result<RgmiiPhy> {
    for (binding, subsignals) in [
        (clock_pads, &["tx", "rx"][..]),
        (pads, &["rx_ctl", "tx_ctl", "mdc", "mdio"][..]),
    ] {
        for sub in subsignals {
            expect_width(binding, sub, |w| w == 1, "1")?;
        }
    }
    expect_width(pads, "rx_data", |w| w == 4, "4")?;
    expect_width(pads, "tx_data", |w| w == 4, "4")?;

    let (rx_delay_taps, idelay_ref_hz) = if rx_delay_s > 0.0 {
        let idelay = idelay.ok_or_else(|| ElaborationError::MissingClockDomain {
            peripheral: "ethphy".into(),
            domain: "idelay".into(),
        })?;
        let taps = delay_taps(rx_delay_s, idelay.freq_hz);
        if taps >= IDELAY_TAPS {
            return Err(ElaborationError::infeasible(
                &idelay.name,
                format!(
                    "rx delay of {:.2} ns needs {taps} taps, the delay line has {IDELAY_TAPS}",
                    rx_delay_s * 1e9
                ),
            ));
        }
        (taps, Some(idelay.freq_hz))
    } else {
        (0, None)
    };

    Ok(RgmiiPhy {
        port,
        tx_delay_s,
        rx_delay_s,
        rx_delay_taps,
        idelay_ref_hz,
    })
}

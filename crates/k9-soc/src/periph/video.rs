//! Video timings and the HDMI colorbar test pattern.

use k9_platform::PinBinding;
use serde::Serialize;

use super::expect_width;
use crate::clock::ClockDomain;
use crate::error::{ElaborationError, Result};

/// A video mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VideoTimings {
    pub name: &'static str,
    /// Pixel clock in Hz.
    pub pix_clk: f64,
    pub h_active: u32,
    pub h_blanking: u32,
    pub h_sync_offset: u32,
    pub h_sync_width: u32,
    pub v_active: u32,
    pub v_blanking: u32,
    pub v_sync_offset: u32,
    pub v_sync_width: u32,
}

const VIDEO_TIMINGS: &[VideoTimings] = &[
    VideoTimings {
        name: "640x480@60Hz",
        pix_clk: 25e6,
        h_active: 640,
        h_blanking: 160,
        h_sync_offset: 16,
        h_sync_width: 96,
        v_active: 480,
        v_blanking: 45,
        v_sync_offset: 10,
        v_sync_width: 2,
    },
    VideoTimings {
        name: "800x600@60Hz",
        pix_clk: 40e6,
        h_active: 800,
        h_blanking: 256,
        h_sync_offset: 40,
        h_sync_width: 128,
        v_active: 600,
        v_blanking: 28,
        v_sync_offset: 1,
        v_sync_width: 4,
    },
    VideoTimings {
        name: "1280x720@60Hz",
        pix_clk: 74.25e6,
        h_active: 1280,
        h_blanking: 370,
        h_sync_offset: 220,
        h_sync_width: 40,
        v_active: 720,
        v_blanking: 30,
        v_sync_offset: 5,
        v_sync_width: 5,
    },
];

impl VideoTimings {
    pub fn lookup(name: &str) -> Option<&'static VideoTimings> {
        VIDEO_TIMINGS.iter().find(|t| t.name == name)
    }

    pub fn names() -> Vec<&'static str> {
        VIDEO_TIMINGS.iter().map(|t| t.name).collect()
    }

    pub fn h_total(&self) -> u32 {
        self.h_active + self.h_blanking
    }

    pub fn v_total(&self) -> u32 {
        self.v_active + self.v_blanking
    }

    /// Frame rate in Hz.
    pub fn refresh_hz(&self) -> f64 {
        self.pix_clk / (self.h_total() as f64 * self.v_total() as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoCore {
    pub timings: VideoTimings,
    /// TMDS serializer ratio (bit clock / pixel clock).
    pub serdes_ratio: u32,
}

/// Check the HDMI pads and that the pixel and serializer clocks match the mode.
pub fn colorbars(
    pads: &PinBinding,
    timings: VideoTimings,
    hdmi: &ClockDomain,
    hdmi5x: &ClockDomain,
) -> Result<VideoCore> {
    for sub in ["clk_p", "clk_n", "data0_p", "data0_n", "data1_p", "data1_n", "data2_p", "data2_n"] {
        expect_width(pads, sub, |w| w == 1, "1")?;
    }
    for (domain, wanted) in [(hdmi, timings.pix_clk), (hdmi5x, 5.0 * timings.pix_clk)] {
        if domain.freq_hz != wanted {
            return Err(ElaborationError::infeasible(
                &domain.name,
                format!(
                    "{} needs {:.3} MHz, domain runs at {:.3} MHz",
                    timings.name,
                    wanted / 1e6,
                    domain.freq_hz / 1e6
                ),
            ));
        }
    }
    Ok(VideoCore {
        timings,
        serdes_ratio: 10,
    })
}

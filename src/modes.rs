//! SSTV mode table and band frequency constants
//!
//! Every timing the wire contract names lives here as a field of [`Mode`] or
//! as a named constant. Lookup on receive is by VIS code, lookup on transmit
//! is by symbolic name.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Scan-line sync pulse, VIS break and VIS stop tone
pub const SYNC_HZ: f32 = 1200.0;

/// Black level / porch tone
pub const BLACK_HZ: f32 = 1500.0;

/// White level
pub const WHITE_HZ: f32 = 2300.0;

/// VIS leader and start tone
pub const LEADER_HZ: f32 = 1900.0;

/// VIS data bit '1'
pub const VIS_BIT1_HZ: f32 = 1100.0;

/// VIS data bit '0'
pub const VIS_BIT0_HZ: f32 = 1300.0;

/// Luminance scan bandwidth (black to white)
pub const SCAN_BANDWIDTH_HZ: f32 = WHITE_HZ - BLACK_HZ;

/// Robot 36 luminance scan, one full-width line
pub const ROBOT36_Y_SCAN: f32 = 0.088;

/// Robot 36 chroma separator (1500 Hz before Cb, 2300 Hz before Cr)
pub const ROBOT36_CHROMA_SEP: f32 = 0.0045;

/// Robot 36 porch between separator and chroma scan
pub const ROBOT36_CHROMA_PORCH: f32 = 0.0015;

/// Robot 36 half-resolution chroma scan
pub const ROBOT36_CHROMA_SCAN: f32 = 0.044;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorFormat {
    /// Three full-resolution channel scans per line, G-B-R order
    Rgb,
    /// One luminance scan plus a line-alternating half-resolution chroma scan
    Yuv,
}

/// Static descriptor for one SSTV transmission mode.
///
/// `scan_time` is the per-channel scan duration for RGB modes and the
/// luminance scan duration for YUV modes (chroma sub-timings are the
/// `ROBOT36_*` constants above).
#[derive(Clone, Copy, Debug)]
pub struct Mode {
    pub name: &'static str,
    pub vis_code: u8,
    pub width: usize,
    pub lines: usize,
    pub color_format: ColorFormat,
    /// 1200 Hz pulse at line start (seconds)
    pub sync_pulse: f32,
    /// 1500 Hz porch after the sync pulse (seconds)
    pub sync_porch: f32,
    /// 1200 Hz pulse between channel scans, RGB modes only (seconds)
    pub separator_pulse: Option<f32>,
    /// Data scan duration (seconds), interpreted per `color_format`
    pub scan_time: f32,
}

impl Mode {
    pub const ROBOT36: Self = Self {
        name: "Robot 36",
        vis_code: 0x08,
        width: 320,
        lines: 240,
        color_format: ColorFormat::Yuv,
        sync_pulse: 0.009,
        sync_porch: 0.003,
        separator_pulse: None,
        scan_time: ROBOT36_Y_SCAN,
    };

    pub const MARTIN_M1: Self = Self {
        name: "Martin M1",
        vis_code: 0x2c,
        width: 320,
        lines: 256,
        color_format: ColorFormat::Rgb,
        sync_pulse: 0.004862,
        sync_porch: 0.000572,
        separator_pulse: Some(0.000572),
        scan_time: 0.146432,
    };

    pub const SCOTTIE_S1: Self = Self {
        name: "Scottie S1",
        vis_code: 0x3c,
        width: 320,
        lines: 256,
        color_format: ColorFormat::Rgb,
        sync_pulse: 0.009,
        sync_porch: 0.0015,
        separator_pulse: Some(0.0015),
        scan_time: 0.13824,
    };

    /// Look up a mode by VIS code (receive side).
    pub fn from_vis_code(vis_code: u8) -> Option<&'static Mode> {
        static BY_VIS: Lazy<HashMap<u8, &'static Mode>> = Lazy::new(|| {
            let mut map = HashMap::new();
            for &mode in ALL_MODES {
                map.insert(mode.vis_code, mode);
            }
            map
        });
        BY_VIS.get(&vis_code).copied()
    }

    /// Look up a mode by configuration name (transmit side).
    ///
    /// Accepts the selector names `ROBOT36`, `MARTIN1` and `SCOTTIE1`,
    /// case-insensitively.
    pub fn from_name(name: &str) -> Option<&'static Mode> {
        match name.to_ascii_uppercase().as_str() {
            "ROBOT36" => Some(&Mode::ROBOT36),
            "MARTIN1" => Some(&Mode::MARTIN_M1),
            "SCOTTIE1" => Some(&Mode::SCOTTIE_S1),
            _ => None,
        }
    }

    /// Per-pixel dwell of the primary data scan (seconds)
    pub fn pixel_dwell(&self) -> f32 {
        self.scan_time / self.width as f32
    }

    /// Nominal duration of one complete scan line (seconds)
    pub fn line_duration(&self) -> f32 {
        match self.color_format {
            ColorFormat::Rgb => {
                // sync, porch, three channel scans, two inter-channel separators
                self.sync_pulse
                    + self.sync_porch
                    + 3.0 * self.scan_time
                    + 2.0 * self.separator_pulse.unwrap_or(0.0)
            }
            ColorFormat::Yuv => {
                self.sync_pulse
                    + self.sync_porch
                    + self.scan_time
                    + ROBOT36_CHROMA_SEP
                    + ROBOT36_CHROMA_PORCH
                    + ROBOT36_CHROMA_SCAN
            }
        }
    }

    /// Parity bit of this mode's VIS code: XOR of the seven data bits.
    pub fn vis_parity(&self) -> bool {
        let c = self.vis_code;
        let folded = c ^ (c >> 1) ^ (c >> 2) ^ (c >> 3) ^ (c >> 4) ^ (c >> 5) ^ (c >> 6);
        folded & 1 != 0
    }
}

/// All supported modes, receive-lookup order
pub const ALL_MODES: &[&Mode] = &[&Mode::ROBOT36, &Mode::MARTIN_M1, &Mode::SCOTTIE_S1];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vis_code_lookup() {
        assert_eq!(Mode::from_vis_code(0x08).unwrap().name, "Robot 36");
        assert_eq!(Mode::from_vis_code(0x2c).unwrap().name, "Martin M1");
        assert_eq!(Mode::from_vis_code(0x3c).unwrap().name, "Scottie S1");
        assert!(Mode::from_vis_code(0x7f).is_none());
    }

    #[test]
    fn name_lookup_is_case_insensitive() {
        assert_eq!(Mode::from_name("robot36").unwrap().vis_code, 0x08);
        assert_eq!(Mode::from_name("Martin1").unwrap().vis_code, 0x2c);
        assert_eq!(Mode::from_name("SCOTTIE1").unwrap().vis_code, 0x3c);
        assert!(Mode::from_name("PD120").is_none());
    }

    #[test]
    fn robot36_line_sums_to_150ms() {
        let d = Mode::ROBOT36.line_duration();
        assert!((d - 0.150).abs() < 1e-6, "Robot 36 line was {d} s");
    }

    #[test]
    fn martin_pixel_dwell() {
        // 146.432 ms over 320 pixels = 457.6 us
        let dwell = Mode::MARTIN_M1.pixel_dwell();
        assert!((dwell - 0.0004576).abs() < 1e-9);
    }

    #[test]
    fn vis_parity_is_xor_of_data_bits() {
        for mode in ALL_MODES {
            let mut expected = false;
            for bit in 0..7 {
                expected ^= (mode.vis_code >> bit) & 1 != 0;
            }
            assert_eq!(mode.vis_parity(), expected, "parity mismatch for {}", mode.name);
        }
    }
}

//! Encoder pipeline: raster to tone train
//!
//! Emits the VIS preamble, then schedules each scan line as sync, porch and
//! data tones through the phase-continuous generator. The caller supplies a
//! raster already sized to the mode (resizing belongs to the external image
//! stage).
//!
//! **RGB modes** scan each line three times in G, B, R order, one
//! pixel-dwell tone per pixel, channel value mapped linearly onto
//! 1500-2300 Hz. Channel scans are separated by a short 1200 Hz pulse.
//!
//! **Robot 36** scans luminance full-width, then one chroma channel at half
//! horizontal resolution, alternating per line: even lines carry Cr (V),
//! odd lines Cb (U). The separator tone before the chroma scan announces
//! which one (2300 Hz for Cr, 1500 Hz for Cb), though receivers key off
//! line parity.

use tracing::debug;

use crate::color::rgb_to_ycbcr;
use crate::error::SstvError;
use crate::modes::{
    ColorFormat, Mode, BLACK_HZ, ROBOT36_CHROMA_PORCH, ROBOT36_CHROMA_SCAN, ROBOT36_CHROMA_SEP,
    ROBOT36_Y_SCAN, SCAN_BANDWIDTH_HZ, SYNC_HZ, WHITE_HZ,
};
use crate::raster::Raster;
use crate::tone::ToneGenerator;
use crate::vis;
use crate::wav;

/// Map a channel value 0-255 onto the 1500-2300 Hz scan band.
pub fn pixel_to_freq(value: u8) -> f32 {
    BLACK_HZ + (value as f32 / 255.0) * SCAN_BANDWIDTH_HZ
}

/// Map video-range luma 16-235 onto the scan band.
pub fn luma_to_freq(luma: u8) -> f32 {
    BLACK_HZ + ((luma as f32 - 16.0) / 219.0) * SCAN_BANDWIDTH_HZ
}

/// SSTV encoder for one mode at one sample rate.
#[derive(Debug)]
pub struct Encoder {
    mode: &'static Mode,
    sample_rate: u32,
}

impl Encoder {
    /// Build an encoder from a configuration mode name (`ROBOT36`,
    /// `MARTIN1` or `SCOTTIE1`).
    pub fn new(mode_name: &str, sample_rate: u32) -> Result<Self, SstvError> {
        let mode = Mode::from_name(mode_name).ok_or_else(|| SstvError::InvalidMode {
            name: mode_name.to_string(),
        })?;
        Self::with_mode(mode, sample_rate)
    }

    pub fn with_mode(mode: &'static Mode, sample_rate: u32) -> Result<Self, SstvError> {
        if sample_rate == 0 {
            return Err(SstvError::InvalidSampleRate { sample_rate });
        }
        Ok(Self { mode, sample_rate })
    }

    pub fn mode(&self) -> &'static Mode {
        self.mode
    }

    /// Encode a raster into a PCM sample stream.
    ///
    /// A raster not already sized to the mode is a caller bug and comes
    /// back as [`SstvError::RasterSizeMismatch`].
    pub fn encode(&self, raster: &Raster) -> Result<Vec<f32>, SstvError> {
        if (raster.width(), raster.height()) != (self.mode.width, self.mode.lines) {
            return Err(SstvError::RasterSizeMismatch {
                mode: self.mode.name,
                width: raster.width(),
                height: raster.height(),
                expected_width: self.mode.width,
                expected_height: self.mode.lines,
            });
        }

        let mut tone = ToneGenerator::new(self.sample_rate)?;
        vis::emit(&mut tone, self.mode.vis_code);

        for y in 0..self.mode.lines {
            match self.mode.color_format {
                ColorFormat::Rgb => self.encode_rgb_line(&mut tone, raster, y),
                ColorFormat::Yuv => self.encode_yuv_line(&mut tone, raster, y),
            }
        }

        debug!(
            mode = self.mode.name,
            samples = tone.len(),
            seconds = tone.len() as f32 / self.sample_rate as f32,
            "encoded"
        );
        Ok(tone.finish())
    }

    /// Encode straight to a 16-bit mono WAV.
    pub fn encode_to_wav(&self, raster: &Raster) -> Result<Vec<u8>, SstvError> {
        let samples = self.encode(raster)?;
        Ok(wav::generate_wav_bytes(&samples, self.sample_rate))
    }

    fn encode_rgb_line(&self, tone: &mut ToneGenerator, raster: &Raster, y: usize) {
        let mode = self.mode;
        tone.emit(SYNC_HZ, mode.sync_pulse);
        tone.emit(BLACK_HZ, mode.sync_porch);

        let dwell = mode.pixel_dwell();
        for (i, &channel) in [1usize, 2, 0].iter().enumerate() {
            if i > 0 {
                if let Some(sep) = mode.separator_pulse {
                    tone.emit(SYNC_HZ, sep);
                }
            }
            for x in 0..mode.width {
                let (r, g, b, _) = raster.get(x, y);
                let value = [r, g, b][channel];
                tone.emit(pixel_to_freq(value), dwell);
            }
        }
    }

    fn encode_yuv_line(&self, tone: &mut ToneGenerator, raster: &Raster, y: usize) {
        let mode = self.mode;
        tone.emit(SYNC_HZ, mode.sync_pulse);
        tone.emit(BLACK_HZ, mode.sync_porch);

        let ycc: Vec<(u8, u8, u8)> = (0..mode.width)
            .map(|x| {
                let (r, g, b, _) = raster.get(x, y);
                rgb_to_ycbcr(r, g, b)
            })
            .collect();

        let dwell_y = ROBOT36_Y_SCAN / mode.width as f32;
        for &(luma, _, _) in &ycc {
            tone.emit(luma_to_freq(luma), dwell_y);
        }

        // even lines transmit Cr, odd lines Cb; the separator frequency
        // announces which, receivers go by parity
        let even = y % 2 == 0;
        tone.emit(if even { WHITE_HZ } else { BLACK_HZ }, ROBOT36_CHROMA_SEP);
        tone.emit(BLACK_HZ, ROBOT36_CHROMA_PORCH);

        let half = mode.width / 2;
        let dwell_c = ROBOT36_CHROMA_SCAN / half as f32;
        for i in 0..half {
            let (_, cb0, cr0) = ycc[2 * i];
            let (_, cb1, cr1) = ycc[2 * i + 1];
            let value = if even {
                ((cr0 as u16 + cr1 as u16) / 2) as u8
            } else {
                ((cb0 as u16 + cb1 as u16) / 2) as u8
            };
            tone.emit(pixel_to_freq(value), dwell_c);
        }
    }
}

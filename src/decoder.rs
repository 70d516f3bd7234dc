//! Decoder pipeline: tone train to raster
//!
//! Drives VIS detection, sync tracking, per-pixel frequency estimation and
//! colour reconstruction over an in-memory sample buffer. Content problems
//! (unrecognised VIS, truncated audio) are recovered and reported as
//! warnings next to the best-effort image; structural problems surface as
//! errors.
//!
//! Two interchangeable front ends estimate data-scan frequencies: the
//! Goertzel sweep (default, lower chroma imbalance on clean signals) and
//! the FM phase-difference track (better on noisy, drifting ISS-class
//! signals). Control tones sit outside the FM discriminator's 1500-2300 Hz
//! range, so VIS and sync always use the Goertzel path.

use tracing::{debug, warn};

use crate::color::ycbcr_to_rgb;
use crate::error::SstvError;
use crate::fm::FmFrontEnd;
use crate::goertzel;
use crate::modes::{
    ColorFormat, Mode, BLACK_HZ, ROBOT36_CHROMA_PORCH, ROBOT36_CHROMA_SCAN, ROBOT36_CHROMA_SEP,
    ROBOT36_Y_SCAN, SCAN_BANDWIDTH_HZ,
};
use crate::raster::Raster;
use crate::sync::SyncTracker;
use crate::vis;

/// Width of the data-pixel estimation window, in pixel dwells.
///
/// One dwell holds too few cycles for an unbiased Goertzel estimate; four
/// trades a little horizontal detail for much lower frequency jitter.
const PIXEL_WINDOW_DWELLS: f32 = 4.0;

/// Chroma samples are read over this fraction of their dwell, centred.
const CHROMA_WINDOW_FRACTION: f32 = 0.98;

/// Neutral chroma; scratch rows must never default to 0, which would cast
/// missing data green.
const NEUTRAL_CHROMA: u8 = 128;

/// Frequency estimation front end for data scans.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FrontEnd {
    /// Coarse-then-fine Goertzel argmax sweep per window
    #[default]
    Goertzel,
    /// Kaiser-prefiltered FM phase-difference track
    Fm,
}

/// Decoder configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct DecoderConfig {
    pub front_end: FrontEnd,
    /// Skip VIS detection and decode as this mode
    pub forced_mode: Option<&'static Mode>,
}

/// A decoded image plus everything the decoder wants the caller to know.
#[derive(Debug)]
pub struct DecodeResult {
    pub raster: Raster,
    pub mode: &'static Mode,
    /// Recovered content errors (unrecognised VIS, truncation)
    pub warnings: Vec<SstvError>,
}

/// Decode an SSTV sample stream into an image.
pub fn decode(
    samples: &[f32],
    sample_rate: u32,
    config: &DecoderConfig,
) -> Result<DecodeResult, SstvError> {
    if sample_rate == 0 {
        return Err(SstvError::InvalidSampleRate { sample_rate });
    }
    Decoder::new(samples, sample_rate as f32, config).run()
}

/// Map a scan-band frequency back to a channel value.
fn freq_to_pixel(f: f32) -> u8 {
    (255.0 * (f - BLACK_HZ) / SCAN_BANDWIDTH_HZ)
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Map a scan-band frequency back to video-range luma.
fn freq_to_luma(f: f32) -> u8 {
    (16.0 + 219.0 * (f - BLACK_HZ) / SCAN_BANDWIDTH_HZ)
        .round()
        .clamp(16.0, 235.0) as u8
}

enum PixelSource {
    Goertzel,
    Fm(FmFrontEnd),
}

impl PixelSource {
    /// Estimate the dominant frequency of `len` samples starting at
    /// `start`. `None` when the window lies entirely past end-of-stream.
    fn estimate(&self, samples: &[f32], sample_rate: f32, start: usize, len: usize) -> Option<f32> {
        match self {
            PixelSource::Goertzel => {
                let end = (start + len).min(samples.len());
                if start >= end {
                    return None;
                }
                Some(goertzel::estimate_frequency(
                    &samples[start..end],
                    sample_rate,
                ))
            }
            PixelSource::Fm(front_end) => {
                if start >= front_end.len() {
                    return None;
                }
                Some(front_end.estimate(start, len))
            }
        }
    }
}

struct Decoder<'a> {
    samples: &'a [f32],
    sample_rate: f32,
    config: &'a DecoderConfig,
    source: PixelSource,
    mode: &'static Mode,
    /// Sample index cursor
    position: usize,
    raster: Raster,
    /// Cb scratch, written on odd lines, W×H, neutral elsewhere
    chroma_u: Vec<u8>,
    /// Cr scratch, written on even lines
    chroma_v: Vec<u8>,
    warnings: Vec<SstvError>,
}

impl<'a> Decoder<'a> {
    fn new(samples: &'a [f32], sample_rate: f32, config: &'a DecoderConfig) -> Self {
        Self {
            samples,
            sample_rate,
            config,
            source: PixelSource::Goertzel,
            mode: &Mode::ROBOT36,
            position: 0,
            raster: Raster::new_black(0, 0),
            chroma_u: Vec::new(),
            chroma_v: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn run(mut self) -> Result<DecodeResult, SstvError> {
        self.mode = match self.config.forced_mode {
            Some(mode) => mode,
            None => match vis::detect_mode(self.samples, self.sample_rate) {
                Some((mode, _)) => mode,
                None => {
                    warn!("VIS not recognised, falling back to Robot 36");
                    self.warnings.push(SstvError::UnrecognisedVis);
                    &Mode::ROBOT36
                }
            },
        };
        debug!(mode = self.mode.name, "decoding");

        self.raster = Raster::new_black(self.mode.width, self.mode.lines);
        if self.mode.color_format == ColorFormat::Yuv {
            self.chroma_u = vec![NEUTRAL_CHROMA; self.mode.width * self.mode.lines];
            self.chroma_v = vec![NEUTRAL_CHROMA; self.mode.width * self.mode.lines];
        }

        if self.config.front_end == FrontEnd::Fm {
            self.source = PixelSource::Fm(FmFrontEnd::from_samples(self.samples, self.sample_rate));
        }

        let tracker = SyncTracker::new(self.samples, self.sample_rate);
        self.position = tracker.find_first(self.mode).ok_or(SstvError::NoSync)?;

        let mut lines_decoded = 0;
        for y in 0..self.mode.lines {
            let data_start =
                self.position + ((self.mode.sync_pulse + self.mode.sync_porch) * self.sample_rate) as usize;
            if data_start >= self.samples.len() {
                break;
            }

            let line_end = match self.mode.color_format {
                ColorFormat::Rgb => self.decode_rgb_line(y, data_start),
                ColorFormat::Yuv => self.decode_yuv_line(y, data_start),
            };
            lines_decoded += 1;

            self.position = tracker.find_next(self.mode, line_end);
        }

        if lines_decoded < self.mode.lines {
            warn!(
                lines_decoded,
                expected = self.mode.lines,
                "input truncated"
            );
            self.warnings.push(SstvError::TruncatedInput {
                lines_decoded,
                expected_lines: self.mode.lines,
            });
        }

        if self.mode.color_format == ColorFormat::Yuv {
            self.reassemble_yuv();
        }

        Ok(DecodeResult {
            raster: self.raster,
            mode: self.mode,
            warnings: self.warnings,
        })
    }

    /// Decode G, B and R channel scans. Returns the cursor just past the
    /// last channel.
    fn decode_rgb_line(&mut self, y: usize, data_start: usize) -> usize {
        let mode = self.mode;
        let fs = self.sample_rate;
        let dwell = mode.pixel_dwell() * fs;
        let scan = mode.scan_time * fs;
        let window = (PIXEL_WINDOW_DWELLS * dwell) as usize;

        let mut cursor = data_start as f32;
        for (i, &channel) in [1usize, 2, 0].iter().enumerate() {
            if i > 0 {
                if let Some(sep) = mode.separator_pulse {
                    cursor += sep * fs;
                }
            }
            for x in 0..mode.width {
                // slide the window back near the scan edge instead of
                // letting it spill into the separator
                let ideal = cursor + x as f32 * dwell;
                let last = cursor + scan - window as f32;
                let start = ideal.min(last).max(cursor) as usize;
                if let Some(f) = self.source.estimate(self.samples, fs, start, window) {
                    self.raster.set_channel(x, y, channel, freq_to_pixel(f));
                }
            }
            cursor += scan;
        }
        cursor as usize
    }

    /// Decode one luminance scan and one half-resolution chroma scan.
    /// Luma lands in R=G=B until reassembly; chroma goes to the parity
    /// scratch. Returns the cursor just past the chroma scan.
    fn decode_yuv_line(&mut self, y: usize, data_start: usize) -> usize {
        let mode = self.mode;
        let fs = self.sample_rate;
        let mut cursor = data_start as f32;

        let y_scan = ROBOT36_Y_SCAN * fs;
        let dwell_y = y_scan / mode.width as f32;
        let window = (PIXEL_WINDOW_DWELLS * dwell_y) as usize;
        for x in 0..mode.width {
            let ideal = cursor + x as f32 * dwell_y;
            let last = cursor + y_scan - window as f32;
            let start = ideal.min(last).max(cursor) as usize;
            if let Some(f) = self.source.estimate(self.samples, fs, start, window) {
                let luma = freq_to_luma(f);
                self.raster.set_rgb(x, y, luma, luma, luma);
            }
        }
        cursor += y_scan;

        // separator frequency is informational only; chroma type comes
        // from line parity
        cursor += (ROBOT36_CHROMA_SEP + ROBOT36_CHROMA_PORCH) * fs;

        let half = mode.width / 2;
        let dwell_c = ROBOT36_CHROMA_SCAN * fs / half as f32;
        let window_c = ((CHROMA_WINDOW_FRACTION * dwell_c) as usize).max(1);
        let even = y % 2 == 0;
        for i in 0..half {
            let mid = cursor + (i as f32 + 0.5) * dwell_c;
            let start = (mid - window_c as f32 / 2.0) as usize;
            if let Some(f) = self.source.estimate(self.samples, fs, start, window_c) {
                let value = freq_to_pixel(f);
                let row = if even {
                    &mut self.chroma_v
                } else {
                    &mut self.chroma_u
                };
                // each chroma sample covers two pixels
                row[y * mode.width + 2 * i] = value;
                row[y * mode.width + 2 * i + 1] = value;
            }
        }
        cursor += ROBOT36_CHROMA_SCAN * fs;
        cursor as usize
    }

    /// Combine luma with line-interleaved chroma, pairwise: within the pair
    /// (even, odd), Cr comes from the even line's scratch and Cb from the
    /// odd line's.
    fn reassemble_yuv(&mut self) {
        let mode = self.mode;
        let mut y = 0;
        while y < mode.lines {
            let even_row = y;
            let odd_row = y + 1;
            let pair_lines = if odd_row < mode.lines { 2 } else { 1 };
            for line in even_row..even_row + pair_lines {
                for x in 0..mode.width {
                    let (luma, _, _, _) = self.raster.get(x, line);
                    let cr = self.chroma_v[even_row * mode.width + x];
                    let cb = if odd_row < mode.lines {
                        self.chroma_u[odd_row * mode.width + x]
                    } else {
                        NEUTRAL_CHROMA
                    };
                    let (r, g, b) = ycbcr_to_rgb(luma, cb, cr);
                    self.raster.set_rgb(x, line, r, g, b);
                }
            }
            y += 2;
        }
    }
}

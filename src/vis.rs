//! VIS (Vertical Interval Signalling) framing
//!
//! The 8-bit mode-identifying preamble at the head of every transmission:
//!
//! - 300 ms leader at 1900 Hz
//! - 10 ms break at 1200 Hz
//! - 30 ms start tone at 1900 Hz
//! - 7 data bits, LSB first, 30 ms each (1100 Hz = '1', 1300 Hz = '0')
//! - 30 ms even-parity bit, same tone convention
//! - 30 ms stop tone at 1200 Hz
//!
//! Detection slides over the first two seconds looking for the start tone,
//! then thresholds the seven bit windows against 1200 Hz and checks the
//! assembled code against the mode table.

use bitvec::prelude::*;
use tracing::debug;

use crate::goertzel;
use crate::modes::{Mode, LEADER_HZ, SYNC_HZ, VIS_BIT0_HZ, VIS_BIT1_HZ};
use crate::tone::ToneGenerator;

/// Leader tone duration
pub const LEADER_TIME: f32 = 0.300;

/// Break between leader and start tone
pub const BREAK_TIME: f32 = 0.010;

/// Duration of the start tone, each bit, parity and stop
pub const BIT_TIME: f32 = 0.030;

/// Start-tone acceptance tolerance around 1900 Hz
const DETECT_TOLERANCE_HZ: f32 = 75.0;

/// How far into the stream detection searches
const SEARCH_WINDOW: f32 = 2.0;

/// Detection slide stride
const SEARCH_STRIDE: f32 = 0.0005;

/// Append the VIS preamble for `vis_code` to the tone train.
pub fn emit(tone: &mut ToneGenerator, vis_code: u8) {
    tone.emit(LEADER_HZ, LEADER_TIME);
    tone.emit(SYNC_HZ, BREAK_TIME);
    tone.emit(LEADER_HZ, BIT_TIME);

    let bits = vis_code.view_bits::<Lsb0>();
    let mut parity = false;
    for bit in bits.iter().by_vals().take(7) {
        parity ^= bit;
        tone.emit(if bit { VIS_BIT1_HZ } else { VIS_BIT0_HZ }, BIT_TIME);
    }
    // even parity over the seven data bits
    tone.emit(if parity { VIS_BIT1_HZ } else { VIS_BIT0_HZ }, BIT_TIME);
    tone.emit(SYNC_HZ, BIT_TIME);
}

/// Total preamble duration in seconds
pub fn duration() -> f32 {
    LEADER_TIME + BREAK_TIME + 10.0 * BIT_TIME
}

/// Search the head of the stream for a VIS preamble.
///
/// Returns the detected mode and the sample position just past the stop
/// tone. `None` means no known code with valid parity was assembled
/// anywhere in the search window; the decoder then falls back to Robot 36
/// so a human can recover by forcing a mode.
pub fn detect_mode(samples: &[f32], sample_rate: f32) -> Option<(&'static Mode, usize)> {
    let stride = ((SEARCH_STRIDE * sample_rate) as usize).max(1);
    let window = (BIT_TIME * sample_rate) as usize;
    let bit_period = (BIT_TIME * sample_rate) as usize;
    let search_end = samples.len().min((SEARCH_WINDOW * sample_rate) as usize);

    let mut pos = 0;
    while pos + window <= search_end {
        if let Some(mode) = try_candidate(samples, sample_rate, pos, window) {
            // a position up to one bit off can assemble the same (or worse,
            // another) valid code from straddled windows; the aligned start
            // tone has the strongest 1900 Hz response, so refine over the
            // next bit period before committing
            let (best_pos, best_mode) =
                refine_candidate(samples, sample_rate, pos, mode, stride, window, bit_period);
            debug!(
                pos = best_pos,
                code = best_mode.vis_code,
                mode = best_mode.name,
                "VIS match"
            );
            return Some((best_mode, best_pos + 10 * bit_period));
        }
        pos += stride;
    }
    None
}

/// Full candidate test at one position: start tone, seven data bits, and a
/// matching parity bit, looked up in the mode table.
fn try_candidate(
    samples: &[f32],
    sample_rate: f32,
    pos: usize,
    window: usize,
) -> Option<&'static Mode> {
    let f = goertzel::estimate_frequency(&samples[pos..pos + window], sample_rate);
    if (f - LEADER_HZ).abs() > DETECT_TOLERANCE_HZ {
        return None;
    }
    let (code, parity) = read_bits(samples, sample_rate, pos + window, window)?;
    let mode = Mode::from_vis_code(code)?;
    if mode.vis_parity() != parity {
        return None;
    }
    Some(mode)
}

/// Slide across one bit period from the first matching position and keep
/// the match whose start-tone window carries the most 1900 Hz energy.
fn refine_candidate(
    samples: &[f32],
    sample_rate: f32,
    first: usize,
    first_mode: &'static Mode,
    stride: usize,
    window: usize,
    bit_period: usize,
) -> (usize, &'static Mode) {
    let mut best = (first, first_mode);
    let mut best_mag = goertzel::goertzel_magnitude(
        &samples[first..first + window],
        sample_rate,
        LEADER_HZ,
    );
    let mut pos = first + stride;
    while pos <= first + bit_period && pos + window <= samples.len() {
        if let Some(mode) = try_candidate(samples, sample_rate, pos, window) {
            let mag = goertzel::goertzel_magnitude(
                &samples[pos..pos + window],
                sample_rate,
                LEADER_HZ,
            );
            if mag > best_mag {
                best_mag = mag;
                best = (pos, mode);
            }
        }
        pos += stride;
    }
    best
}

/// Read seven LSB-first data bits plus the parity bit starting at `start`,
/// one `window` apiece.
///
/// A bit is '1' when its window frequency falls below 1200 Hz.
fn read_bits(samples: &[f32], sample_rate: f32, start: usize, window: usize) -> Option<(u8, bool)> {
    let mut code = bitarr![u8, Lsb0; 0; 8];
    for i in 0..7 {
        let s = start + i * window;
        if s + window > samples.len() {
            return None;
        }
        let f = goertzel::estimate_frequency(&samples[s..s + window], sample_rate);
        code.set(i, f < SYNC_HZ);
    }
    let s = start + 7 * window;
    if s + window > samples.len() {
        return None;
    }
    let f = goertzel::estimate_frequency(&samples[s..s + window], sample_rate);
    Some((code.as_raw_slice()[0], f < SYNC_HZ))
}

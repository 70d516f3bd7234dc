//! Scan-line sync tracking
//!
//! Locates the 1200 Hz pulse that opens every scan line.
//!
//! **Acceptance**: a position is a sync start when the Goertzel estimate
//! over the whole pulse sits within 200 Hz of 1200 Hz *and* three
//! sub-windows inside the pulse all agree. The sub-window vote keeps data
//! tails and porches from masquerading as sync.
//!
//! **Initial acquisition**: the first sync follows the VIS preamble, whose
//! exact length varies with timing tolerance, so the search starts from a
//! short list of candidate offsets. A contiguous run of accepting positions
//! (the VIS stop tone runs straight into the first sync pulse) is followed
//! to its last member, which is the true pulse start.
//!
//! **Per-line tracking**: search forward from the expected position, retry
//! in an expanded window on a miss, and as a last resort accept the
//! expected position so one lost pulse never desyncs the rest of the frame.

use tracing::{debug, trace, warn};

use crate::goertzel;
use crate::modes::{Mode, SYNC_HZ};

/// |f - 1200| acceptance bound for the pulse and its sub-windows
const TOLERANCE_HZ: f32 = 200.0;

/// Slide step while hunting for a pulse
const SLIDE_STEP: f32 = 0.0002;

/// Start offsets for initial acquisition, covering VIS length variants
const INITIAL_OFFSETS: [f32; 4] = [0.5, 0.61, 0.8, 0.0];

/// Forward span searched from each initial offset
const INITIAL_SPAN: f32 = 0.3;

/// Sync pulse locator over a fixed sample buffer.
pub struct SyncTracker<'a> {
    samples: &'a [f32],
    sample_rate: f32,
}

impl<'a> SyncTracker<'a> {
    pub fn new(samples: &'a [f32], sample_rate: f32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    fn step(&self) -> usize {
        ((SLIDE_STEP * self.sample_rate) as usize).max(1)
    }

    /// Does a full sync pulse start at `pos`?
    fn is_sync_at(&self, pos: usize, mode: &Mode) -> bool {
        let window = (mode.sync_pulse * self.sample_rate) as usize;
        if window == 0 || pos + window > self.samples.len() {
            return false;
        }
        let f = goertzel::estimate_frequency(&self.samples[pos..pos + window], self.sample_rate);
        if (f - SYNC_HZ).abs() >= TOLERANCE_HZ {
            return false;
        }
        // all three sub-windows must agree
        let third = window / 3;
        if third == 0 {
            return true;
        }
        for k in 0..3 {
            let s = pos + k * third;
            let f = goertzel::estimate_frequency(&self.samples[s..s + third], self.sample_rate);
            if (f - SYNC_HZ).abs() >= TOLERANCE_HZ {
                return false;
            }
        }
        true
    }

    /// Walk forward through a contiguous run of accepting positions and
    /// return the last one. When a longer 1200 Hz region (VIS stop tone plus
    /// sync) precedes the line, the last accepting position is the actual
    /// pulse start.
    fn follow_run(&self, mut pos: usize, mode: &Mode) -> usize {
        let step = self.step();
        while self.is_sync_at(pos + step, mode) {
            pos += step;
        }
        pos
    }

    /// Acceptance around an isolated pulse extends a little both ways
    /// before the sub-window vote breaks; the middle of the run is the
    /// unbiased pulse start.
    fn center_of_run(&self, first: usize, mode: &Mode) -> usize {
        let last = self.follow_run(first, mode);
        first + (last - first) / 2
    }

    /// Locate the first sync pulse of the transmission.
    pub fn find_first(&self, mode: &Mode) -> Option<usize> {
        let step = self.step();
        let span = (INITIAL_SPAN * self.sample_rate) as usize;
        for &offset in &INITIAL_OFFSETS {
            let start = (offset * self.sample_rate) as usize;
            let mut pos = start;
            while pos < start + span {
                if self.is_sync_at(pos, mode) {
                    let pulse = self.follow_run(pos, mode);
                    debug!(offset, pulse, "initial sync acquired");
                    return Some(pulse);
                }
                pos += step;
            }
        }
        None
    }

    /// Locate the next sync pulse around `from` (the expected start).
    ///
    /// The search opens half a pulse early: acceptance reaches a little
    /// past the true start, and a search beginning there would walk straight
    /// over the pulse and miss it. Never fails: a miss falls back to the
    /// expected position so partial frames keep their alignment.
    pub fn find_next(&self, mode: &Mode, from: usize) -> usize {
        let step = self.step();
        let line = (mode.line_duration() * self.sample_rate) as usize;
        let guard = ((mode.sync_pulse / 2.0) * self.sample_rate) as usize;

        let mut pos = from.saturating_sub(guard);
        while pos < from + 2 * line {
            if self.is_sync_at(pos, mode) {
                trace!(pos, "sync");
                return self.center_of_run(pos, mode);
            }
            pos += step;
        }

        // expanded retry from half a line later
        let mut pos = from + line / 2;
        while pos < from + line / 2 + 3 * line {
            if self.is_sync_at(pos, mode) {
                debug!(pos, "sync found in expanded window");
                return self.center_of_run(pos, mode);
            }
            pos += step;
        }

        warn!(from, "sync lost; continuing at expected position");
        from
    }
}

//! Phase-continuous tone synthesis
//!
//! The tone generator is the only legal source of encoder samples. A single
//! phase accumulator runs across every tone it emits, so the waveform has no
//! discontinuities at tone boundaries and no spectral splatter.
//!
//! Tone lengths rarely land on whole samples; the fractional remainder is
//! carried into the next tone so cumulative timing error stays under one
//! sample for the whole transmission.

use std::f32::consts::PI;

use crate::error::SstvError;

/// Output amplitude, leaving headroom before 16-bit quantisation
const AMPLITUDE: f32 = 0.9;

/// Streaming sine generator with continuous phase.
///
/// # Example
/// ```
/// use rustysstv::tone::ToneGenerator;
///
/// let mut tone = ToneGenerator::new(48_000).unwrap();
/// tone.emit(1900.0, 0.300);
/// tone.emit(1200.0, 0.010);
/// let samples = tone.finish();
/// assert_eq!(samples.len(), (0.310f32 * 48_000.0) as usize);
/// ```
#[derive(Debug, Clone)]
pub struct ToneGenerator {
    sample_rate: f32,
    /// Running phase in [0, 2π)
    phase: f32,
    /// Fractional-sample carry between tones
    fraction: f32,
    samples: Vec<f32>,
}

impl ToneGenerator {
    pub fn new(sample_rate: u32) -> Result<Self, SstvError> {
        if sample_rate == 0 {
            return Err(SstvError::InvalidSampleRate { sample_rate });
        }
        Ok(Self {
            sample_rate: sample_rate as f32,
            phase: 0.0,
            fraction: 0.0,
            samples: Vec::new(),
        })
    }

    /// Append `duration` seconds of a `frequency` Hz tone.
    pub fn emit(&mut self, frequency: f32, duration: f32) {
        let two_pi = 2.0 * PI;
        let exact = duration * self.sample_rate + self.fraction;
        let count = exact.floor() as usize;
        self.fraction = exact - count as f32;

        let dphase = two_pi * frequency / self.sample_rate;
        self.samples.reserve(count);
        for _ in 0..count {
            self.samples.push(AMPLITUDE * self.phase.sin());
            self.phase += dphase;
            self.phase %= two_pi;
        }
    }

    /// Samples emitted so far
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of samples emitted so far
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Consume the generator, returning the full waveform.
    pub fn finish(self) -> Vec<f32> {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zero_crossings(samples: &[f32]) -> usize {
        samples
            .windows(2)
            .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
            .count()
    }

    #[test]
    fn rejects_zero_sample_rate() {
        assert!(matches!(
            ToneGenerator::new(0),
            Err(SstvError::InvalidSampleRate { sample_rate: 0 })
        ));
    }

    #[test]
    fn sample_count_matches_duration() {
        let mut tone = ToneGenerator::new(48_000).unwrap();
        tone.emit(1500.0, 0.010);
        assert_eq!(tone.len(), 480);
    }

    #[test]
    fn fractional_durations_carry_over() {
        // 4.5 ms at 48 kHz is 216 samples; 1.5 ms is 72. Individually exact,
        // but 0.4576 ms (Martin pixel dwell) is 21.9648 samples and must not
        // lose the remainder 320 times per scan.
        let mut tone = ToneGenerator::new(48_000).unwrap();
        for _ in 0..320 {
            tone.emit(1800.0, 0.0004576);
        }
        let expected = (320.0f64 * 0.0004576 * 48_000.0) as usize;
        assert!(
            (tone.len() as i64 - expected as i64).abs() <= 1,
            "{} samples emitted, expected {}",
            tone.len(),
            expected
        );
    }

    #[test]
    fn zero_crossing_count_tracks_frequency() {
        for &(freq, dur) in &[(1200.0f32, 0.009f32), (1500.0, 0.1), (1900.0, 0.3), (2300.0, 0.05)] {
            let mut tone = ToneGenerator::new(48_000).unwrap();
            tone.emit(freq, dur);
            let crossings = zero_crossings(tone.samples());
            let expected = (2.0 * freq * dur) as i64;
            assert!(
                (crossings as i64 - expected).abs() <= 2,
                "{freq} Hz for {dur} s: {crossings} crossings, expected about {expected}"
            );
        }
    }

    #[test]
    fn phase_is_continuous_across_tone_boundaries() {
        let sample_rate = 48_000.0f32;
        let f_max = 2300.0f32;
        let mut tone = ToneGenerator::new(48_000).unwrap();
        tone.emit(1900.0, 0.030);
        tone.emit(1100.0, 0.030);
        tone.emit(2300.0, 0.030);
        tone.emit(1200.0, 0.030);

        // Between consecutive samples the waveform can move at most as fast
        // as the highest tone allows.
        let bound = AMPLITUDE * 2.0 * (PI * f_max / sample_rate).sin() + 1e-6;
        for w in tone.samples().windows(2) {
            assert!(
                (w[1] - w[0]).abs() <= bound,
                "step {} exceeds bound {}",
                (w[1] - w[0]).abs(),
                bound
            );
        }
    }

    #[test]
    fn amplitude_leaves_headroom() {
        let mut tone = ToneGenerator::new(48_000).unwrap();
        tone.emit(2300.0, 0.1);
        for &s in tone.samples() {
            assert!(s.abs() <= AMPLITUDE + 1e-6);
        }
    }
}

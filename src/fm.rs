//! FM front end: complex baseband prefilter and phase-difference demodulator
//!
//! The alternative to the Goertzel sweep for noisy or frequency-drifting
//! signals (Doppler-shifted satellite passes). Three cascaded stages:
//!
//! 1. Mix the real signal against `exp(-j·2π·Fc·n/Fs)` with Fc = 1900 Hz,
//!    the SSTV band centre, producing complex baseband
//! 2. Kaiser-windowed sinc FIR lowpass, cutoff at half the 800 Hz scan
//!    bandwidth, β = 8, about 2 ms long
//! 3. Instantaneous frequency as the wrapped first difference of the
//!    filtered phase, scaled so ±1 spans Fc ± 400 Hz and clamped to kill
//!    noise spikes
//!
//! The demodulator output cannot represent tones outside 1500-2300 Hz, so
//! sync and VIS detection stay on the Goertzel path; this front end serves
//! data scans only.

use std::f32::consts::PI;

use num_complex::Complex;

use crate::modes::{BLACK_HZ, LEADER_HZ, SCAN_BANDWIDTH_HZ};

/// Baseband mixer centre frequency: middle of the SSTV band
pub const CENTER_HZ: f32 = LEADER_HZ;

/// Total demodulator bandwidth
pub const BANDWIDTH_HZ: f32 = SCAN_BANDWIDTH_HZ;

/// Prefilter impulse-response duration (seconds)
pub const FILTER_DURATION: f32 = 0.002;

/// Kaiser window shape parameter
pub const KAISER_BETA: f64 = 8.0;

/// Modified Bessel function of the first kind, order zero.
///
/// Power series, summed until terms vanish; converges quickly for the
/// argument range a Kaiser window needs.
fn bessel_i0(x: f64) -> f64 {
    let mut sum = 1.0;
    let mut term = 1.0;
    let half_x = x / 2.0;
    for k in 1..=32 {
        term *= (half_x / k as f64) * (half_x / k as f64);
        sum += term;
        if term < sum * 1e-12 {
            break;
        }
    }
    sum
}

/// Kaiser-windowed sinc lowpass taps.
///
/// Odd tap count, normalised so the DC gain is exactly 1.
pub fn kaiser_lowpass_taps(sample_rate: f32, cutoff_hz: f32, duration: f32, beta: f64) -> Vec<f32> {
    let mut len = (duration * sample_rate).round() as usize;
    if len % 2 == 0 {
        len += 1;
    }
    let len = len.max(3);
    let mid = (len - 1) / 2;
    // sinc argument normalisation: cutoff as a fraction of Fs/2 folded into x
    let fc_norm = 2.0 * cutoff_hz / sample_rate;
    let i0_beta = bessel_i0(beta);

    let mut taps = Vec::with_capacity(len);
    for i in 0..len {
        let x = i as f64 - mid as f64;
        let sinc = if x == 0.0 {
            1.0
        } else {
            let arg = PI as f64 * x * fc_norm as f64;
            arg.sin() / arg
        };
        let t = x / mid as f64;
        let window = bessel_i0(beta * (1.0 - t * t).max(0.0).sqrt()) / i0_beta;
        taps.push((sinc * window) as f32);
    }

    let sum: f32 = taps.iter().sum();
    for t in taps.iter_mut() {
        *t /= sum;
    }
    taps
}

/// Multiply each real sample by a complex exponential at `-center_hz`.
pub fn mix_to_baseband(samples: &[f32], sample_rate: f32, center_hz: f32) -> Vec<Complex<f32>> {
    let dphase = -2.0 * PI * center_hz / sample_rate;
    let mut phase = 0.0f32;
    samples
        .iter()
        .map(|&s| {
            let lo = Complex::new(phase.cos(), phase.sin());
            phase += dphase;
            phase %= 2.0 * PI;
            lo * s
        })
        .collect()
}

/// Convolve a complex stream with real taps, output aligned to the input
/// (group delay compensated, zero-padded edges).
pub fn filter_complex(input: &[Complex<f32>], taps: &[f32]) -> Vec<Complex<f32>> {
    let mid = (taps.len() - 1) / 2;
    let mut output = Vec::with_capacity(input.len());
    for n in 0..input.len() {
        let mut acc = Complex::new(0.0f32, 0.0);
        for (k, &tap) in taps.iter().enumerate() {
            let idx = n as isize + k as isize - mid as isize;
            if idx >= 0 && (idx as usize) < input.len() {
                acc += input[idx as usize] * tap;
            }
        }
        output.push(acc);
    }
    output
}

/// Phase-difference discriminator.
///
/// `y[n] = S · wrap(arg(x[n]) - arg(x[n-1]))` with `S = Fs / (π·BW)`, so ±1
/// spans the mixer centre ± BW/2. Output is clamped to [-1, 1].
pub fn demodulate(filtered: &[Complex<f32>], sample_rate: f32, bandwidth_hz: f32) -> Vec<f32> {
    let scale = sample_rate / (PI * bandwidth_hz);
    let mut delayed = Complex::new(0.0f32, 0.0);
    filtered
        .iter()
        .map(|&sample| {
            // delayed* · sample has the wrapped phase difference as its argument
            let diff = (delayed.conj() * sample).arg();
            delayed = sample;
            (diff * scale).clamp(-1.0, 1.0)
        })
        .collect()
}

/// Precomputed per-sample instantaneous-frequency track for a whole stream.
#[derive(Debug, Clone)]
pub struct FmFrontEnd {
    track: Vec<f32>,
}

impl FmFrontEnd {
    /// Run the full mix → filter → demodulate chain once over the input.
    pub fn from_samples(samples: &[f32], sample_rate: f32) -> Self {
        let taps = kaiser_lowpass_taps(
            sample_rate,
            BANDWIDTH_HZ / 2.0,
            FILTER_DURATION,
            KAISER_BETA,
        );
        let baseband = mix_to_baseband(samples, sample_rate, CENTER_HZ);
        let filtered = filter_complex(&baseband, &taps);
        let track = demodulate(&filtered, sample_rate, BANDWIDTH_HZ)
            .into_iter()
            .map(|y| CENTER_HZ + y * BANDWIDTH_HZ / 2.0)
            .collect();
        Self { track }
    }

    /// Mean instantaneous frequency over a sample window.
    pub fn estimate(&self, start: usize, len: usize) -> f32 {
        let end = (start + len).min(self.track.len());
        if start >= end {
            return BLACK_HZ;
        }
        let window = &self.track[start..end];
        window.iter().sum::<f32>() / window.len() as f32
    }

    pub fn len(&self) -> usize {
        self.track.len()
    }

    pub fn is_empty(&self) -> bool {
        self.track.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tone::ToneGenerator;

    fn pure_tone(freq: f32, duration: f32) -> Vec<f32> {
        let mut tone = ToneGenerator::new(48_000).unwrap();
        tone.emit(freq, duration);
        tone.finish()
    }

    fn demod_chain(samples: &[f32]) -> Vec<f32> {
        let taps = kaiser_lowpass_taps(48_000.0, 400.0, FILTER_DURATION, KAISER_BETA);
        let baseband = mix_to_baseband(samples, 48_000.0, 1900.0);
        let filtered = filter_complex(&baseband, &taps);
        demodulate(&filtered, 48_000.0, 800.0)
    }

    #[test]
    fn taps_are_odd_and_sum_to_one() {
        let taps = kaiser_lowpass_taps(48_000.0, 400.0, 0.002, 8.0);
        assert_eq!(taps.len() % 2, 1);
        let sum: f32 = taps.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5, "tap sum was {sum}");
    }

    #[test]
    fn rejection_at_five_times_cutoff_exceeds_20db() {
        let taps = kaiser_lowpass_taps(48_000.0, 400.0, 0.002, 8.0);
        let omega = 2.0 * PI * 2000.0 / 48_000.0;
        let mut response = Complex::new(0.0f32, 0.0);
        for (k, &tap) in taps.iter().enumerate() {
            response += Complex::from_polar(tap, -omega * k as f32);
        }
        // DC gain is 1, so |H| < 0.1 is more than 20 dB down
        assert!(
            response.norm() < 0.1,
            "|H(2 kHz)| = {} (needs < 0.1)",
            response.norm()
        );
    }

    #[test]
    fn bessel_i0_reference_points() {
        assert!((bessel_i0(0.0) - 1.0).abs() < 1e-12);
        // I0(1) = 1.26606..., I0(8) = 427.564...
        assert!((bessel_i0(1.0) - 1.2660658).abs() < 1e-6);
        assert!((bessel_i0(8.0) - 427.56411).abs() < 1e-2);
    }

    #[test]
    fn black_tone_demodulates_low() {
        let out = demod_chain(&pure_tone(1500.0, 0.100));
        let settle = 200;
        let tail = &out[settle..];
        let mean = tail.iter().sum::<f32>() / tail.len() as f32;
        assert!(mean < -0.8, "1500 Hz settled at {mean}");
    }

    #[test]
    fn white_tone_demodulates_high() {
        let out = demod_chain(&pure_tone(2300.0, 0.100));
        let settle = 200;
        let tail = &out[settle..];
        let mean = tail.iter().sum::<f32>() / tail.len() as f32;
        assert!(mean > 0.8, "2300 Hz settled at {mean}");
    }

    #[test]
    fn centre_tone_demodulates_to_zero() {
        let out = demod_chain(&pure_tone(1900.0, 1.0));
        let settle = 200;
        let tail = &out[settle..];
        let mean = tail.iter().sum::<f32>() / tail.len() as f32;
        assert!(mean.abs() <= 0.05, "1900 Hz settled at {mean}");
    }

    #[test]
    fn front_end_tracks_grey_level() {
        // 1900 Hz is the data value 127.5 of the 1500-2300 mapping
        let samples = pure_tone(1900.0, 0.050);
        let fe = FmFrontEnd::from_samples(&samples, 48_000.0);
        let f = fe.estimate(500, 1000);
        assert!((f - 1900.0).abs() < 10.0, "tracked {f} Hz");
    }

    #[test]
    fn estimate_past_end_is_neutral_black() {
        let fe = FmFrontEnd::from_samples(&pure_tone(1900.0, 0.010), 48_000.0);
        assert_eq!(fe.estimate(1_000_000, 100), BLACK_HZ);
    }
}

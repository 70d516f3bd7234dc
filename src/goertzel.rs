//! Goertzel frequency estimation
//!
//! Single-bin DFT magnitude at an arbitrary (non-integer bin) frequency,
//! plus the two-stage argmax sweep the decoder uses per pixel:
//!
//! 1. Coarse: 25 Hz steps across the whole 1100-2500 Hz SSTV band
//! 2. Fine: 1 Hz steps in a ±30 Hz neighbourhood of the coarse winner
//!
//! Everything here is a pure function over a sample window, so callers may
//! parallelise per-line estimation once sync offsets are known.

use std::f32::consts::PI;

/// Lower edge of the sweep (below the 1200 Hz sync tone)
pub const SWEEP_LOW_HZ: f32 = 1100.0;

/// Upper edge of the sweep (above the 2300 Hz white tone)
pub const SWEEP_HIGH_HZ: f32 = 2500.0;

/// Coarse sweep step
pub const COARSE_STEP_HZ: f32 = 25.0;

/// Fine sweep half-width around the coarse winner
pub const FINE_SPAN_HZ: f32 = 30.0;

/// Magnitude |X(f)| / N of the window at one target frequency.
///
/// Uses the Goertzel recurrence with bin index `k = N·f/Fs`, which need not
/// be an integer.
pub fn goertzel_magnitude(samples: &[f32], sample_rate: f32, frequency: f32) -> f32 {
    let n = samples.len();
    if n == 0 {
        return 0.0;
    }

    let omega = 2.0 * PI * frequency / sample_rate;
    let coeff = 2.0 * omega.cos();

    let mut q1 = 0.0f32;
    let mut q2 = 0.0f32;
    for &sample in samples {
        let q0 = coeff * q1 - q2 + sample;
        q2 = q1;
        q1 = q0;
    }

    let real = q1 - q2 * omega.cos();
    let imag = q2 * omega.sin();
    (real * real + imag * imag).sqrt() / n as f32
}

/// Estimate the dominant frequency of `samples` by coarse-then-fine argmax.
///
/// Returns the frequency in Hz whose Goertzel magnitude is largest. The
/// window should cover at least a few cycles of the expected tone; the
/// decoder widens pixel windows to several dwells for exactly this reason.
pub fn estimate_frequency(samples: &[f32], sample_rate: f32) -> f32 {
    let mut best_freq = SWEEP_LOW_HZ;
    let mut best_mag = -1.0f32;

    let mut f = SWEEP_LOW_HZ;
    while f <= SWEEP_HIGH_HZ {
        let mag = goertzel_magnitude(samples, sample_rate, f);
        if mag > best_mag {
            best_mag = mag;
            best_freq = f;
        }
        f += COARSE_STEP_HZ;
    }

    let lo = (best_freq - FINE_SPAN_HZ).max(SWEEP_LOW_HZ);
    let hi = (best_freq + FINE_SPAN_HZ).min(SWEEP_HIGH_HZ);
    let mut f = lo;
    while f <= hi {
        let mag = goertzel_magnitude(samples, sample_rate, f);
        if mag > best_mag {
            best_mag = mag;
            best_freq = f;
        }
        f += 1.0;
    }

    best_freq
}

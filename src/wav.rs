//! WAV container codec
//!
//! Writing emits the canonical 44-byte PCM header (16-bit signed, mono)
//! followed by little-endian samples; this layout is a bit-exact wire
//! contract. Reading accepts whatever PCM container `hound` can parse and
//! hands back normalised f32 samples plus the actual sample rate.

use std::io::Cursor;

/// 44-byte PCM WAV header (16-bit mono)
struct WavHeader {
    sample_rate: u32,
    num_samples: u32,
}

impl WavHeader {
    fn new(sample_rate: u32, num_samples: u32) -> Self {
        Self {
            sample_rate,
            num_samples,
        }
    }

    fn to_bytes(&self) -> [u8; 44] {
        let mut header = [0u8; 44];
        let data_size = self.num_samples * 2;
        let file_size = data_size + 36;

        // RIFF chunk descriptor
        header[0..4].copy_from_slice(b"RIFF");
        header[4..8].copy_from_slice(&file_size.to_le_bytes());
        header[8..12].copy_from_slice(b"WAVE");

        // fmt sub-chunk
        header[12..16].copy_from_slice(b"fmt ");
        header[16..20].copy_from_slice(&16u32.to_le_bytes());
        header[20..22].copy_from_slice(&1u16.to_le_bytes()); // PCM
        header[22..24].copy_from_slice(&1u16.to_le_bytes()); // mono
        header[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());

        let byte_rate = self.sample_rate * 2;
        header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
        header[32..34].copy_from_slice(&2u16.to_le_bytes()); // block align
        header[34..36].copy_from_slice(&16u16.to_le_bytes()); // bits per sample

        // data sub-chunk
        header[36..40].copy_from_slice(b"data");
        header[40..44].copy_from_slice(&data_size.to_le_bytes());

        header
    }
}

/// Convert a float sample in [-1, 1] to 16-bit PCM, clamping out-of-range
/// values.
fn f32_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    (clamped * 32767.0) as i16
}

/// Wrap float samples in a complete 16-bit mono WAV file.
///
/// # Example
/// ```
/// let samples = vec![0.0f32; 4800];
/// let bytes = rustysstv::wav::generate_wav_bytes(&samples, 48_000);
/// assert_eq!(bytes.len(), 44 + 4800 * 2);
/// ```
pub fn generate_wav_bytes(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let num_samples = samples.len() as u32;
    let header = WavHeader::new(sample_rate, num_samples);

    let mut wav_data = Vec::with_capacity(44 + samples.len() * 2);
    wav_data.extend_from_slice(&header.to_bytes());
    for &sample in samples {
        wav_data.extend_from_slice(&f32_to_i16(sample).to_le_bytes());
    }
    wav_data
}

/// Write a WAV file to disk.
pub fn write_wav_file(path: &str, samples: &[f32], sample_rate: u32) -> Result<(), String> {
    std::fs::write(path, generate_wav_bytes(samples, sample_rate))
        .map_err(|e| format!("Failed to write '{}': {}", path, e))
}

/// Decode WAV bytes into normalised f32 samples and the container's sample
/// rate.
///
/// Accepts 16-bit integer or 32-bit float PCM; multi-channel input is
/// reduced to its first channel.
pub fn decode_wav_bytes(bytes: &[u8]) -> Result<(Vec<f32>, u32), String> {
    let reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| format!("Failed to parse WAV: {}", e))?;

    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err("WAV reports zero channels".to_string());
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => match spec.bits_per_sample {
            16 => reader
                .into_samples::<i16>()
                .map(|s| s.map(|v| v as f32 / 32768.0))
                .collect::<Result<_, _>>()
                .map_err(|e| format!("Failed to read samples: {}", e))?,
            other => return Err(format!("Unsupported bit depth: {}", other)),
        },
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| format!("Failed to read samples: {}", e))?,
    };

    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved.into_iter().step_by(channels).collect()
    };

    Ok((samples, spec.sample_rate))
}

/// Read and decode a WAV file from disk.
pub fn read_wav_file(path: &str) -> Result<(Vec<f32>, u32), String> {
    let bytes =
        std::fs::read(path).map_err(|e| format!("Failed to open '{}': {}", path, e))?;
    decode_wav_bytes(&bytes)
}

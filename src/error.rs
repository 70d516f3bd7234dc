use snafu::Snafu;

/// Error kinds for the SSTV codec.
///
/// Structural errors (`InvalidMode`, `RasterSizeMismatch`,
/// `InvalidSampleRate`, `NoSync`) surface immediately through `Result`.
/// Content errors (`UnrecognisedVis`,
/// `TruncatedInput`) are recovered where possible and reported alongside the
/// best-effort output in [`DecodeResult::warnings`](crate::decoder::DecodeResult).
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum SstvError {
    /// Unknown mode name at encode time (caller bug)
    #[snafu(display("unknown SSTV mode name: {name}"))]
    InvalidMode { name: String },

    /// Raster dimensions do not match the encode mode (caller bug)
    #[snafu(display(
        "raster is {width}x{height} but {mode} scans {expected_width}x{expected_height}"
    ))]
    RasterSizeMismatch {
        mode: &'static str,
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },

    /// VIS detection failed; the decoder proceeds in Robot 36
    #[snafu(display("VIS preamble not recognised; decoding as Robot 36"))]
    UnrecognisedVis,

    /// No 1200 Hz sync pulse found anywhere in the stream
    #[snafu(display(
        "no 1200 Hz sync pulse found; input is likely not SSTV audio or its timing is badly skewed"
    ))]
    NoSync,

    /// Sample stream ended before all lines were decoded
    #[snafu(display(
        "sample stream ended after {lines_decoded} of {expected_lines} lines; remainder left black"
    ))]
    TruncatedInput {
        lines_decoded: usize,
        expected_lines: usize,
    },

    /// Non-positive sample rate
    #[snafu(display("invalid sample rate: {sample_rate} Hz"))]
    InvalidSampleRate { sample_rate: u32 },
}

//! SSTV transmission generator
//!
//! Encodes a binary PPM (P6) image as an SSTV WAV file.
//!
//! Usage:
//!   cargo run --bin sstvsim -- [OPTIONS] <input.ppm> <output.wav>
//!
//! Options:
//!   -m, --mode <NAME>     ROBOT36, MARTIN1 or SCOTTIE1 (default: ROBOT36)
//!   -r, --rate <HZ>       Sample rate (default: 48000)
//!   -h, --help            Show this help message
//!
//! The image is resized (nearest neighbour) to the mode's native
//! dimensions before encoding.

use rustysstv::{wav, Encoder, Raster};

struct SimConfig {
    input_path: String,
    output_path: String,
    mode_name: String,
    sample_rate: u32,
}

impl SimConfig {
    fn parse_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();

        let mut mode_name = "ROBOT36".to_string();
        let mut sample_rate = 48_000u32;
        let mut input_path = None;
        let mut output_path = None;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "-m" | "--mode" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("Missing value for --mode".to_string());
                    }
                    mode_name = args[i].clone();
                }
                "-r" | "--rate" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("Missing value for --rate".to_string());
                    }
                    sample_rate = args[i]
                        .parse()
                        .map_err(|_| format!("Invalid sample rate: {}", args[i]))?;
                }
                "-h" | "--help" => {
                    print_help(&args[0]);
                    std::process::exit(0);
                }
                arg if !arg.starts_with('-') => {
                    if input_path.is_none() {
                        input_path = Some(arg.to_string());
                    } else if output_path.is_none() {
                        output_path = Some(arg.to_string());
                    } else {
                        return Err(format!("Unexpected argument: {}", arg));
                    }
                }
                arg => return Err(format!("Unknown option: {}", arg)),
            }
            i += 1;
        }

        Ok(SimConfig {
            input_path: input_path.ok_or("Missing input image argument")?,
            output_path: output_path.ok_or("Missing output file argument")?,
            mode_name,
            sample_rate,
        })
    }
}

fn print_help(program: &str) {
    eprintln!("SSTV Transmission Generator");
    eprintln!();
    eprintln!("Usage: {} [OPTIONS] <input.ppm> <output.wav>", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -m, --mode <NAME>     ROBOT36, MARTIN1 or SCOTTIE1 (default: ROBOT36)");
    eprintln!("  -r, --rate <HZ>       Sample rate (default: 48000)");
    eprintln!("  -h, --help            Show this help message");
}

/// Minimal binary PPM (P6) reader: returns (width, height, RGB bytes).
fn read_ppm(path: &str) -> Result<(usize, usize, Vec<u8>), String> {
    let bytes = std::fs::read(path).map_err(|e| format!("Failed to open '{}': {}", path, e))?;

    let mut pos = 0;
    let mut fields = Vec::new();
    // header: magic, width, height, maxval; '#' starts a comment
    while fields.len() < 4 && pos < bytes.len() {
        match bytes[pos] {
            b'#' => {
                while pos < bytes.len() && bytes[pos] != b'\n' {
                    pos += 1;
                }
            }
            c if c.is_ascii_whitespace() => pos += 1,
            _ => {
                let start = pos;
                while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() {
                    pos += 1;
                }
                fields.push(String::from_utf8_lossy(&bytes[start..pos]).to_string());
            }
        }
    }
    if fields.len() < 4 {
        return Err("Truncated PPM header".to_string());
    }
    if fields[0] != "P6" {
        return Err(format!("Not a binary PPM (magic '{}')", fields[0]));
    }
    let width: usize = fields[1].parse().map_err(|_| "Bad width".to_string())?;
    let height: usize = fields[2].parse().map_err(|_| "Bad height".to_string())?;
    if fields[3] != "255" {
        return Err(format!("Unsupported maxval {}", fields[3]));
    }
    pos += 1; // single whitespace after maxval

    let expected = width * height * 3;
    if bytes.len() < pos + expected {
        return Err("Truncated PPM pixel data".to_string());
    }
    Ok((width, height, bytes[pos..pos + expected].to_vec()))
}

/// Nearest-neighbour resize into the mode's native RGBA dimensions.
fn resize_to_raster(
    rgb: &[u8],
    src_w: usize,
    src_h: usize,
    dst_w: usize,
    dst_h: usize,
) -> Raster {
    let mut data = Vec::with_capacity(dst_w * dst_h * 4);
    for y in 0..dst_h {
        let sy = y * src_h / dst_h;
        for x in 0..dst_w {
            let sx = x * src_w / dst_w;
            let i = (sy * src_w + sx) * 3;
            data.extend_from_slice(&[rgb[i], rgb[i + 1], rgb[i + 2], 255]);
        }
    }
    Raster::from_rgba(dst_w, dst_h, data).expect("sized buffer")
}

fn main() -> Result<(), String> {
    rustysstv::tracing_init::init("rustysstv=info");
    let config = SimConfig::parse_args().map_err(|e| {
        print_help("sstvsim");
        e
    })?;

    println!("SSTV Transmission Generator");
    println!("===========================");
    println!("Input:        {}", config.input_path);
    println!("Mode:         {}", config.mode_name);
    println!("Sample rate:  {} Hz", config.sample_rate);
    println!();

    println!("Step 1: Reading image...");
    let (src_w, src_h, rgb) = read_ppm(&config.input_path)?;
    println!("  Loaded {}x{}", src_w, src_h);

    let encoder = Encoder::new(&config.mode_name, config.sample_rate)
        .map_err(|e| e.to_string())?;
    let mode = encoder.mode();

    println!("Step 2: Resizing to {}x{}...", mode.width, mode.lines);
    let raster = resize_to_raster(&rgb, src_w, src_h, mode.width, mode.lines);

    println!("Step 3: Encoding...");
    let samples = encoder.encode(&raster).map_err(|e| e.to_string())?;
    let duration = samples.len() as f32 / config.sample_rate as f32;
    println!("  Generated {:.2} s waveform ({} samples)", duration, samples.len());

    println!("Step 4: Writing WAV file...");
    wav::write_wav_file(&config.output_path, &samples, config.sample_rate)?;
    let size_kb = (44 + samples.len() * 2) as f32 / 1024.0;
    println!("  Written to: {}", config.output_path);
    println!("  File size: {:.1} KB", size_kb);

    println!();
    println!("Done.");
    Ok(())
}

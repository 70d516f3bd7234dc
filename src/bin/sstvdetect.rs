//! SSTV receiver
//!
//! Decodes an SSTV WAV file into a binary PPM (P6) image.
//!
//! Usage:
//!   cargo run --bin sstvdetect -- [OPTIONS] <input.wav> <output.ppm>
//!
//! Options:
//!   -m, --mode <NAME>     Force a mode instead of trusting VIS detection
//!       --fm              Use the FM phase-difference front end
//!   -h, --help            Show this help message

use rustysstv::{decode, wav, DecoderConfig, FrontEnd, Mode, Raster};

struct DetectConfig {
    input_path: String,
    output_path: String,
    forced_mode: Option<&'static Mode>,
    use_fm_demod: bool,
}

impl DetectConfig {
    fn parse_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();

        let mut forced_mode = None;
        let mut use_fm_demod = false;
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
                    forced_mode = Some(
                        Mode::from_name(&args[i])
                            .ok_or_else(|| format!("Unknown mode: {}", args[i]))?,
                    );
                }
                "--fm" => {
                    use_fm_demod = true;
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

        Ok(DetectConfig {
            input_path: input_path.ok_or("Missing input file argument")?,
            output_path: output_path.ok_or("Missing output file argument")?,
            forced_mode,
            use_fm_demod,
        })
    }
}

fn print_help(program: &str) {
    eprintln!("SSTV Receiver");
    eprintln!();
    eprintln!("Usage: {} [OPTIONS] <input.wav> <output.ppm>", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -m, --mode <NAME>     Force ROBOT36, MARTIN1 or SCOTTIE1");
    eprintln!("      --fm              Use the FM phase-difference front end");
    eprintln!("  -h, --help            Show this help message");
}

/// Write the raster as a binary PPM (P6), dropping alpha.
fn write_ppm(path: &str, raster: &Raster) -> Result<(), String> {
    let mut out = format!("P6\n{} {}\n255\n", raster.width(), raster.height()).into_bytes();
    for px in raster.as_bytes().chunks_exact(4) {
        out.extend_from_slice(&px[..3]);
    }
    std::fs::write(path, out).map_err(|e| format!("Failed to write '{}': {}", path, e))
}

fn main() {
    rustysstv::tracing_init::init("rustysstv=info");
    let config = match DetectConfig::parse_args() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            print_help("sstvdetect");
            std::process::exit(1);
        }
    };

    println!("Reading WAV file: {}", config.input_path);
    let (samples, sample_rate) = match wav::read_wav_file(&config.input_path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error reading WAV: {}", e);
            std::process::exit(1);
        }
    };
    println!("  Samples: {}", samples.len());
    println!("  Sample rate: {} Hz", sample_rate);
    println!(
        "  Duration: {:.2} seconds",
        samples.len() as f32 / sample_rate as f32
    );
    println!();

    let decoder_config = DecoderConfig {
        front_end: if config.use_fm_demod {
            FrontEnd::Fm
        } else {
            FrontEnd::Goertzel
        },
        forced_mode: config.forced_mode,
    };

    println!(
        "Decoding ({} front end)...",
        if config.use_fm_demod { "FM" } else { "Goertzel" }
    );
    let result = match decode(&samples, sample_rate, &decoder_config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Decode failed: {}", e);
            std::process::exit(1);
        }
    };

    println!("  Mode: {}", result.mode.name);
    for warning in &result.warnings {
        println!("  Warning: {}", warning);
    }

    match write_ppm(&config.output_path, &result.raster) {
        Ok(()) => println!("  Written to: {}", config.output_path),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

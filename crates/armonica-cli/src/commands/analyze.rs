//! Measure THD of a WAV file.

use anyhow::{Context, bail};
use armonica_analysis::mixdown_interleaved;
use armonica_engine::{AnalyzerEngine, Mode};
use clap::Args;
use hound::{SampleFormat, WavReader};
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Analysis window size (power of two)
    #[arg(long, default_value = "8192")]
    fft_size: usize,

    /// Host block size used to feed the analyzer
    #[arg(long, default_value = "512")]
    block_size: usize,

    /// Optional settings file applied before analysis
    #[arg(long)]
    settings: Option<PathBuf>,
}

pub fn run(args: AnalyzeArgs) -> anyhow::Result<()> {
    if !args.fft_size.is_power_of_two() {
        bail!("--fft-size must be a power of two, got {}", args.fft_size);
    }
    if args.block_size == 0 {
        bail!("--block-size must be non-zero");
    }

    let (samples, sample_rate) = read_wav_mono(&args.input)?;
    println!(
        "Analyzing {} ({} samples, {} Hz, {:.2}s)...",
        args.input.display(),
        samples.len(),
        sample_rate,
        samples.len() as f32 / sample_rate
    );

    if samples.len() < args.fft_size {
        bail!(
            "file too short: {} samples, need at least {} for one analysis window",
            samples.len(),
            args.fft_size
        );
    }

    let mut engine = AnalyzerEngine::with_fft_size(Mode::ChannelStrip, 0, args.fft_size);
    if let Some(path) = &args.settings {
        let settings = armonica_config::AnalyzerSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?;
        settings.validate(engine.registry().len())?;
        settings.apply_to(&mut engine);
    }

    engine.prepare(sample_rate, args.block_size);
    for block in samples.chunks(args.block_size) {
        engine.process(block);
        // Offline run: nothing consumes the staged frames.
        engine.drain_outbound(|_| {});
    }

    let result = engine.last_analysis();
    println!();
    println!("  Fundamental: {:>10.2} Hz", result.fundamental_hz);
    println!("  THD:         {:>10.4} %", result.thd_percent);
    println!("  THD+N:       {:>10.4} %", result.thd_n_percent);
    println!("  Level (RMS): {:>10.5}", result.level_rms);
    println!("  Noise floor: {:>10.5}", result.noise_floor);
    println!();
    println!("  Harmonics (linear magnitude):");
    for (i, magnitude) in result.harmonics.iter().enumerate() {
        println!("    H{}: {:>12.5}", i + 2, magnitude);
    }

    Ok(())
}

/// Read a WAV file and mix it down to mono f32 samples.
pub fn read_wav_mono(path: &Path) -> anyhow::Result<(Vec<f32>, f32)> {
    let mut reader =
        WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()?
        }
    };

    let mono = mixdown_interleaved(&interleaved, spec.channels as usize);
    Ok((mono, spec.sample_rate as f32))
}

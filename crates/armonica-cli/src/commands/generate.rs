//! Generate measurement test tones.

use anyhow::Context;
use armonica_analysis::generate_distorted_tone;
use clap::Args;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::PathBuf;

#[derive(Args)]
pub struct GenerateArgs {
    /// Tone frequency in Hz
    #[arg(value_name = "FREQUENCY")]
    frequency: f32,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Sample rate in Hz
    #[arg(long, default_value = "48000")]
    sample_rate: u32,

    /// Duration in seconds
    #[arg(long, default_value = "2.0")]
    duration: f32,

    /// Peak amplitude (0.0 to 1.0)
    #[arg(long, default_value = "0.5")]
    amplitude: f32,

    /// Second-harmonic amplitude relative to the fundamental
    #[arg(long, default_value = "0.0")]
    h2: f32,

    /// Third-harmonic amplitude relative to the fundamental
    #[arg(long, default_value = "0.0")]
    h3: f32,
}

pub fn run(args: GenerateArgs) -> anyhow::Result<()> {
    let samples = generate_distorted_tone(
        args.sample_rate as f32,
        args.frequency,
        args.duration,
        args.amplitude,
        args.h2,
        args.h3,
    );

    let spec = WavSpec {
        channels: 1,
        sample_rate: args.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(&args.output, spec)
        .with_context(|| format!("creating {}", args.output.display()))?;
    for &sample in &samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    let expected_thd = (args.h2 * args.h2 + args.h3 * args.h3).sqrt() * 100.0;
    println!(
        "Wrote {} ({} samples at {} Hz, {:.1} Hz tone, expected THD {:.2}%)",
        args.output.display(),
        samples.len(),
        args.sample_rate,
        args.frequency,
        expected_thd
    );

    Ok(())
}

//! Offline channel-strip/master telemetry simulation.
//!
//! Runs several channel-strip engines and one master over generated
//! material, wiring the encoded telemetry bytes between them exactly as a
//! host transport would, then prints the master's registry and aggregate.

use anyhow::bail;
use armonica_analysis::generate_distorted_tone;
use armonica_engine::{AnalyzerEngine, Mode};
use armonica_registry::aggregate_thd;
use clap::Args;

#[derive(Args)]
pub struct SimulateArgs {
    /// Number of channel strips feeding the master
    #[arg(long, default_value = "4")]
    channels: usize,

    /// Simulated duration in seconds
    #[arg(long, default_value = "1.0")]
    duration: f32,

    /// Sample rate in Hz
    #[arg(long, default_value = "48000")]
    sample_rate: u32,

    /// Host block size
    #[arg(long, default_value = "512")]
    block_size: usize,

    /// Mute a channel (repeatable)
    #[arg(long)]
    mute: Vec<usize>,
}

pub fn run(args: SimulateArgs) -> anyhow::Result<()> {
    let sample_rate = args.sample_rate as f32;
    let mut master = AnalyzerEngine::new(Mode::MasterBrain, 0);

    if args.channels == 0 || args.channels > master.registry().len() {
        bail!(
            "--channels must be 1..={}, got {}",
            master.registry().len(),
            args.channels
        );
    }
    if args.block_size == 0 {
        bail!("--block-size must be non-zero");
    }

    master.prepare(sample_rate, args.block_size);
    for &channel in &args.mute {
        if !master.set_muted(channel, true) {
            bail!("--mute {channel} is out of range");
        }
    }

    // Each strip gets its own tone: rising fundamental, rising distortion.
    let mut strips: Vec<AnalyzerEngine> = (0..args.channels)
        .map(|i| {
            let mut strip = AnalyzerEngine::new(Mode::ChannelStrip, i as u8);
            strip.prepare(sample_rate, args.block_size);
            strip
        })
        .collect();

    let signals: Vec<Vec<f32>> = (0..args.channels)
        .map(|i| {
            let frequency = 220.0 * (i + 1) as f32;
            let h2 = 0.01 * (i + 1) as f32;
            let h3 = 0.004 * (i + 1) as f32;
            generate_distorted_tone(sample_rate, frequency, args.duration, 0.5, h2, h3)
        })
        .collect();

    let num_samples = signals.iter().map(Vec::len).min().unwrap_or(0);
    let mut cursor = 0;
    while cursor < num_samples {
        let end = (cursor + args.block_size).min(num_samples);
        for (strip, signal) in strips.iter_mut().zip(&signals) {
            strip.process(&signal[cursor..end]);
            strip.drain_outbound(|frame| master.receive(frame));
        }
        cursor = end;
    }

    println!(
        "{:<6} {:<8} {:>9} {:>9} {:>8} {:>8}",
        "SLOT", "NAME", "THD %", "THD+N %", "LEVEL", "PEAK"
    );
    for channel in master.registry().channels().iter().take(args.channels) {
        let flag = if channel.muted { " [muted]" } else { "" };
        println!(
            "{:<6} {:<8} {:>9.4} {:>9.4} {:>8.4} {:>8.4}{flag}",
            channel.channel_id(),
            channel.name,
            channel.thd,
            channel.thd_n,
            channel.level,
            channel.peak_level
        );
    }

    let aggregate = aggregate_thd(master.registry());
    println!();
    println!(
        "Aggregate: THD {:.4}%  THD+N {:.4}%  worst: {}",
        aggregate.thd,
        aggregate.thd_n,
        aggregate.worst_channel.as_deref().unwrap_or("-")
    );

    Ok(())
}

//! Total harmonic distortion measurement.
//!
//! [`ThdAnalyzer`] turns one full window of time-domain samples into a
//! [`AnalysisResult`]: fundamental frequency, THD and THD+N percentages,
//! RMS level, individual harmonic magnitudes, and a noise-floor estimate.
//! All degenerate inputs (silence, sub-threshold level, short windows,
//! invalid sample rates) degrade to zeroed or partial results rather than
//! errors, so the per-block hot path never fails.

use crate::transform::SpectrumTransform;
use crate::window::SpectralWindow;

/// Number of overtones reported per analysis (H2 through H8).
pub const NUM_HARMONICS: usize = 7;

/// Lower edge of the fundamental search range in Hz.
const FUNDAMENTAL_MIN_HZ: f32 = 20.0;

/// Upper edge of the fundamental search range in Hz.
const FUNDAMENTAL_MAX_HZ: f32 = 2000.0;

/// Blocks with RMS at or below this level report no distortion figures.
const LEVEL_GATE: f32 = 1e-4;

/// Bins closer than this to a harmonic are excluded from the noise estimate.
const HARMONIC_GUARD_BINS: i64 = 10;

/// Measurements produced by one analysis pass over a full window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnalysisResult {
    /// Estimated fundamental frequency in Hz, 0 if none was detected.
    pub fundamental_hz: f32,
    /// Total harmonic distortion in percent, clamped to [0, 100].
    pub thd_percent: f32,
    /// THD plus noise in percent, clamped to [0, 100].
    pub thd_n_percent: f32,
    /// RMS level of the unwindowed analysis block, linear.
    pub level_rms: f32,
    /// Linear magnitudes of harmonics H2..H8, in order. Harmonics whose bin
    /// falls outside the spectrum stay 0; the slot count never changes.
    pub harmonics: [f32; NUM_HARMONICS],
    /// Estimated noise level outside the fundamental/harmonic regions.
    pub noise_floor: f32,
}

/// FFT-based THD analyzer.
///
/// Owns the window table, transform plan, and scratch buffers for one
/// channel, so repeated [`ThdAnalyzer::analyze`] calls allocate nothing.
/// One instance per analyzer channel; no sharing across instances.
pub struct ThdAnalyzer {
    window: SpectralWindow,
    transform: SpectrumTransform,
    windowed: Vec<f32>,
}

impl ThdAnalyzer {
    /// Create an analyzer for windows of `fft_size` samples.
    ///
    /// # Panics
    ///
    /// Panics if `fft_size` is not a power of two (or is < 2).
    pub fn new(fft_size: usize) -> Self {
        Self {
            window: SpectralWindow::hann(fft_size),
            transform: SpectrumTransform::new(fft_size),
            windowed: vec![0.0; fft_size],
        }
    }

    /// The analysis window length in samples.
    pub fn fft_size(&self) -> usize {
        self.transform.size()
    }

    /// Analyze one full window of time-domain samples.
    ///
    /// `input` must hold at least `fft_size` samples; only the first
    /// `fft_size` are used. A shorter slice or a non-positive sample rate
    /// yields the all-zero default result. A detected fundamental with
    /// insufficient level yields a partial result with fundamental and
    /// level filled in but distortion figures at zero.
    pub fn analyze(&mut self, input: &[f32], sample_rate: f32) -> AnalysisResult {
        let mut result = AnalysisResult::default();
        let n = self.transform.size();

        if input.len() < n || sample_rate <= 0.0 {
            return result;
        }

        self.windowed.copy_from_slice(&input[..n]);
        self.window.apply(&mut self.windowed);
        let magnitude = self.transform.magnitudes(&self.windowed);

        let half = n / 2;
        let min_bin =
            (((FUNDAMENTAL_MIN_HZ * n as f32) / sample_rate) as usize).clamp(1, half - 1);
        let max_bin =
            (((FUNDAMENTAL_MAX_HZ * n as f32) / sample_rate) as usize).clamp(min_bin, half - 1);

        // Strictly-greater comparison: on ties the lowest bin wins.
        let mut max_mag = 0.0f32;
        let mut fundamental_bin = 0usize;
        for bin in min_bin..=max_bin {
            if magnitude[bin] > max_mag {
                max_mag = magnitude[bin];
                fundamental_bin = bin;
            }
        }
        result.fundamental_hz = fundamental_bin as f32 * sample_rate / n as f32;

        // Level is measured on the raw block, not the windowed copy.
        let sum_squares: f32 = input[..n].iter().map(|&x| x * x).sum();
        result.level_rms = (sum_squares / n as f32).sqrt();

        if result.fundamental_hz <= 0.0 || result.level_rms <= LEVEL_GATE || max_mag <= 0.0 {
            return result;
        }

        let mut harmonic_sum = 0.0f32;
        for harmonic in 2..=8usize {
            let bin = harmonic_bin(harmonic, result.fundamental_hz, n, sample_rate);
            if (1..half as i64).contains(&bin) {
                let mag = magnitude[bin as usize];
                result.harmonics[harmonic - 2] = mag;
                harmonic_sum += mag * mag;
            }
        }

        let harmonic_level = harmonic_sum.sqrt();
        result.thd_percent = ((harmonic_level / max_mag) * 100.0).clamp(0.0, 100.0);

        let mut noise_sum = 0.0f32;
        let mut noise_bins = 0usize;
        for bin in min_bin..half {
            let near_harmonic = (1..=8usize).any(|harmonic| {
                let h_bin = harmonic_bin(harmonic, result.fundamental_hz, n, sample_rate);
                (bin as i64 - h_bin).abs() < HARMONIC_GUARD_BINS
            });
            if !near_harmonic {
                noise_sum += magnitude[bin] * magnitude[bin];
                noise_bins += 1;
            }
        }

        let noise_level = if noise_bins > 0 {
            (noise_sum / noise_bins as f32).sqrt()
        } else {
            0.0
        };
        result.thd_n_percent =
            (((harmonic_level + noise_level) / max_mag) * 100.0).clamp(0.0, 100.0);
        result.noise_floor = noise_level;

        result
    }
}

/// Spectrum bin holding harmonic `h` of the given fundamental.
///
/// The fundamental frequency is itself bin-quantized, so `harmonic_bin(1)`
/// is exactly the fundamental bin.
fn harmonic_bin(harmonic: usize, fundamental_hz: f32, fft_size: usize, sample_rate: f32) -> i64 {
    ((harmonic as f32 * fundamental_hz * fft_size as f32) / sample_rate).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::generate_test_tone;

    const SAMPLE_RATE: f32 = 48000.0;
    const FFT_SIZE: usize = 8192;

    #[test]
    fn invalid_sample_rate_returns_default() {
        let mut analyzer = ThdAnalyzer::new(FFT_SIZE);
        let signal = generate_test_tone(SAMPLE_RATE, 400.0, 0.5, 0.5);

        assert_eq!(analyzer.analyze(&signal, 0.0), AnalysisResult::default());
        assert_eq!(analyzer.analyze(&signal, -48000.0), AnalysisResult::default());
    }

    #[test]
    fn short_window_returns_default() {
        let mut analyzer = ThdAnalyzer::new(FFT_SIZE);
        let signal = generate_test_tone(SAMPLE_RATE, 400.0, 0.01, 0.5);
        assert!(signal.len() < FFT_SIZE);

        assert_eq!(analyzer.analyze(&signal, SAMPLE_RATE), AnalysisResult::default());
    }

    #[test]
    fn silence_yields_zeroed_result() {
        let mut analyzer = ThdAnalyzer::new(FFT_SIZE);
        let silence = vec![0.0; FFT_SIZE];
        let result = analyzer.analyze(&silence, SAMPLE_RATE);

        assert_eq!(result.level_rms, 0.0);
        assert_eq!(result.thd_percent, 0.0);
        assert_eq!(result.thd_n_percent, 0.0);
        assert_eq!(result.fundamental_hz, 0.0);
        assert_eq!(result.harmonics, [0.0; NUM_HARMONICS]);
    }

    #[test]
    fn sub_threshold_level_reports_partial_result() {
        // Tone well below the 1e-4 RMS gate: fundamental and level are
        // still reported, distortion figures stay zero.
        let mut analyzer = ThdAnalyzer::new(FFT_SIZE);
        let signal = generate_test_tone(SAMPLE_RATE, 400.0, 0.5, 5e-5);
        let result = analyzer.analyze(&signal, SAMPLE_RATE);

        assert!(result.level_rms > 0.0);
        assert_eq!(result.thd_percent, 0.0);
        assert_eq!(result.thd_n_percent, 0.0);
        assert_eq!(result.noise_floor, 0.0);
    }

    #[test]
    fn level_matches_sine_rms() {
        let mut analyzer = ThdAnalyzer::new(FFT_SIZE);
        let amplitude = 0.5;
        let signal = generate_test_tone(SAMPLE_RATE, 400.0, 0.5, amplitude);
        let result = analyzer.analyze(&signal, SAMPLE_RATE);

        let expected = amplitude / 2.0_f32.sqrt();
        assert!(
            (result.level_rms - expected).abs() < 0.01,
            "RMS {} vs expected {expected}",
            result.level_rms
        );
    }

    #[test]
    fn clipped_tone_has_high_thd() {
        let mut analyzer = ThdAnalyzer::new(FFT_SIZE);
        let mut signal = generate_test_tone(SAMPLE_RATE, 400.0, 0.5, 1.0);
        for sample in &mut signal {
            *sample = sample.clamp(-0.5, 0.5);
        }

        let result = analyzer.analyze(&signal, SAMPLE_RATE);
        assert!(
            result.thd_percent > 5.0,
            "clipping should raise THD well above the pure-tone floor, got {}%",
            result.thd_percent
        );
    }

    #[test]
    fn thd_n_includes_thd() {
        let mut analyzer = ThdAnalyzer::new(FFT_SIZE);
        let mut signal = generate_test_tone(SAMPLE_RATE, 400.0, 0.5, 1.0);
        for sample in &mut signal {
            *sample = sample.clamp(-0.7, 0.7);
        }

        let result = analyzer.analyze(&signal, SAMPLE_RATE);
        assert!(
            result.thd_n_percent >= result.thd_percent,
            "THD+N {} must not be below THD {}",
            result.thd_n_percent,
            result.thd_percent
        );
    }

    #[test]
    fn percentages_stay_clamped() {
        // A block of broadband garbage must not push the percentages past 100.
        let mut analyzer = ThdAnalyzer::new(FFT_SIZE);
        let mut state = 0x2545F491u32;
        let noise: Vec<f32> = (0..FFT_SIZE)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state as i32 as f32) / (i32::MAX as f32)
            })
            .collect();

        let result = analyzer.analyze(&noise, SAMPLE_RATE);
        assert!((0.0..=100.0).contains(&result.thd_percent));
        assert!((0.0..=100.0).contains(&result.thd_n_percent));
    }
}

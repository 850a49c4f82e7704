//! Armonica Analysis - FFT-based THD measurement core
//!
//! This crate is the numerical heart of the armonica analyzer:
//!
//! - [`window`] - Precomputed Hann window coefficients
//! - [`transform`] - Forward spectrum transform with reusable scratch
//! - [`thd`] - THD/THD+N measurement over one analysis window
//! - [`ring`] - Rolling sample buffer decoupling host blocks from the
//!   transform size
//! - [`signal`] - Test-tone generation and mixdown utilities
//!
//! The hot path ([`ThdAnalyzer::analyze`] fed from an
//! [`AnalysisRingBuffer`]) performs no allocation, no I/O, and no locking;
//! all buffers are sized at construction.
//!
//! ## Example
//!
//! ```rust
//! use armonica_analysis::{AnalysisRingBuffer, ThdAnalyzer, generate_test_tone};
//!
//! let fft_size = 8192;
//! let mut analyzer = ThdAnalyzer::new(fft_size);
//! let mut ring = AnalysisRingBuffer::new(fft_size);
//!
//! for block in generate_test_tone(48000.0, 400.0, 0.5, 0.5).chunks(512) {
//!     ring.push(block);
//! }
//! assert!(ring.is_full());
//!
//! let result = analyzer.analyze(&ring.read_ordered(), 48000.0);
//! println!("THD: {:.3}% at {:.1} Hz", result.thd_percent, result.fundamental_hz);
//! ```

pub mod ring;
pub mod signal;
pub mod thd;
pub mod transform;
pub mod window;

pub use ring::AnalysisRingBuffer;
pub use signal::{generate_distorted_tone, generate_test_tone, mixdown_interleaved};
pub use thd::{AnalysisResult, NUM_HARMONICS, ThdAnalyzer};
pub use transform::SpectrumTransform;
pub use window::SpectralWindow;

//! Rolling sample buffer feeding the analysis window.

/// Fixed-capacity circular buffer that accumulates host blocks into a
/// rolling analysis window.
///
/// Host block sizes rarely match the transform size, so incoming samples
/// are collected here and the analyzer reads a full ordered window once
/// [`AnalysisRingBuffer::is_full`] reports true. The buffer never
/// reallocates after construction.
#[derive(Debug, Clone)]
pub struct AnalysisRingBuffer {
    buffer: Vec<f32>,
    write_pos: usize,
    filled: bool,
}

impl AnalysisRingBuffer {
    /// Create a ring holding `capacity` samples.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be > 0");

        Self {
            buffer: vec![0.0; capacity],
            write_pos: 0,
            filled: false,
        }
    }

    /// Number of samples the ring holds.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Append samples, silently overwriting the oldest once the buffer wraps.
    pub fn push(&mut self, samples: &[f32]) {
        for &sample in samples {
            self.buffer[self.write_pos] = sample;
            self.write_pos += 1;
            if self.write_pos == self.buffer.len() {
                self.write_pos = 0;
                self.filled = true;
            }
        }
    }

    /// True once the write cursor has wrapped at least once since the last
    /// reset, meaning a full window of real samples is available.
    pub fn is_full(&self) -> bool {
        self.filled
    }

    /// Copy the last `capacity` samples into `out`, oldest first.
    ///
    /// Does not mutate the ring. The write cursor marks the oldest sample,
    /// so the snapshot is the tail from the cursor followed by the head
    /// before it.
    ///
    /// # Panics
    ///
    /// Panics if `out.len() != capacity`.
    pub fn read_ordered_into(&self, out: &mut [f32]) {
        assert_eq!(
            out.len(),
            self.buffer.len(),
            "output length must match ring capacity"
        );

        let tail = self.buffer.len() - self.write_pos;
        out[..tail].copy_from_slice(&self.buffer[self.write_pos..]);
        out[tail..].copy_from_slice(&self.buffer[..self.write_pos]);
    }

    /// Allocate and return the ordered window. Convenience for tests and
    /// offline use; real-time callers should prefer
    /// [`AnalysisRingBuffer::read_ordered_into`] with a preallocated buffer.
    pub fn read_ordered(&self) -> Vec<f32> {
        let mut out = vec![0.0; self.buffer.len()];
        self.read_ordered_into(&mut out);
        out
    }

    /// Zero-fill the buffer and clear the cursor and full flag.
    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
        self.filled = false;
    }
}

//! Linear sample-rate conversion
//!
//! Bridges the chip's fixed native rate to an arbitrary output rate. One
//! [`LinearResampler`] handles one channel; the render pipeline keeps a
//! pair and reconfigures them whenever the device or the output rate
//! changes.
//!
//! The adapter is sized-input driven: callers first ask
//! [`required_input_for_output`](LinearResampler::required_input_for_output)
//! how many native-rate samples are needed, pull exactly that many from the
//! device, and then [`process`](LinearResampler::process) is guaranteed to
//! produce the full output count and consume the full input.

use crate::{Result, SynthError};

/// Single-channel linear interpolating resampler
///
/// Keeps up to two samples of history plus a fractional read position, so
/// consecutive calls are seam-free at any rate ratio. When upsampling, the
/// read position can trail a whole sample behind the freshest input; that
/// sample is absorbed into the history instead of being dropped, so the
/// stream never skips.
#[derive(Debug, Clone)]
pub struct LinearResampler {
    /// Input samples advanced per output sample
    ratio: f64,
    /// Position of the next output sample; the history sample sits at 0,
    /// fresh input after any carried sample at 1, 2, ...
    pos: f64,
    /// Last passed-over input sample (stream position 0)
    prev: f32,
    /// Input sample already received but not yet passed over (stream
    /// position 1); occupied only while upsampling
    ahead: Option<f32>,
}

impl LinearResampler {
    /// Create a resampler converting `source_rate` to `target_rate`
    ///
    /// Fails with [`SynthError::ConfigError`] when either rate is zero.
    pub fn new(source_rate: u32, target_rate: u32) -> Result<Self> {
        if source_rate == 0 || target_rate == 0 {
            return Err(SynthError::ConfigError(format!(
                "invalid resampler rates: {source_rate} -> {target_rate}"
            )));
        }

        Ok(LinearResampler {
            ratio: f64::from(source_rate) / f64::from(target_rate),
            pos: 1.0,
            prev: 0.0,
            ahead: None,
        })
    }

    /// Exact input sample count needed for the next `process` call to
    /// produce `output_count` samples
    pub fn required_input_for_output(&self, output_count: usize) -> usize {
        if output_count == 0 {
            return 0;
        }

        // The last output interpolates up to stream position
        // pos + (n-1) * ratio; history already covers the carried sample.
        let last = self.pos + (output_count - 1) as f64 * self.ratio;
        (last.ceil() as usize).saturating_sub(self.history_len())
    }

    /// Resample `input` into `output`
    ///
    /// Returns `(consumed, produced)`. When `input` holds exactly
    /// [`required_input_for_output`](Self::required_input_for_output) of
    /// `output.len()` samples, `produced == output.len()` and
    /// `consumed == input.len()`; with less input the output is cut short.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) -> (usize, usize) {
        let mut produced = 0;

        for out in output.iter_mut() {
            let p = self.pos + produced as f64 * self.ratio;
            let idx = p.floor() as usize;
            let frac = (p - idx as f64) as f32;

            let Some(s0) = self.stream_sample(input, idx) else {
                break;
            };
            let s1 = if frac == 0.0 {
                s0
            } else {
                match self.stream_sample(input, idx + 1) {
                    Some(s) => s,
                    None => break,
                }
            };

            *out = s0 + frac * (s1 - s0);
            produced += 1;
        }

        // Move the stream origin to the last whole position passed over,
        // carrying one sample of lookahead so nothing provided is dropped.
        let lookahead = self.history_len();
        let highest = lookahead + input.len();
        let end = self.pos + produced as f64 * self.ratio;
        let origin = (end.floor() as usize).min(highest);

        let new_prev = self.stream_sample(input, origin);
        let new_ahead = self.stream_sample(input, origin + 1);
        if let Some(sample) = new_prev {
            self.prev = sample;
        }
        self.ahead = new_ahead;
        self.pos = end - origin as f64;

        // Everything at or before the new origin plus its lookahead has
        // been absorbed into the history.
        let consumed = (origin + 1).saturating_sub(lookahead).min(input.len());

        (consumed, produced)
    }

    /// Extra history beyond `prev`: 1 while a carried sample is held
    fn history_len(&self) -> usize {
        usize::from(self.ahead.is_some())
    }

    /// Sample at a stream position: 0 is `prev`, a carried sample sits at
    /// 1, fresh input follows
    fn stream_sample(&self, input: &[f32], position: usize) -> Option<f32> {
        match position {
            0 => Some(self.prev),
            1 if self.ahead.is_some() => self.ahead,
            p => input.get(p - 1 - self.history_len()).copied(),
        }
    }
}

//! YM2608 (OPNA) FM Synthesizer Control Layer
//!
//! Turns asynchronous musical events — note-on, note-off, instrument patch
//! changes — into the ordered register write sequences a polyphonic FM
//! sound chip expects, and bridges the chip's fixed native sample rate to
//! an arbitrary output rate for real-time playback.
//!
//! # Features
//! - Polyphonic voice allocation over the chip's 6 FM channels with
//!   FIFO voice stealing under channel pressure
//! - Thread-safe command buffer between a control thread and a real-time
//!   render thread
//! - Bit-exact YM2608 register dispatch (block/F-number pitch encoding,
//!   dual register banks, per-operator parameter upload)
//! - Render pipeline with growable scratch buffers and per-channel linear
//!   resampling to the output rate
//! - Pluggable chip cores behind the [`chip::RegisterIo`] seam, with a
//!   built-in non-bit-accurate software core
//!
//! # Quick start
//! ```
//! use opna_synth::{FmInstrument, FmOperator, Note, NoteName, Synth};
//!
//! let synth = Synth::new();
//! assert!(synth.initialize());
//!
//! // A simple 4-op patch.
//! let op = FmOperator { ar: 31, rr: 7, ml: 2, tl: 20, ..Default::default() };
//! let patch = FmInstrument { al: 4, fb: 5, op: [op; 4], ..Default::default() };
//! synth.set_instrument(&patch);
//!
//! // Key a chord; the allocator hands out channels.
//! synth.note_on(Note::new(NoteName::C, 4));
//! synth.note_on(Note::new(NoteName::E, 4));
//! synth.note_on(Note::new(NoteName::G, 4));
//!
//! // Render from the audio callback.
//! let mut left = vec![0.0f32; 512];
//! let mut right = vec![0.0f32; 512];
//! synth.generate(&mut left, &mut right);
//! ```

#![warn(missing_docs)]

pub mod chip; // Device drivers and the register I/O seam
pub mod command; // Control-to-render command buffer
pub mod instrument; // FM patch model
pub mod keyboard; // Polyphonic voice allocation
pub mod note; // Note model and pitch encoding
pub mod resampler; // Native-to-output rate conversion
pub mod synth; // Session object and render pipeline

/// Error types for synthesizer operations
#[derive(thiserror::Error, Debug)]
pub enum SynthError {
    /// Invalid configuration (rates, buffer sizes)
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Error writing audio file
    #[error("Audio file write error: {0}")]
    AudioFileError(String),

    /// IO error from filesystem or device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for synthesizer operations
pub type Result<T> = std::result::Result<T, SynthError>;

// Public API exports
pub use chip::{ChipKind, FmChip, RegisterIo};
pub use command::{Command, CommandQueue};
pub use instrument::{FmInstrument, FmOperator};
pub use keyboard::Keyboard;
pub use note::{Note, NoteName};
pub use resampler::LinearResampler;
pub use synth::{Synth, DEFAULT_OUTPUT_RATE};

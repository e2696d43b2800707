//! Device drivers for FM sound chips
//!
//! Two seams live here. [`FmChip`] is the capability set the synth talks
//! to: musical events in, normalized stereo samples out. [`RegisterIo`] is
//! the boundary to the external chip core underneath a driver: raw
//! address-select/data write pairs and native fixed-point sample frames.
//! The register dispatch protocol between those two layers belongs to the
//! driver, so an alternate synthesis core can be substituted without
//! touching the allocator, command buffer, or protocol logic.

pub mod soft;
pub mod ym2608;

use crate::instrument::FmInstrument;
use crate::note::Note;
use serde::{Deserialize, Serialize};

pub use soft::{Bank, SoftOpna};
pub use ym2608::Ym2608;

/// Raw register/sample interface of an external chip core
///
/// Every logical register write is an address-select write immediately
/// followed by a data write; the `_hi` pair addresses the high register
/// bank on chips that have one.
pub trait RegisterIo: Send {
    /// Return the core to its power-on state
    fn reset(&mut self);

    /// Native sample rate the core produces frames at, in Hz
    fn sample_rate(&self) -> u32;

    /// Select a register in the low bank
    fn write_address(&mut self, address: u8);

    /// Write data to the selected low-bank register
    fn write_data(&mut self, data: u8);

    /// Select a register in the high bank
    fn write_address_hi(&mut self, address: u8);

    /// Write data to the selected high-bank register
    fn write_data_hi(&mut self, data: u8);

    /// Produce one native-rate stereo frame in the core's fixed-point range
    fn generate_frame(&mut self) -> (i32, i32);

    /// Full-scale magnitude of the core's output samples
    fn full_scale(&self) -> f32 {
        f32::from(i16::MAX)
    }
}

/// Capability set of a polyphonic FM device driver
///
/// Implementations own the encoding of musical events into register
/// writes. Samples handed out by [`generate`](FmChip::generate) are
/// normalized to approximately [-1, 1].
pub trait FmChip: Send {
    /// Reset the device to its power-on state
    fn reset(&mut self);

    /// Native sample rate of the device, in Hz
    fn sample_rate(&self) -> u32;

    /// Number of polyphonic voice channels
    fn num_channels(&self) -> u8;

    /// Key `note` on `channel`; out-of-range channels are ignored
    fn note_on(&mut self, channel: u8, note: Note);

    /// Release the note on `channel`; out-of-range channels are ignored
    fn note_off(&mut self, channel: u8, note: Note);

    /// Upload an instrument patch to every channel
    fn set_instrument(&mut self, instrument: &FmInstrument);

    /// Fill both buffers with native-rate samples (equal lengths expected)
    fn generate(&mut self, left: &mut [f32], right: &mut [f32]);
}

/// The supported device kinds
///
/// A closed enum so kind dispatch stays exhaustive; adding a chip means
/// adding a variant and a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChipKind {
    /// Yamaha YM2608 (OPNA), 6 FM channels
    Ym2608,
}

impl ChipKind {
    /// Construct a fresh device of this kind
    pub(crate) fn create(self) -> Box<dyn FmChip + Send> {
        match self {
            ChipKind::Ym2608 => Box::new(Ym2608::new(SoftOpna::new())),
        }
    }
}

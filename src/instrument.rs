//! FM instrument patch model
//!
//! An [`FmInstrument`] is an immutable snapshot of the synthesis parameters
//! for one patch: algorithm, feedback, four operators in fixed slots, and
//! the LFO/modulation-sensitivity settings. Patches are passed by value
//! into commands and uploaded to every channel of the device.
//!
//! The `value_*` methods produce the packed register bytes. Each sub-field
//! is masked to its declared bit width before packing; out-of-range values
//! are truncated, never rejected.

use serde::{Deserialize, Serialize};

/// One FM operator (envelope, level and frequency parameters)
///
/// All fields are small unsigned integers with chip-defined widths
/// (5 bits for rates, 4 for multiple, and so on).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FmOperator {
    /// Attack rate (5 bits)
    pub ar: u8,
    /// Decay rate (5 bits)
    pub dr: u8,
    /// Sustain rate (5 bits)
    pub sr: u8,
    /// Release rate (4 bits)
    pub rr: u8,
    /// Sustain level (4 bits)
    pub sl: u8,
    /// Total level (7 bits on hardware; 6 used here)
    pub tl: u8,
    /// Key scale (2 bits)
    pub ks: u8,
    /// Frequency multiple (4 bits)
    pub ml: u8,
    /// Detune (3 bits)
    pub dt: u8,
    /// SSG-EG envelope mode (4 bits)
    pub ssg_eg: u8,
    /// Amplitude modulation enable
    pub am: bool,
}

impl FmOperator {
    /// Detune / multiple register byte
    pub(crate) fn value_dt_ml(&self) -> u8 {
        (self.dt & 0x07) << 4 | (self.ml & 0x0f)
    }

    /// Total level register byte
    pub(crate) fn value_tl(&self) -> u8 {
        self.tl & 0x3f
    }

    /// Key scale / attack rate register byte
    pub(crate) fn value_ks_ar(&self) -> u8 {
        (self.ks & 0x03) << 6 | (self.ar & 0x1f)
    }

    /// AM enable / decay rate register byte
    pub(crate) fn value_am_dr(&self) -> u8 {
        (u8::from(self.am) << 7) | (self.dr & 0x1f)
    }

    /// Sustain rate register byte
    pub(crate) fn value_sr(&self) -> u8 {
        self.sr & 0x1f
    }

    /// Sustain level / release rate register byte
    pub(crate) fn value_sl_rr(&self) -> u8 {
        (self.sl & 0x0f) << 4 | (self.rr & 0x0f)
    }

    /// SSG-EG mode register byte
    pub(crate) fn value_ssg_eg(&self) -> u8 {
        self.ssg_eg & 0x0f
    }
}

/// A complete FM instrument patch
///
/// The four operators sit in fixed slots (they are not channel-specific);
/// the driver uploads the same patch to every channel of both register
/// banks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FmInstrument {
    /// Algorithm (3 bits): operator connection topology
    pub al: u8,
    /// Feedback (3 bits) for operator 1
    pub fb: u8,
    /// The four operators, in slot order
    pub op: [FmOperator; 4],
    /// LFO frequency (4 bits), global across channels
    pub lfo_freq: u8,
    /// Amplitude modulation sensitivity (2 bits)
    pub ams: u8,
    /// Phase modulation sensitivity (3 bits)
    pub pms: u8,
}

impl FmInstrument {
    /// Feedback / algorithm register byte
    pub(crate) fn value_fb_al(&self) -> u8 {
        (self.fb & 0x07) << 3 | (self.al & 0x07)
    }

    /// LFO frequency register byte
    pub(crate) fn value_lfo_freq(&self) -> u8 {
        self.lfo_freq & 0x0f
    }

    /// AMS / PMS register byte (panning bits are OR'd in by the driver)
    pub(crate) fn value_ams_pms(&self) -> u8 {
        (self.ams & 0x03) << 4 | (self.pms & 0x07)
    }
}

//! Musical note model
//!
//! A [`Note`] pairs one of the 12 pitch classes with an octave and is the
//! key type used by the voice allocator. The OPNA encodes pitch as a 3-bit
//! octave "block" plus an 11-bit F-number; the per-pitch-class F-number
//! constants live here so the register dispatch code only deals in bytes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The 12 pitch classes of the chromatic scale
///
/// Declaration order is significant: the discriminant indexes the F-number
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteName {
    /// C
    C,
    /// C♯
    Cs,
    /// D
    D,
    /// E♭
    Eb,
    /// E
    E,
    /// F
    F,
    /// F♯
    Fs,
    /// G
    G,
    /// G♯
    Gs,
    /// A
    A,
    /// B♭
    Bb,
    /// B
    B,
}

/// 11-bit F-number for each pitch class within one octave block
const F_NUMBER_TABLE: [u16; 12] = [
    0x0266, 0x028b, 0x02b2, 0x02db, 0x0307, 0x0334, 0x0365, 0x0398, 0x03ce, 0x0406, 0x0442, 0x0480,
];

/// A musical note: pitch class plus octave
///
/// Plain value type; equality and hashing are by `(name, octave)` so notes
/// can be used as map keys.
///
/// # Example
///
/// ```
/// use opna_synth::{Note, NoteName};
///
/// let note = Note::new(NoteName::A, 4);
/// assert_eq!(note.to_string(), "A4");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Note {
    /// Pitch class
    pub name: NoteName,
    /// Octave (3-bit "block" on the chip; masked, never rejected)
    pub octave: u8,
}

impl Note {
    /// Create a note from a pitch class and octave
    pub fn new(name: NoteName, octave: u8) -> Self {
        Note { name, octave }
    }

    /// 11-bit F-number for this note's pitch class
    pub(crate) fn f_number(&self) -> u16 {
        F_NUMBER_TABLE[self.name as usize]
    }

    /// Combined block/F-number word: `(octave << 11) | f_number`
    ///
    /// The high byte goes to the block/fnum-high register, the low byte to
    /// the fnum-low register.
    pub(crate) fn block_fnum(&self) -> u16 {
        (u16::from(self.octave & 0x07) << 11) | self.f_number()
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self.name {
            NoteName::C => "C",
            NoteName::Cs => "C#",
            NoteName::D => "D",
            NoteName::Eb => "Eb",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::Fs => "F#",
            NoteName::G => "G",
            NoteName::Gs => "G#",
            NoteName::A => "A",
            NoteName::Bb => "Bb",
            NoteName::B => "B",
        };

        write!(f, "{}{}", name, self.octave)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_display() {
        assert_eq!(Note::new(NoteName::C, 2).to_string(), "C2");
        assert_eq!(Note::new(NoteName::Gs, 5).to_string(), "G#5");
    }

    #[test]
    fn test_note_equality_as_key() {
        assert_eq!(Note::new(NoteName::A, 4), Note::new(NoteName::A, 4));
        assert_ne!(Note::new(NoteName::A, 4), Note::new(NoteName::A, 5));
        assert_ne!(Note::new(NoteName::A, 4), Note::new(NoteName::Bb, 4));
    }

    #[test]
    fn test_block_fnum_encoding() {
        // Octave 0 C: block 0, F-number 0x266
        let c0 = Note::new(NoteName::C, 0);
        assert_eq!(c0.block_fnum(), 0x0266);
        assert_eq!(c0.block_fnum() >> 8, 0x02);
        assert_eq!(c0.block_fnum() & 0xff, 0x66);

        // Octave 5 Bb: block 5 in bits 11..13
        let bb5 = Note::new(NoteName::Bb, 5);
        assert_eq!(bb5.block_fnum(), (5 << 11) | 0x0442);
        assert_eq!(bb5.block_fnum() >> 8, 0x2c);
        assert_eq!(bb5.block_fnum() & 0xff, 0x42);
    }

    #[test]
    fn test_block_masked_to_three_bits() {
        let c9 = Note::new(NoteName::C, 9);
        assert_eq!(c9.block_fnum() >> 11, 1);
    }
}

//! YM2608 (OPNA) register dispatch driver
//!
//! Encodes musical events and instrument patches into the bit-exact write
//! sequences the chip expects. The six FM channels are split across two
//! register banks: channels 0..2 live in the low bank, channels 3..5 in
//! the high bank at the same relative offsets. The key-on/off strobe
//! register (0x28) exists only in the low bank and selects the target
//! channel by a bank-relative index plus a high-bank flag bit.

use super::{FmChip, RegisterIo};
use crate::instrument::FmInstrument;
use crate::note::Note;
use bitflags::bitflags;

/// FM channel count of the OPNA
pub const NUM_FM_CHANNELS: u8 = 6;

// Global registers (low bank only)
const REG_LFO_FREQ: u8 = 0x24;
const REG_KEY_STROBE: u8 = 0x28;
const REG_MODE: u8 = 0x29;

// Per-channel register bases
const REG_FNUM_LO: u8 = 0xa0;
const REG_BLOCK_FNUM_HI: u8 = 0xa4;
const REG_FB_AL: u8 = 0xb0;
const REG_PAN_AMS_PMS: u8 = 0xb4;

// Per-operator register bases
const REG_DT_ML: u8 = 0x30;
const REG_TL: u8 = 0x40;
const REG_KS_AR: u8 = 0x50;
const REG_AM_DR: u8 = 0x60;
const REG_SR: u8 = 0x70;
const REG_SL_RR: u8 = 0x80;
const REG_SSG_EG: u8 = 0x90;

/// Address offsets of the four operator slots within a channel
const OP_SLOT_OFFSETS: [u8; 4] = [0x00, 0x08, 0x04, 0x0c];

/// OPNA mode select (enables the full 6-channel FM section)
const MODE_OPNA: u8 = 0x80;

/// Output to both speakers
const CENTER_PANNING: u8 = 0xc0;

bitflags! {
    /// Key strobe register (0x28) bit fields
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct KeyStrobe: u8 {
        /// Operator slot 1 key-on
        const SLOT1 = 0x10;
        /// Operator slot 2 key-on
        const SLOT2 = 0x20;
        /// Operator slot 3 key-on
        const SLOT3 = 0x40;
        /// Operator slot 4 key-on
        const SLOT4 = 0x80;
        /// All four slots keyed
        const ALL_SLOTS = 0xf0;
        /// Channel is in the high bank
        const BANK_HI = 0x04;
    }
}

/// Driver for the YM2608, generic over the external chip core
///
/// Holds exactly one core; construction selects OPNA mode so all six FM
/// channels are available.
pub struct Ym2608<IO: RegisterIo> {
    io: IO,
}

impl<IO: RegisterIo> Ym2608<IO> {
    /// Wrap a chip core, reset it and select OPNA mode
    pub fn new(io: IO) -> Self {
        let mut chip = Ym2608 { io };
        chip.io.reset();
        chip.power_on();
        chip
    }

    /// Power-on register state: OPNA mode plus center panning on every
    /// channel, so notes keyed before any patch upload are audible
    fn power_on(&mut self) {
        self.write_low(REG_MODE, MODE_OPNA);
        for ch_offset in 0..3 {
            self.write_both(REG_PAN_AMS_PMS + ch_offset, CENTER_PANNING);
        }
    }

    /// Borrow the underlying register I/O core
    pub fn backend(&self) -> &IO {
        &self.io
    }

    fn write_low(&mut self, address: u8, data: u8) {
        self.io.write_address(address);
        self.io.write_data(data);
    }

    fn write_high(&mut self, address: u8, data: u8) {
        self.io.write_address_hi(address);
        self.io.write_data_hi(data);
    }

    /// Per-channel registers alias across banks, so channel settings are
    /// written to both
    fn write_both(&mut self, address: u8, data: u8) {
        self.write_low(address, data);
        self.write_high(address, data);
    }

    /// Bank-relative offset and strobe bits for a channel, or `None` when
    /// the channel is out of range
    fn channel_slot(channel: u8) -> Option<(u8, KeyStrobe)> {
        match channel {
            0..=2 => Some((channel, KeyStrobe::empty())),
            3..=5 => Some((channel - 3, KeyStrobe::BANK_HI)),
            _ => None,
        }
    }
}

impl<IO: RegisterIo> FmChip for Ym2608<IO> {
    fn reset(&mut self) {
        self.io.reset();
        self.power_on();
    }

    fn sample_rate(&self) -> u32 {
        self.io.sample_rate()
    }

    fn num_channels(&self) -> u8 {
        NUM_FM_CHANNELS
    }

    fn note_on(&mut self, channel: u8, note: Note) {
        let Some((offset, bank)) = Self::channel_slot(channel) else {
            return;
        };

        let block_fnum = note.block_fnum();
        let hi = (block_fnum >> 8) as u8;
        let lo = (block_fnum & 0xff) as u8;

        // Block/F-number high byte first, then the low byte.
        if bank.contains(KeyStrobe::BANK_HI) {
            self.write_high(REG_BLOCK_FNUM_HI + offset, hi);
            self.write_high(REG_FNUM_LO + offset, lo);
        } else {
            self.write_low(REG_BLOCK_FNUM_HI + offset, hi);
            self.write_low(REG_FNUM_LO + offset, lo);
        }

        let strobe = KeyStrobe::ALL_SLOTS | bank;
        self.write_low(REG_KEY_STROBE, strobe.bits() | offset);
    }

    fn note_off(&mut self, channel: u8, _note: Note) {
        let Some((offset, bank)) = Self::channel_slot(channel) else {
            return;
        };

        // Slot bits cleared: all four operators released.
        self.write_low(REG_KEY_STROBE, bank.bits() | offset);
    }

    fn set_instrument(&mut self, instrument: &FmInstrument) {
        // LFO frequency is global and lives in the low bank only.
        self.write_low(REG_LFO_FREQ, instrument.value_lfo_freq());

        for ch_offset in 0..3 {
            self.write_both(REG_FB_AL + ch_offset, instrument.value_fb_al());
            self.write_both(
                REG_PAN_AMS_PMS + ch_offset,
                CENTER_PANNING | instrument.value_ams_pms(),
            );

            for (op, op_offset) in instrument.op.iter().zip(OP_SLOT_OFFSETS) {
                let at = ch_offset + op_offset;
                self.write_both(REG_DT_ML + at, op.value_dt_ml());
                self.write_both(REG_TL + at, op.value_tl());
                self.write_both(REG_KS_AR + at, op.value_ks_ar());
                self.write_both(REG_AM_DR + at, op.value_am_dr());
                self.write_both(REG_SR + at, op.value_sr());
                self.write_both(REG_SL_RR + at, op.value_sl_rr());
                self.write_both(REG_SSG_EG + at, op.value_ssg_eg());
            }
        }
    }

    fn generate(&mut self, left: &mut [f32], right: &mut [f32]) {
        let scale = self.io.full_scale();
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let (raw_l, raw_r) = self.io.generate_frame();
            *l = raw_l as f32 / scale;
            *r = raw_r as f32 / scale;
        }
    }
}

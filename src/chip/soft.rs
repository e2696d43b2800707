//! Built-in software chip core
//!
//! A self-contained [`RegisterIo`] implementation standing in for the real
//! OPNA core. It keeps a full shadow image of both register banks and
//! renders a plain sine per keyed channel with a short gain ramp — enough
//! to hear the control layer work and to let tests observe the wire
//! protocol, but deliberately not cycle-accurate (the same trade the
//! experimental softsynth backend makes in other chip emulators).

use super::RegisterIo;
use std::f32::consts::TAU;

/// OPNA master clock in Hz
const MASTER_CLOCK: u32 = 7_987_200;

/// Native sample rate: master clock through the /2 and /48 dividers
const NATIVE_RATE: u32 = MASTER_CLOCK / 96;

/// Per-voice gain, leaving headroom for six simultaneous channels
const VOICE_GAIN: f32 = 0.15;

/// One-pole gain smoothing per native-rate frame
const GAIN_RAMP: f32 = 0.005;

/// Register bank selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bank {
    /// Channels 0..2 and the global registers
    Low,
    /// Channels 3..5
    High,
}

#[derive(Debug, Clone, Copy, Default)]
struct SoftVoice {
    phase: f32,
    phase_inc: f32,
    gain: f32,
    target_gain: f32,
    left_on: bool,
    right_on: bool,
}

impl SoftVoice {
    fn advance(&mut self) -> f32 {
        self.gain += (self.target_gain - self.gain) * GAIN_RAMP;
        if self.phase_inc == 0.0 {
            return 0.0;
        }

        self.phase += self.phase_inc;
        if self.phase > TAU {
            self.phase -= TAU;
        }

        self.phase.sin() * self.gain
    }
}

/// Software OPNA core with shadow register image
pub struct SoftOpna {
    registers: [[u8; 256]; 2],
    latched: [u8; 2],
    voices: [SoftVoice; 6],
}

impl SoftOpna {
    /// Create a core in its power-on state
    pub fn new() -> Self {
        SoftOpna {
            registers: [[0; 256]; 2],
            latched: [0; 2],
            voices: [SoftVoice::default(); 6],
        }
    }

    /// Read back a shadowed register value
    pub fn register(&self, bank: Bank, address: u8) -> u8 {
        self.registers[bank as usize][address as usize]
    }

    fn store(&mut self, bank: usize, data: u8) {
        let address = self.latched[bank];
        self.registers[bank][address as usize] = data;

        if bank == 0 && address == 0x28 {
            self.key_strobe(data);
        }
        if address >= 0xb4 && address <= 0xb6 {
            self.update_panning(bank, address - 0xb4, data);
        }
    }

    /// Decode the key-on/off strobe: bits 4..7 select operator slots,
    /// bit 2 the high bank, bits 0..1 the bank-relative channel
    fn key_strobe(&mut self, data: u8) {
        let rel = data & 0x03;
        if rel > 2 {
            return;
        }
        let ch = if data & 0x04 != 0 { rel + 3 } else { rel };

        if data & 0xf0 != 0 {
            self.key_on(ch);
        } else {
            self.voices[ch as usize].target_gain = 0.0;
        }
    }

    fn key_on(&mut self, ch: u8) {
        let bank = if ch < 3 { 0 } else { 1 };
        let offset = (ch % 3) as usize;

        let hi = self.registers[bank][0xa4 + offset];
        let lo = self.registers[bank][0xa0 + offset];
        let fnum = (u16::from(hi & 0x07) << 8) | u16::from(lo);
        let block = (hi >> 3) & 0x07;

        // OPN pitch: freq = fnum * 2^(block-1) * clock / (144 * 2^20)
        let base = MASTER_CLOCK as f32 / (144.0 * (1 << 20) as f32);
        let freq = f32::from(fnum) * ((i32::from(block) - 1) as f32).exp2() * base;

        let voice = &mut self.voices[ch as usize];
        voice.phase = 0.0;
        voice.phase_inc = TAU * freq / NATIVE_RATE as f32;
        voice.target_gain = VOICE_GAIN;
    }

    fn update_panning(&mut self, bank: usize, offset: u8, data: u8) {
        let ch = bank * 3 + offset as usize;
        if ch < 6 {
            self.voices[ch].left_on = data & 0x80 != 0;
            self.voices[ch].right_on = data & 0x40 != 0;
        }
    }
}

impl Default for SoftOpna {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterIo for SoftOpna {
    fn reset(&mut self) {
        self.registers = [[0; 256]; 2];
        self.latched = [0; 2];
        self.voices = [SoftVoice::default(); 6];
    }

    fn sample_rate(&self) -> u32 {
        NATIVE_RATE
    }

    fn write_address(&mut self, address: u8) {
        self.latched[0] = address;
    }

    fn write_data(&mut self, data: u8) {
        self.store(0, data);
    }

    fn write_address_hi(&mut self, address: u8) {
        self.latched[1] = address;
    }

    fn write_data_hi(&mut self, data: u8) {
        self.store(1, data);
    }

    fn generate_frame(&mut self) -> (i32, i32) {
        let mut left = 0.0f32;
        let mut right = 0.0f32;

        for voice in &mut self.voices {
            let sample = voice.advance();
            if voice.left_on {
                left += sample;
            }
            if voice.right_on {
                right += sample;
            }
        }

        let scale = f32::from(i16::MAX);
        (
            (left.clamp(-1.0, 1.0) * scale) as i32,
            (right.clamp(-1.0, 1.0) * scale) as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_reg(io: &mut SoftOpna, bank: Bank, address: u8, data: u8) {
        match bank {
            Bank::Low => {
                io.write_address(address);
                io.write_data(data);
            }
            Bank::High => {
                io.write_address_hi(address);
                io.write_data_hi(data);
            }
        }
    }

    #[test]
    fn test_native_rate() {
        assert_eq!(SoftOpna::new().sample_rate(), 83_200);
    }

    #[test]
    fn test_shadow_register_image() {
        let mut io = SoftOpna::new();
        write_reg(&mut io, Bank::Low, 0xb0, 0x3c);
        write_reg(&mut io, Bank::High, 0xb0, 0x21);

        assert_eq!(io.register(Bank::Low, 0xb0), 0x3c);
        assert_eq!(io.register(Bank::High, 0xb0), 0x21);

        io.reset();
        assert_eq!(io.register(Bank::Low, 0xb0), 0);
    }

    #[test]
    fn test_keyed_channel_produces_audio() {
        let mut io = SoftOpna::new();

        // Center panning, then C4 on channel 0 with all slots keyed.
        write_reg(&mut io, Bank::Low, 0xb4, 0xc0);
        write_reg(&mut io, Bank::Low, 0xa4, 0x22);
        write_reg(&mut io, Bank::Low, 0xa0, 0x66);
        write_reg(&mut io, Bank::Low, 0x28, 0xf0);

        let peak = (0..4096)
            .map(|_| io.generate_frame().0.abs())
            .max()
            .unwrap();
        assert!(peak > 1000, "keyed voice should be audible, got {peak}");
    }

    #[test]
    fn test_key_off_fades_out() {
        let mut io = SoftOpna::new();
        write_reg(&mut io, Bank::Low, 0xb4, 0xc0);
        write_reg(&mut io, Bank::Low, 0xa4, 0x22);
        write_reg(&mut io, Bank::Low, 0xa0, 0x66);
        write_reg(&mut io, Bank::Low, 0x28, 0xf0);

        for _ in 0..4096 {
            io.generate_frame();
        }

        write_reg(&mut io, Bank::Low, 0x28, 0x00);
        for _ in 0..16384 {
            io.generate_frame();
        }

        let peak = (0..512).map(|_| io.generate_frame().0.abs()).max().unwrap();
        assert!(peak < 200, "released voice should fade, got {peak}");
    }

    #[test]
    fn test_high_bank_strobe_targets_upper_channels() {
        let mut io = SoftOpna::new();
        write_reg(&mut io, Bank::High, 0xb5, 0xc0);
        write_reg(&mut io, Bank::High, 0xa5, 0x22);
        write_reg(&mut io, Bank::High, 0xa1, 0x66);
        // Channel 4: high-bank flag | offset 1.
        write_reg(&mut io, Bank::Low, 0x28, 0xf0 | 0x04 | 0x01);

        let peak = (0..4096)
            .map(|_| io.generate_frame().0.abs())
            .max()
            .unwrap();
        assert!(peak > 1000);
    }
}

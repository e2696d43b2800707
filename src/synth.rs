//! Synthesizer session: control surface and render pipeline
//!
//! A [`Synth`] owns one device at a time plus the voice allocator, command
//! buffer, resamplers and scratch buffers around it. Two lock regions keep
//! the control path and the real-time render path out of each other's way:
//!
//! - the *input* region guards the allocator and the command buffer (and
//!   the register writes performed while draining);
//! - the *output* region guards sample generation, the scratch buffers and
//!   the resamplers.
//!
//! A render call holds the input region only while draining, releases it,
//! then takes the output region to generate — the two critical sections
//! never nest. Device and rate switches take both regions in that same
//! order. The device itself sits behind its own lock, always acquired
//! after whichever region lock is held, so the order is fixed and
//! deadlock-free.
//!
//! No threads are spawned here; the host calls in on whatever control and
//! audio threads it has.

use crate::chip::{ChipKind, FmChip};
use crate::command::{Command, CommandQueue};
use crate::instrument::FmInstrument;
use crate::keyboard::Keyboard;
use crate::note::Note;
use crate::resampler::LinearResampler;
use parking_lot::Mutex;

/// Output rate used by [`Synth::initialize`]
pub const DEFAULT_OUTPUT_RATE: u32 = 44_100;

/// Control-path state (input region)
struct InputStage {
    keyboard: Keyboard,
    commands: CommandQueue,
}

/// Render-path state (output region)
struct OutputStage {
    resamplers: Option<(LinearResampler, LinearResampler)>,
    scratch_left: Vec<f32>,
    scratch_right: Vec<f32>,
    output_rate: u32,
}

/// One synthesizer instance
///
/// Uninitialized until [`initialize`](Synth::initialize) or
/// [`switch_device`](Synth::switch_device) creates a device; all mutating
/// operations are silent no-ops while no device exists. Methods take
/// `&self` so a single instance can be shared between a control thread and
/// an audio callback (e.g. behind an `Arc`).
///
/// # Example
///
/// ```
/// use opna_synth::{FmInstrument, Note, NoteName, Synth};
///
/// let synth = Synth::new();
/// assert!(synth.initialize());
///
/// synth.set_instrument(&FmInstrument::default());
/// synth.note_on(Note::new(NoteName::A, 4));
///
/// let mut left = vec![0.0; 512];
/// let mut right = vec![0.0; 512];
/// synth.generate(&mut left, &mut right);
/// ```
pub struct Synth {
    input: Mutex<InputStage>,
    output: Mutex<OutputStage>,
    /// The single live device instance, shared by both regions
    device: Mutex<Option<Box<dyn FmChip + Send>>>,
}

impl Synth {
    /// Create an uninitialized synthesizer
    pub fn new() -> Self {
        Synth {
            input: Mutex::new(InputStage {
                keyboard: Keyboard::new(0),
                commands: CommandQueue::new(),
            }),
            output: Mutex::new(OutputStage {
                resamplers: None,
                scratch_left: Vec::new(),
                scratch_right: Vec::new(),
                output_rate: DEFAULT_OUTPUT_RATE,
            }),
            device: Mutex::new(None),
        }
    }

    /// Create the default device ([`ChipKind::Ym2608`]) at the current
    /// output rate
    ///
    /// Returns `false` when device or resampler setup fails.
    pub fn initialize(&self) -> bool {
        let rate = self.output.lock().output_rate;
        self.switch_device(ChipKind::Ym2608, rate)
    }

    /// Tear the session down
    ///
    /// Drops the device and resamplers; returns `false` when there was no
    /// live device. The instance can be re-initialized afterwards.
    pub fn deinitialize(&self) -> bool {
        let mut input = self.input.lock();
        let mut output = self.output.lock();
        let mut device = self.device.lock();

        if device.is_none() {
            return false;
        }

        *device = None;
        output.resamplers = None;
        input.keyboard = Keyboard::new(0);
        input.commands.clear();

        true
    }

    /// Reset the live device to its power-on register state
    ///
    /// No-op when uninitialized.
    pub fn reset(&self) {
        if let Some(device) = self.device.lock().as_mut() {
            device.reset();
        }
    }

    /// Replace the device with a fresh instance of `kind` and set the
    /// output rate
    ///
    /// The voice allocator is rebuilt for the new channel count (all
    /// assignments discarded), pending commands are dropped, and both
    /// resamplers are reconfigured for the new device's native rate. On
    /// failure the previous rate state is left intact and `false` is
    /// returned.
    pub fn switch_device(&self, kind: ChipKind, output_rate: u32) -> bool {
        let mut input = self.input.lock();
        let mut output = self.output.lock();
        let mut device = self.device.lock();

        let chip = kind.create();

        let resamplers = match Self::make_resamplers(chip.sample_rate(), output_rate) {
            Some(pair) => pair,
            None => return false,
        };

        input.keyboard = Keyboard::new(chip.num_channels());
        input.commands.clear();
        output.resamplers = Some(resamplers);
        output.output_rate = output_rate;
        *device = Some(chip);

        true
    }

    /// Change the output sample rate
    ///
    /// Returns `false` when uninitialized or when the rate is unusable; in
    /// both cases the previous state is untouched.
    pub fn set_output_rate(&self, output_rate: u32) -> bool {
        let _input = self.input.lock();
        let mut output = self.output.lock();
        let device = self.device.lock();

        let Some(chip) = device.as_ref() else {
            return false;
        };

        let Some(resamplers) = Self::make_resamplers(chip.sample_rate(), output_rate) else {
            return false;
        };

        output.resamplers = Some(resamplers);
        output.output_rate = output_rate;

        true
    }

    /// Current output sample rate in Hz
    pub fn output_rate(&self) -> u32 {
        self.output.lock().output_rate
    }

    /// Queue a note-on
    ///
    /// Consults the voice allocator; when a voice is stolen, the evicted
    /// note's note-off is queued ahead of the new note-on since both share
    /// one physical channel. Re-triggering an already-sounding note queues
    /// nothing.
    pub fn note_on(&self, note: Note) {
        let mut input = self.input.lock();

        let Some((channel, evicted)) = input.keyboard.note_on(note) else {
            return;
        };

        if let Some(evicted) = evicted {
            input.commands.push(Command::NoteOff {
                channel,
                note: evicted,
            });
        }

        input.commands.push(Command::NoteOn { channel, note });
    }

    /// Queue a note-off
    ///
    /// No-op when the note is not currently assigned a channel.
    pub fn note_off(&self, note: Note) {
        let mut input = self.input.lock();

        if let Some(channel) = input.keyboard.note_off(note) {
            input.commands.push(Command::NoteOff { channel, note });
        }
    }

    /// Queue an instrument patch upload
    ///
    /// No-op when uninitialized.
    pub fn set_instrument(&self, instrument: &FmInstrument) {
        let mut input = self.input.lock();

        if self.device.lock().is_none() {
            return;
        }

        input.commands.push(Command::SetInstrument(*instrument));
    }

    /// Render `min(left.len(), right.len())` output-rate frames
    ///
    /// Drains all pending commands against the device first, so every
    /// event queued before this call is audible in its output. When
    /// uninitialized the buffers are left untouched (callers pre-zero if
    /// silence is required).
    pub fn generate(&self, left: &mut [f32], right: &mut [f32]) {
        // Input region: apply the whole command backlog.
        {
            let mut input = self.input.lock();
            let mut device = self.device.lock();

            if let Some(chip) = device.as_mut() {
                input.commands.drain(|command| match command {
                    Command::NoteOn { channel, note } => chip.note_on(channel, note),
                    Command::NoteOff { channel, note } => chip.note_off(channel, note),
                    Command::SetInstrument(instrument) => chip.set_instrument(&instrument),
                });
            }
        }

        // Output region: pull native samples and resample.
        let frames = left.len().min(right.len());
        let mut output = self.output.lock();
        let output = &mut *output;
        let mut device = self.device.lock();

        let (Some(chip), Some((rs_left, rs_right))) =
            (device.as_mut(), output.resamplers.as_mut())
        else {
            return;
        };

        let needed = rs_left.required_input_for_output(frames);

        // Scratch buffers grow as needed and never shrink.
        if output.scratch_left.len() < needed {
            output.scratch_left.resize(needed, 0.0);
            output.scratch_right.resize(needed, 0.0);
        }

        chip.generate(
            &mut output.scratch_left[..needed],
            &mut output.scratch_right[..needed],
        );

        rs_left.process(&output.scratch_left[..needed], &mut left[..frames]);
        rs_right.process(&output.scratch_right[..needed], &mut right[..frames]);
    }

    fn make_resamplers(
        native_rate: u32,
        output_rate: u32,
    ) -> Option<(LinearResampler, LinearResampler)> {
        let left = LinearResampler::new(native_rate, output_rate).ok()?;
        let right = LinearResampler::new(native_rate, output_rate).ok()?;
        Some((left, right))
    }
}

impl Default for Synth {
    fn default() -> Self {
        Self::new()
    }
}

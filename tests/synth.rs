//! End-to-end tests over the host-facing synthesizer surface.

use opna_synth::chip::{Bank, SoftOpna, Ym2608};
use opna_synth::{
    ChipKind, Command, CommandQueue, FmChip, FmInstrument, FmOperator, Note, NoteName, Synth,
};

fn patch(al: u8, fb: u8) -> FmInstrument {
    let op = FmOperator {
        ar: 31,
        rr: 7,
        ml: 1,
        tl: 10,
        ..Default::default()
    };
    FmInstrument {
        al,
        fb,
        op: [op; 4],
        ..Default::default()
    }
}

#[test]
fn commands_apply_in_order_before_generation() {
    // Two instrument uploads drained through the command buffer: the
    // device's register state must reflect only the last one.
    let p1 = patch(2, 1);
    let p2 = patch(5, 7);

    let mut queue = CommandQueue::new();
    queue.push(Command::SetInstrument(p1));
    queue.push(Command::SetInstrument(p2));

    let mut chip = Ym2608::new(SoftOpna::new());
    queue.drain(|cmd| match cmd {
        Command::NoteOn { channel, note } => chip.note_on(channel, note),
        Command::NoteOff { channel, note } => chip.note_off(channel, note),
        Command::SetInstrument(inst) => chip.set_instrument(&inst),
    });

    let expected = (7 << 3) | 5; // fb/al byte of p2
    for offset in 0..3 {
        assert_eq!(chip.backend().register(Bank::Low, 0xb0 + offset), expected);
        assert_eq!(chip.backend().register(Bank::High, 0xb0 + offset), expected);
    }
}

#[test]
fn note_events_reach_the_device_registers() {
    let synth = Synth::new();
    assert!(synth.initialize());

    synth.set_instrument(&patch(4, 5));
    synth.note_on(Note::new(NoteName::C, 4));

    // Nothing hits the device until a render call drains the queue.
    let mut left = vec![0.0f32; 256];
    let mut right = vec![0.0f32; 256];
    synth.generate(&mut left, &mut right);

    // A second note lands on the next channel and is audible after the
    // attack ramp.
    synth.note_on(Note::new(NoteName::G, 4));
    let mut peak = 0.0f32;
    for _ in 0..16 {
        synth.generate(&mut left, &mut right);
        peak = left.iter().fold(peak, |m, s| m.max(s.abs()));
    }
    assert!(peak > 0.01, "expected audible output, got {peak}");
}

#[test]
fn note_before_any_patch_upload_is_audible() {
    // Power-on panning must come from the driver itself: a note keyed
    // right after initialize, with no set_instrument yet, still sounds.
    let synth = Synth::new();
    assert!(synth.initialize());

    synth.note_on(Note::new(NoteName::A, 4));

    let mut left = vec![0.0f32; 512];
    let mut right = vec![0.0f32; 512];
    let mut peak = 0.0f32;
    for _ in 0..16 {
        synth.generate(&mut left, &mut right);
        for (l, r) in left.iter().zip(right.iter()) {
            peak = peak.max(l.abs()).max(r.abs());
        }
    }

    assert!(peak > 0.01, "unpatched note should be audible, got {peak}");
}

#[test]
fn voice_stealing_scenario_on_full_pool() {
    // Fill all six channels, then one more: the very first note must be
    // the one evicted, audible as note-off + note-on on its channel.
    let synth = Synth::new();
    assert!(synth.initialize());

    let first = Note::new(NoteName::C, 2);
    synth.note_on(first);
    for octave in 3..8 {
        synth.note_on(Note::new(NoteName::C, octave));
    }

    synth.note_on(Note::new(NoteName::D, 2));

    // The stolen note no longer counts as active: releasing it is a no-op,
    // while releasing the newcomer frees its (reused) channel for another
    // note without any further stealing.
    synth.note_off(first);
    synth.note_off(Note::new(NoteName::D, 2));
    synth.note_on(Note::new(NoteName::E, 2));

    let mut left = vec![0.0f32; 128];
    let mut right = vec![0.0f32; 128];
    synth.generate(&mut left, &mut right);
}

#[test]
fn device_switch_reconfigures_rates_and_allocator() {
    let synth = Synth::new();
    assert!(synth.initialize());
    assert_eq!(synth.output_rate(), 44_100);

    for octave in 0..6 {
        synth.note_on(Note::new(NoteName::A, octave));
    }

    assert!(synth.switch_device(ChipKind::Ym2608, 48_000));
    assert_eq!(synth.output_rate(), 48_000);

    // Fresh allocator: the same six notes all fit again.
    for octave in 0..6 {
        synth.note_on(Note::new(NoteName::A, octave));
    }

    let mut left = vec![0.0f32; 480];
    let mut right = vec![0.0f32; 480];
    synth.generate(&mut left, &mut right);
}

#[test]
fn generate_is_shareable_across_threads() {
    use std::sync::Arc;

    let synth = Arc::new(Synth::new());
    assert!(synth.initialize());
    synth.set_instrument(&patch(4, 5));

    let control = {
        let synth = Arc::clone(&synth);
        std::thread::spawn(move || {
            for octave in 0..8 {
                for name in [NoteName::C, NoteName::E, NoteName::G] {
                    synth.note_on(Note::new(name, octave));
                }
                for name in [NoteName::C, NoteName::E, NoteName::G] {
                    synth.note_off(Note::new(name, octave));
                }
            }
        })
    };

    let render = {
        let synth = Arc::clone(&synth);
        std::thread::spawn(move || {
            let mut left = vec![0.0f32; 256];
            let mut right = vec![0.0f32; 256];
            for _ in 0..32 {
                synth.generate(&mut left, &mut right);
            }
        })
    };

    control.join().unwrap();
    render.join().unwrap();
}

#[test]
fn driver_is_usable_as_chip_trait_object() {
    // The session only sees the FmChip capability set; a driver over the
    // built-in core satisfies it directly.
    let mut chip: Box<dyn FmChip + Send> = Box::new(Ym2608::new(SoftOpna::new()));
    assert_eq!(chip.num_channels(), 6);
    assert_eq!(chip.sample_rate(), 83_200);

    chip.set_instrument(&patch(4, 5));
    chip.note_on(0, Note::new(NoteName::A, 4));

    let mut left = vec![0.0f32; 1024];
    let mut right = vec![0.0f32; 1024];
    chip.generate(&mut left, &mut right);
    chip.note_off(0, Note::new(NoteName::A, 4));
}

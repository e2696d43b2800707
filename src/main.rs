//! Demo CLI: renders a short chord progression to a stereo WAV file.
//!
//! Usage: `opna-synth [output.wav]`

use anyhow::{bail, Context, Result};
use opna_synth::{FmInstrument, FmOperator, Note, NoteName, Synth, DEFAULT_OUTPUT_RATE};

/// Render quantum, in frames
const BLOCK_FRAMES: usize = 512;

/// A bright electric-piano-ish 4-op patch
fn demo_patch() -> FmInstrument {
    let carrier = FmOperator {
        ar: 31,
        dr: 6,
        sr: 2,
        rr: 7,
        sl: 2,
        tl: 4,
        ml: 1,
        ..Default::default()
    };
    let modulator = FmOperator {
        ar: 28,
        dr: 8,
        sr: 3,
        rr: 8,
        sl: 4,
        tl: 30,
        ml: 2,
        dt: 3,
        ..Default::default()
    };

    FmInstrument {
        al: 4,
        fb: 5,
        op: [modulator, carrier, modulator, carrier],
        lfo_freq: 0,
        ams: 0,
        pms: 0,
    }
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let output_path = args.next().unwrap_or_else(|| "opna-demo.wav".to_string());
    if args.next().is_some() {
        bail!("usage: opna-synth [output.wav]");
    }

    let synth = Synth::new();
    if !synth.initialize() {
        bail!("failed to initialize the synthesizer");
    }

    synth.set_instrument(&demo_patch());

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: DEFAULT_OUTPUT_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&output_path, spec)
        .with_context(|| format!("creating {output_path}"))?;

    let chords: [&[(NoteName, u8)]; 4] = [
        &[(NoteName::C, 4), (NoteName::E, 4), (NoteName::G, 4)],
        &[(NoteName::A, 3), (NoteName::C, 4), (NoteName::E, 4)],
        &[(NoteName::F, 3), (NoteName::A, 3), (NoteName::C, 4)],
        &[(NoteName::G, 3), (NoteName::B, 3), (NoteName::D, 4)],
    ];

    let mut left = vec![0.0f32; BLOCK_FRAMES];
    let mut right = vec![0.0f32; BLOCK_FRAMES];

    let chord_blocks = DEFAULT_OUTPUT_RATE as usize / BLOCK_FRAMES; // ~1s each
    let release_blocks = chord_blocks / 4;

    for chord in chords {
        for &(name, octave) in chord {
            synth.note_on(Note::new(name, octave));
        }

        for _ in 0..chord_blocks {
            render_block(&synth, &mut left, &mut right, &mut writer)?;
        }

        for &(name, octave) in chord {
            synth.note_off(Note::new(name, octave));
        }

        for _ in 0..release_blocks {
            render_block(&synth, &mut left, &mut right, &mut writer)?;
        }
    }

    writer.finalize().context("finalizing WAV file")?;
    println!("wrote {output_path}");

    Ok(())
}

fn render_block(
    synth: &Synth,
    left: &mut [f32],
    right: &mut [f32],
    writer: &mut hound::WavWriter<std::io::BufWriter<std::fs::File>>,
) -> Result<()> {
    left.fill(0.0);
    right.fill(0.0);
    synth.generate(left, right);

    for (l, r) in left.iter().zip(right.iter()) {
        writer.write_sample((l.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16)?;
        writer.write_sample((r.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16)?;
    }

    Ok(())
}

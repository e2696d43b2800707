//! Command buffer between the control path and the render path
//!
//! Musical events are not applied to the device the moment they arrive;
//! the control path queues them here and the render path drains the whole
//! backlog at the start of every generate call, so register writes always
//! happen on the rendering side in enqueue order.
//!
//! The queue itself is not synchronized; the synth serializes access with
//! its input-region lock.

use crate::instrument::FmInstrument;
use crate::note::Note;
use std::collections::VecDeque;

/// One pending musical event
///
/// A closed set of variants dispatched by pattern match; ownership moves
/// from the producer into the queue, then to the consumer on drain.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Key a note on the given channel
    NoteOn {
        /// Target device channel
        channel: u8,
        /// Note to sound
        note: Note,
    },
    /// Release the note on the given channel
    NoteOff {
        /// Target device channel
        channel: u8,
        /// Note being released
        note: Note,
    },
    /// Upload an instrument patch to every channel
    SetInstrument(FmInstrument),
}

/// FIFO queue of pending commands
///
/// Unbounded: events accumulate if render calls stall and are cleared in
/// one full drain per render call.
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: VecDeque<Command>,
}

impl CommandQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        CommandQueue {
            pending: VecDeque::new(),
        }
    }

    /// Append a command at the tail
    pub fn push(&mut self, command: Command) {
        self.pending.push_back(command);
    }

    /// Remove and apply every pending command in enqueue order
    ///
    /// This is a full drain, not a bounded batch: it stops only when the
    /// queue is empty. Each command is applied exactly once.
    pub fn drain(&mut self, mut apply: impl FnMut(Command)) {
        while let Some(command) = self.pending.pop_front() {
            apply(command);
        }
    }

    /// Discard all pending commands (used when the device is replaced and
    /// queued channel assignments no longer exist)
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Number of pending commands
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::NoteName;

    #[test]
    fn test_drain_preserves_global_order() {
        let mut queue = CommandQueue::new();
        let note = Note::new(NoteName::C, 4);

        queue.push(Command::SetInstrument(FmInstrument::default()));
        queue.push(Command::NoteOn { channel: 0, note });
        queue.push(Command::NoteOff { channel: 0, note });
        assert_eq!(queue.len(), 3);

        let mut seen = Vec::new();
        queue.drain(|cmd| seen.push(cmd));

        assert_eq!(seen.len(), 3);
        assert!(matches!(seen[0], Command::SetInstrument(_)));
        assert!(matches!(seen[1], Command::NoteOn { channel: 0, .. }));
        assert!(matches!(seen[2], Command::NoteOff { channel: 0, .. }));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_applies_each_command_once() {
        let mut queue = CommandQueue::new();
        for ch in 0..6 {
            queue.push(Command::NoteOn {
                channel: ch,
                note: Note::new(NoteName::A, 4),
            });
        }

        let mut count = 0;
        queue.drain(|_| count += 1);
        assert_eq!(count, 6);

        // A second drain sees nothing.
        queue.drain(|_| count += 1);
        assert_eq!(count, 6);
    }

    #[test]
    fn test_clear_discards_backlog() {
        let mut queue = CommandQueue::new();
        queue.push(Command::SetInstrument(FmInstrument::default()));
        queue.clear();
        assert!(queue.is_empty());
    }
}

//! Polyphonic voice allocation
//!
//! The [`Keyboard`] maps sounding notes to a fixed pool of device channels
//! and steals the oldest voice when the pool is exhausted. It is a pure
//! bookkeeping component: it decides *which* channel a note gets, and the
//! caller turns that decision into device commands.
//!
//! Eviction is strict FIFO by note-on order (not LRU-by-use): when all
//! channels are busy, the note whose note-on was issued least recently is
//! the one that loses its channel. The tie-break is therefore deterministic
//! and matches insertion order.

use crate::note::Note;
use std::collections::{HashMap, VecDeque};

/// Tracks which notes are sounding on which channels
///
/// Internally three owned structures are kept mutually consistent: a
/// note→channel map, a recency-ordered queue of active notes (front =
/// newest), and a free-channel list. At most `num_polyphony` notes are
/// active at any time.
#[derive(Debug)]
pub struct Keyboard {
    /// Active notes, most recently activated at the front
    queue: VecDeque<Note>,
    /// Channels currently unassigned; lowest-numbered channels first at start
    free_channels: VecDeque<u8>,
    /// Note → assigned channel
    assignments: HashMap<Note, u8>,
}

impl Keyboard {
    /// Create an allocator for `num_polyphony` channels, labeled
    /// `0..num_polyphony`, all initially free
    pub fn new(num_polyphony: u8) -> Self {
        Keyboard {
            queue: VecDeque::with_capacity(num_polyphony as usize),
            free_channels: (0..num_polyphony).collect(),
            assignments: HashMap::with_capacity(num_polyphony as usize),
        }
    }

    /// Assign a channel to `note`
    ///
    /// Returns `None` when the note is already sounding (re-triggering is a
    /// no-op at this layer). Otherwise returns the assigned channel and,
    /// when a voice had to be stolen, the evicted note. The caller must
    /// emit a note-off for the evicted note alongside the new note-on since
    /// both share one physical channel.
    pub fn note_on(&mut self, note: Note) -> Option<(u8, Option<Note>)> {
        if self.assignments.contains_key(&note) {
            return None;
        }

        let mut evicted = None;
        if self.free_channels.is_empty() {
            // Steal the oldest active voice (back of the recency queue).
            let oldest = self.queue.pop_back()?;
            let ch = self.assignments.remove(&oldest)?;
            self.free_channels.push_back(ch);
            evicted = Some(oldest);
        }

        let ch = self.free_channels.pop_front()?;
        self.queue.push_front(note);
        self.assignments.insert(note, ch);

        Some((ch, evicted))
    }

    /// Release the channel assigned to `note`
    ///
    /// Returns the freed channel, or `None` when the note was not sounding.
    pub fn note_off(&mut self, note: Note) -> Option<u8> {
        let ch = self.assignments.remove(&note)?;
        self.queue.retain(|n| *n != note);
        self.free_channels.push_back(ch);

        Some(ch)
    }

    /// Number of currently sounding notes
    pub fn active_count(&self) -> usize {
        self.assignments.len()
    }
}

//! Simulation events and the ring buffer that holds them.
//!
//! Step events (`WireChanged`, `LitChanged`) are recorded during commit.
//! Edit events are recorded when commands are applied through
//! [`Simulator::apply_commands`](crate::engine::Simulator::apply_commands).
//! The buffer has a fixed capacity; when full, the oldest event is dropped.

use crate::component::ComponentKind;
use crate::id::{ComponentId, WireId};
use crate::sim::Ticks;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// Something observable that happened to the circuit. Carries the tick at
/// which it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // -- Step --
    WireChanged {
        wire: WireId,
        value: bool,
        tick: Ticks,
    },
    LitChanged {
        component: ComponentId,
        lit: bool,
        tick: Ticks,
    },

    // -- Edits --
    ComponentAdded {
        component: ComponentId,
        kind: ComponentKind,
        tick: Ticks,
    },
    ComponentRemoved {
        component: ComponentId,
        tick: Ticks,
    },
    Connected {
        wire: WireId,
        component: ComponentId,
        input: usize,
        tick: Ticks,
    },
    Disconnected {
        wire: WireId,
        component: ComponentId,
        input: usize,
        tick: Ticks,
    },
    Activated {
        component: ComponentId,
        tick: Ticks,
    },
}

/// Discriminant of [`Event`], used for suppression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    WireChanged,
    LitChanged,
    ComponentAdded,
    ComponentRemoved,
    Connected,
    Disconnected,
    Activated,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::WireChanged { .. } => EventKind::WireChanged,
            Event::LitChanged { .. } => EventKind::LitChanged,
            Event::ComponentAdded { .. } => EventKind::ComponentAdded,
            Event::ComponentRemoved { .. } => EventKind::ComponentRemoved,
            Event::Connected { .. } => EventKind::Connected,
            Event::Disconnected { .. } => EventKind::Disconnected,
            Event::Activated { .. } => EventKind::Activated,
        }
    }

    pub fn tick(&self) -> Ticks {
        match *self {
            Event::WireChanged { tick, .. }
            | Event::LitChanged { tick, .. }
            | Event::ComponentAdded { tick, .. }
            | Event::ComponentRemoved { tick, .. }
            | Event::Connected { tick, .. }
            | Event::Disconnected { tick, .. }
            | Event::Activated { tick, .. } => tick,
        }
    }
}

// ---------------------------------------------------------------------------
// Ring buffer
// ---------------------------------------------------------------------------

/// Default number of events retained by a simulator.
pub const DEFAULT_EVENT_CAPACITY: usize = 4096;

/// Fixed-capacity ring buffer of events, oldest first.
#[derive(Debug, Clone)]
pub struct EventBuffer {
    slots: Vec<Option<Event>>,
    /// Next write position.
    head: usize,
    len: usize,
    /// Events ever pushed, including overwritten ones.
    total_written: u64,
    /// Events overwritten while the buffer was full.
    dropped: u64,
}

impl EventBuffer {
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: vec![None; capacity],
            head: 0,
            len: 0,
            total_written: 0,
            dropped: 0,
        }
    }

    /// Append an event, overwriting the oldest one if full.
    pub fn push(&mut self, event: Event) {
        self.slots[self.head] = Some(event);
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        } else {
            self.dropped += 1;
        }
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Events lost to overwriting. Draining or clearing does not count.
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    /// Index of the oldest stored event.
    fn start(&self) -> usize {
        (self.head + self.capacity() - self.len) % self.capacity()
    }

    /// Events from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Event> + '_ {
        let start = self.start();
        (0..self.len).filter_map(move |i| self.slots[(start + i) % self.capacity()].as_ref())
    }

    /// Remove and return all stored events, oldest first.
    pub fn drain(&mut self) -> Vec<Event> {
        let start = self.start();
        let capacity = self.capacity();
        let events = (0..self.len)
            .filter_map(|i| self.slots[(start + i) % capacity].take())
            .collect();
        self.head = 0;
        self.len = 0;
        events
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.head = 0;
        self.len = 0;
    }
}

impl Default for EventBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

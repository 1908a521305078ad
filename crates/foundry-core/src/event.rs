//! Typed transport events with pre-allocated ring buffers.
//!
//! Events are emitted while the simulator ticks or resyncs and are delivered
//! in batch at the end of each tick. Each event kind has its own
//! [`EventBuffer`] with a configurable capacity.
//!
//! Kinds can be suppressed via [`EventBus::suppress`], which prevents any
//! allocation or recording for that kind.

use crate::fixed::Ticks;
use crate::id::{ItemId, ItemTypeId};
use foundry_spatial::GridPosition;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A transport event. All events carry the tick at which they occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ItemSpawned {
        item: ItemId,
        item_type: ItemTypeId,
        cell: GridPosition,
        tick: Ticks,
    },
    ItemTransferred {
        item: ItemId,
        from: GridPosition,
        to: GridPosition,
        tick: Ticks,
    },
    /// An item reached the end of a belt with nothing downstream.
    ItemParked {
        item: ItemId,
        cell: GridPosition,
        tick: Ticks,
    },
    /// The downstream segment had no room at its entry.
    TransferBlocked {
        item: ItemId,
        from: GridPosition,
        to: GridPosition,
        tick: Ticks,
    },
    ItemDestroyed {
        item: ItemId,
        cell: GridPosition,
        tick: Ticks,
    },
    SegmentsRebuilt {
        segments: usize,
        destroyed: usize,
        tick: Ticks,
    },
}

/// Discriminant tag for event types, used for suppression and subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ItemSpawned,
    ItemTransferred,
    ItemParked,
    TransferBlocked,
    ItemDestroyed,
    SegmentsRebuilt,
}

const EVENT_KIND_COUNT: usize = 6;

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ItemSpawned { .. } => EventKind::ItemSpawned,
            Event::ItemTransferred { .. } => EventKind::ItemTransferred,
            Event::ItemParked { .. } => EventKind::ItemParked,
            Event::TransferBlocked { .. } => EventKind::TransferBlocked,
            Event::ItemDestroyed { .. } => EventKind::ItemDestroyed,
            Event::SegmentsRebuilt { .. } => EventKind::SegmentsRebuilt,
        }
    }
}

impl EventKind {
    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventBuffer: pre-allocated ring buffer
// ---------------------------------------------------------------------------

/// A pre-allocated ring buffer for events. Fixed capacity; when full, the
/// oldest events are dropped.
#[derive(Debug)]
pub struct EventBuffer {
    events: Vec<Option<Event>>,
    /// Write position (wraps around).
    head: usize,
    len: usize,
    /// Total events ever written (including dropped).
    total_written: u64,
}

impl EventBuffer {
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
        }
    }

    /// Push an event. If full, the oldest event is dropped.
    pub fn push(&mut self, event: Event) {
        self.events[self.head] = Some(event);
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.events.len()
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

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        // head is the next write slot, which holds the oldest entry once full.
        let start = if self.len < self.capacity() { 0 } else { self.head };
        (0..self.len).filter_map(move |i| self.events[(start + i) % self.capacity()].as_ref())
    }

    pub fn clear(&mut self) {
        for slot in &mut self.events {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// A passive listener receives events read-only.
pub type PassiveListener = Box<dyn FnMut(&Event)>;

/// One ring buffer per event kind, listener lists, and suppression flags.
pub struct EventBus {
    buffers: [Option<EventBuffer>; EVENT_KIND_COUNT],
    suppressed: [bool; EVENT_KIND_COUNT],
    listeners: [Vec<PassiveListener>; EVENT_KIND_COUNT],
    default_capacity: usize,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("buffers", &self.buffers)
            .field("suppressed", &self.suppressed)
            .field("default_capacity", &self.default_capacity)
            .finish_non_exhaustive()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus {
    pub fn new(default_capacity: usize) -> Self {
        Self {
            buffers: Default::default(),
            suppressed: [false; EVENT_KIND_COUNT],
            listeners: Default::default(),
            default_capacity,
        }
    }

    /// Suppressed kinds are never allocated or buffered.
    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
        self.buffers[kind.index()] = None;
    }

    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed[kind.index()]
    }

    /// Buffer an event. No-op if its kind is suppressed.
    pub fn emit(&mut self, event: Event) {
        let idx = event.kind().index();
        if self.suppressed[idx] {
            return;
        }
        let capacity = self.default_capacity;
        self.buffers[idx]
            .get_or_insert_with(|| EventBuffer::new(capacity))
            .push(event);
    }

    /// Register a listener, called in registration order on delivery.
    pub fn on_passive(&mut self, kind: EventKind, listener: PassiveListener) {
        self.listeners[kind.index()].push(listener);
    }

    /// Events of `kind` buffered since the last delivery.
    pub fn pending(&self, kind: EventKind) -> impl Iterator<Item = &Event> {
        self.buffers[kind.index()].iter().flat_map(EventBuffer::iter)
    }

    /// Deliver every buffered event to its listeners, oldest first, then
    /// clear the buffers.
    pub fn deliver(&mut self) {
        for idx in 0..EVENT_KIND_COUNT {
            let Some(buffer) = self.buffers[idx].as_mut() else {
                continue;
            };
            if buffer.is_empty() {
                continue;
            }
            for event in buffer.iter() {
                for listener in &mut self.listeners[idx] {
                    listener(event);
                }
            }
            buffer.clear();
        }
    }
}

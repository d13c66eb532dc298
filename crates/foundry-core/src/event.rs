//! Typed simulation events with ring-buffered delivery.
//!
//! Events are emitted while entities update and items move, and delivered in
//! one batch at the end of the tick. Each event kind has its own
//! [`EventBuffer`], allocated lazily on first emit.
//!
//! Kinds can be suppressed via [`EventBus::suppress`]; a suppressed kind is
//! never buffered.

use crate::fixed::Ticks;
use crate::grid::GridPosition;
use crate::id::{ItemTypeId, RecipeId};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A simulation event. All events carry the tick at which they occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // -- Items --
    ItemSpawned {
        at: GridPosition,
        item_type: ItemTypeId,
        tick: Ticks,
    },
    ItemAbsorbed {
        into: GridPosition,
        item_type: ItemTypeId,
        tick: Ticks,
    },

    // -- Production --
    SmeltStarted {
        furnace: GridPosition,
        recipe: RecipeId,
        tick: Ticks,
    },
    SmeltCompleted {
        furnace: GridPosition,
        recipe: RecipeId,
        tick: Ticks,
    },
    CraftStarted {
        assembler: GridPosition,
        recipe: RecipeId,
        tick: Ticks,
    },
    CraftCompleted {
        assembler: GridPosition,
        recipe: RecipeId,
        tick: Ticks,
    },
    DrillBlocked {
        drill: GridPosition,
        tick: Ticks,
    },

    // -- Inserters --
    ItemPickedUp {
        inserter: GridPosition,
        item_type: ItemTypeId,
        tick: Ticks,
    },
    ItemDropped {
        inserter: GridPosition,
        item_type: ItemTypeId,
        tick: Ticks,
    },

    // -- World --
    EntityPlaced {
        at: GridPosition,
        tick: Ticks,
    },
    EntityRemoved {
        at: GridPosition,
        tick: Ticks,
    },
}

/// Discriminant tag for event types, used for suppression and subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ItemSpawned,
    ItemAbsorbed,
    SmeltStarted,
    SmeltCompleted,
    CraftStarted,
    CraftCompleted,
    DrillBlocked,
    ItemPickedUp,
    ItemDropped,
    EntityPlaced,
    EntityRemoved,
}

const EVENT_KIND_COUNT: usize = 11;

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ItemSpawned { .. } => EventKind::ItemSpawned,
            Event::ItemAbsorbed { .. } => EventKind::ItemAbsorbed,
            Event::SmeltStarted { .. } => EventKind::SmeltStarted,
            Event::SmeltCompleted { .. } => EventKind::SmeltCompleted,
            Event::CraftStarted { .. } => EventKind::CraftStarted,
            Event::CraftCompleted { .. } => EventKind::CraftCompleted,
            Event::DrillBlocked { .. } => EventKind::DrillBlocked,
            Event::ItemPickedUp { .. } => EventKind::ItemPickedUp,
            Event::ItemDropped { .. } => EventKind::ItemDropped,
            Event::EntityPlaced { .. } => EventKind::EntityPlaced,
            Event::EntityRemoved { .. } => EventKind::EntityRemoved,
        }
    }

    pub fn tick(&self) -> Ticks {
        match self {
            Event::ItemSpawned { tick, .. }
            | Event::ItemAbsorbed { tick, .. }
            | Event::SmeltStarted { tick, .. }
            | Event::SmeltCompleted { tick, .. }
            | Event::CraftStarted { tick, .. }
            | Event::CraftCompleted { tick, .. }
            | Event::DrillBlocked { tick, .. }
            | Event::ItemPickedUp { tick, .. }
            | Event::ItemDropped { tick, .. }
            | Event::EntityPlaced { tick, .. }
            | Event::EntityRemoved { tick, .. } => *tick,
        }
    }
}

impl EventKind {
    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventBuffer
// ---------------------------------------------------------------------------

/// A fixed-capacity ring buffer. When full, the oldest event is overwritten.
#[derive(Debug)]
pub struct EventBuffer {
    events: Vec<Option<Event>>,
    /// Next write position, which is also the oldest entry once full.
    head: usize,
    len: usize,
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

    /// Total events written since creation, dropped ones included.
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        let start = if self.len < self.capacity() { 0 } else { self.head };
        let capacity = self.capacity();
        (0..self.len).filter_map(move |i| self.events[(start + i) % capacity].as_ref())
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

/// A read-only subscriber, e.g. a renderer playing a sound on `ItemDropped`.
pub type PassiveListener = Box<dyn FnMut(&Event)>;

/// One ring buffer and one listener list per event kind.
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
        Self::new(1024)
    }
}

impl EventBus {
    /// Create a bus whose per-kind buffers hold `default_capacity` events.
    pub fn new(default_capacity: usize) -> Self {
        Self {
            buffers: Default::default(),
            suppressed: [false; EVENT_KIND_COUNT],
            listeners: Default::default(),
            default_capacity,
        }
    }

    /// Stop recording an event kind and drop its buffer.
    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
        self.buffers[kind.index()] = None;
    }

    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed[kind.index()]
    }

    /// Buffer an event until the next [`EventBus::deliver`]. No-op for a
    /// suppressed kind.
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

    /// Register a listener for one event kind. Listeners run in
    /// registration order.
    pub fn on_passive(&mut self, kind: EventKind, listener: PassiveListener) {
        self.listeners[kind.index()].push(listener);
    }

    /// Events of one kind buffered since the last delivery.
    pub fn buffered(&self, kind: EventKind) -> impl Iterator<Item = &Event> {
        self.buffers[kind.index()].iter().flat_map(|b| b.iter())
    }

    /// Total events buffered across all kinds.
    pub fn pending_count(&self) -> usize {
        self.buffers.iter().flatten().map(EventBuffer::len).sum()
    }

    /// Hand every buffered event to its listeners, oldest first, kind by
    /// kind, then clear the buffers.
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

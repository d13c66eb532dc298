//! Placeable entities and the grid-keyed registry that holds them.
//!
//! Every entity occupies exactly one tile. Variant behaviour lives in the
//! submodules and is dispatched by matching on [`EntityKind`]; the shared
//! parts (position, facing, input and output inventories) live on
//! [`Entity`] itself.

mod assembler;
mod drill;
mod furnace;
mod inserter;

pub use assembler::{Assembler, CraftState};
pub use drill::Drill;
pub use furnace::{Furnace, SmeltState};
pub use inserter::{Inserter, InserterState};

use crate::event::EventBus;
use crate::fixed::{Fixed64, Ticks};
use crate::grid::{Direction, GridPosition};
use crate::id::ItemTypeId;
use crate::inventory::Inventory;
use crate::item::ItemPool;
use crate::registry::Registry;
use crate::resource::ResourceLookup;
use crate::sim::SimConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Entity types
// ---------------------------------------------------------------------------

/// Payload-free tag naming an entity variant. Used for placement and by
/// renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Belt,
    Drill,
    Furnace,
    Inserter,
    Assembler,
}

/// Variant-specific state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// Belts have no state of their own; transport reads their facing.
    Belt,
    Drill(Drill),
    Furnace(Furnace),
    Inserter(Inserter),
    Assembler(Assembler),
}

impl EntityKind {
    /// Fresh state for a newly placed entity of `entity_type`.
    pub fn new(entity_type: EntityType, config: &SimConfig) -> Self {
        match entity_type {
            EntityType::Belt => EntityKind::Belt,
            EntityType::Drill => EntityKind::Drill(Drill::new(config.mining_rate)),
            EntityType::Furnace => EntityKind::Furnace(Furnace::new()),
            EntityType::Inserter => EntityKind::Inserter(Inserter::new()),
            EntityType::Assembler => EntityKind::Assembler(Assembler::new()),
        }
    }

    pub fn entity_type(&self) -> EntityType {
        match self {
            EntityKind::Belt => EntityType::Belt,
            EntityKind::Drill(_) => EntityType::Drill,
            EntityKind::Furnace(_) => EntityType::Furnace,
            EntityKind::Inserter(_) => EntityType::Inserter,
            EntityKind::Assembler(_) => EntityType::Assembler,
        }
    }

    pub fn is_belt(&self) -> bool {
        matches!(self, EntityKind::Belt)
    }

    /// Whether inserters drop into this entity's input inventory rather than
    /// onto the ground in front of it.
    pub fn has_input_buffer(&self) -> bool {
        matches!(self, EntityKind::Furnace(_) | EntityKind::Assembler(_))
    }

    /// Whether a loose item of `item` is absorbed by this entity when it
    /// reaches the tile centre. Furnaces take anything smeltable; assemblers
    /// take ingredients of their assigned recipe.
    pub fn accepts(&self, item: ItemTypeId, registry: &Registry) -> bool {
        match self {
            EntityKind::Furnace(_) => registry.is_smeltable(item),
            EntityKind::Assembler(a) => a
                .recipe()
                .and_then(|id| registry.get_recipe(id))
                .is_some_and(|r| r.takes(item)),
            EntityKind::Belt | EntityKind::Drill(_) | EntityKind::Inserter(_) => false,
        }
    }
}

/// A placed entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub position: GridPosition,
    pub facing: Direction,
    pub input: Inventory,
    pub output: Inventory,
    pub kind: EntityKind,
}

impl Entity {
    pub fn new(position: GridPosition, facing: Direction, kind: EntityKind, capacity: u32) -> Self {
        Self {
            position,
            facing,
            input: Inventory::new(capacity),
            output: Inventory::new(capacity),
            kind,
        }
    }

    pub fn entity_type(&self) -> EntityType {
        self.kind.entity_type()
    }

    /// Advance this entity by one tick. The entity must not be in
    /// `ctx.entities` while it updates.
    pub fn update(&mut self, ctx: &mut TickContext<'_>) {
        let Entity {
            position,
            facing,
            input,
            output,
            kind,
        } = self;
        match kind {
            EntityKind::Belt => {}
            EntityKind::Drill(drill) => drill.update(*position, *facing, ctx),
            EntityKind::Furnace(furnace) => furnace.update(*position, input, output, ctx),
            EntityKind::Inserter(inserter) => inserter.update(*position, *facing, ctx),
            EntityKind::Assembler(assembler) => assembler.update(*position, input, output, ctx),
        }
    }

    /// Progress of the current job as a 0..1 fraction, for renderers.
    pub fn progress(&self, registry: &Registry) -> Fixed64 {
        match &self.kind {
            EntityKind::Drill(d) => d.progress(),
            EntityKind::Furnace(f) => f.progress(registry),
            EntityKind::Assembler(a) => a.progress(registry),
            EntityKind::Belt | EntityKind::Inserter(_) => Fixed64::ZERO,
        }
    }

    pub fn as_drill(&self) -> Option<&Drill> {
        match &self.kind {
            EntityKind::Drill(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_furnace(&self) -> Option<&Furnace> {
        match &self.kind {
            EntityKind::Furnace(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_inserter(&self) -> Option<&Inserter> {
        match &self.kind {
            EntityKind::Inserter(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_assembler(&self) -> Option<&Assembler> {
        match &self.kind {
            EntityKind::Assembler(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_assembler_mut(&mut self) -> Option<&mut Assembler> {
        match &mut self.kind {
            EntityKind::Assembler(a) => Some(a),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tick context
// ---------------------------------------------------------------------------

/// Everything an entity (or the transport step) may read or mutate during
/// one tick.
pub struct TickContext<'a> {
    pub entities: &'a mut EntityRegistry,
    pub items: &'a mut ItemPool,
    pub resources: &'a dyn ResourceLookup,
    pub registry: &'a Registry,
    pub config: &'a SimConfig,
    pub events: &'a mut EventBus,
    /// Seconds covered by this tick. Always positive.
    pub dt: Fixed64,
    /// Index of the tick being run.
    pub tick: Ticks,
}

// ---------------------------------------------------------------------------
// Entity registry
// ---------------------------------------------------------------------------

/// Entities keyed by grid coordinate. Iteration is in ascending coordinate
/// order, which fixes the per-tick update order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRegistry {
    entities: BTreeMap<GridPosition, Entity>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, position: GridPosition) -> Option<&Entity> {
        self.entities.get(&position)
    }

    pub fn get_mut(&mut self, position: GridPosition) -> Option<&mut Entity> {
        self.entities.get_mut(&position)
    }

    /// Store an entity at its own position, returning whatever was there.
    pub fn set(&mut self, entity: Entity) -> Option<Entity> {
        self.entities.insert(entity.position, entity)
    }

    pub fn remove(&mut self, position: GridPosition) -> Option<Entity> {
        self.entities.remove(&position)
    }

    pub fn contains(&self, position: GridPosition) -> bool {
        self.entities.contains_key(&position)
    }

    /// Snapshot of occupied coordinates in update order.
    pub fn positions(&self) -> Vec<GridPosition> {
        self.entities.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GridPosition, &Entity)> {
        self.entities.iter().map(|(p, e)| (*p, e))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (GridPosition, &mut Entity)> {
        self.entities.iter_mut().map(|(p, e)| (*p, e))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

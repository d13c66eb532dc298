//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available outside the crate via the `test-utils` feature.

use crate::engine::Engine;
use crate::entity::{Entity, EntityKind, EntityRegistry, EntityType, TickContext};
use crate::event::EventBus;
use crate::fixed::{Fixed64, Ticks};
use crate::grid::{Direction, GridPosition};
use crate::id::{ItemId, ItemTypeId};
use crate::item::ItemPool;
use crate::registry::{Registry, names};
use crate::resource::ResourceMap;
use crate::sim::{SimConfig, SimulationStrategy};
use crate::transport::{TransportOutcome, transport_item};
use std::sync::Arc;

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

pub fn pos(x: i32, y: i32) -> GridPosition {
    GridPosition::new(x, y)
}

// ===========================================================================
// Bare world for driving single entities
// ===========================================================================

/// The pieces an [`Engine`] owns, laid out so a test can update one entity
/// or move one item at a time.
#[derive(Debug)]
pub struct TestWorld {
    pub entities: EntityRegistry,
    pub items: ItemPool,
    pub resources: ResourceMap,
    pub registry: Registry,
    pub config: SimConfig,
    pub events: EventBus,
    pub tick: Ticks,
}

impl TestWorld {
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    pub fn with_config(config: SimConfig) -> Self {
        Self {
            entities: EntityRegistry::new(),
            items: ItemPool::new(),
            resources: ResourceMap::new(),
            registry: Registry::standard(),
            config,
            events: EventBus::default(),
            tick: 0,
        }
    }

    /// Item kind by name from the standard registry. Panics on a typo.
    pub fn item(&self, name: &str) -> ItemTypeId {
        self.registry
            .item_id(name)
            .unwrap_or_else(|| panic!("unknown item {name}"))
    }

    pub fn place(&mut self, position: GridPosition, entity_type: EntityType, facing: Direction) {
        let kind = EntityKind::new(entity_type, &self.config);
        self.entities
            .set(Entity::new(position, facing, kind, self.config.inventory_capacity));
    }

    /// Run one tick of a single entity, then apply pending item changes.
    pub fn update_at(&mut self, position: GridPosition) {
        let Some(mut entity) = self.entities.remove(position) else {
            panic!("no entity at {position:?}");
        };
        entity.update(&mut self.context());
        self.entities.set(entity);
        self.items.apply_pending();
        self.tick += 1;
    }

    /// Run the transport step for a single item, then apply pending changes.
    pub fn transport(&mut self, id: ItemId) -> TransportOutcome {
        let outcome = transport_item(id, &mut self.context());
        self.items.apply_pending();
        outcome
    }

    fn context(&mut self) -> TickContext<'_> {
        TickContext {
            entities: &mut self.entities,
            items: &mut self.items,
            resources: &self.resources,
            registry: &self.registry,
            config: &self.config,
            events: &mut self.events,
            dt: self.config.timestep,
            tick: self.tick,
        }
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Engine helpers
// ===========================================================================

/// A tick-mode engine over the standard registry and the given resources.
pub fn engine_with(resources: ResourceMap, config: SimConfig) -> Engine {
    Engine::new(
        SimulationStrategy::Tick,
        config,
        Arc::new(Registry::standard()),
        Box::new(resources),
    )
}

/// Item kind by name in the standard registry.
pub fn standard_item(name: &str) -> ItemTypeId {
    Registry::standard()
        .item_id(name)
        .unwrap_or_else(|| panic!("unknown item {name}"))
}

/// A small iron production line:
///
/// ```text
/// (0,0) drill on iron ore, facing east
/// (1,0)..(3,0) belts east
/// (4,0) furnace
/// (5,0) inserter facing east
/// (6,0) assembler crafting iron gears
/// ```
pub fn iron_gear_line() -> Engine {
    let mut resources = ResourceMap::new();
    resources.insert(pos(0, 0), standard_item(names::IRON_ORE));
    let mut engine = engine_with(resources, SimConfig::default());

    let layout = [
        (pos(0, 0), EntityType::Drill),
        (pos(1, 0), EntityType::Belt),
        (pos(2, 0), EntityType::Belt),
        (pos(3, 0), EntityType::Belt),
        (pos(4, 0), EntityType::Furnace),
        (pos(5, 0), EntityType::Inserter),
        (pos(6, 0), EntityType::Assembler),
    ];
    for (at, entity_type) in layout {
        engine
            .place(at, entity_type, Direction::East)
            .unwrap_or_else(|e| panic!("layout overlaps: {e}"));
    }
    engine
        .set_recipe_by_name(pos(6, 0), Some(names::IRON_GEAR))
        .unwrap_or_else(|e| panic!("recipe assignment failed: {e}"));
    engine
}

/// A grid of `rows` independent drill-belt-furnace lines for benchmarks.
pub fn drill_field(rows: i32) -> Engine {
    let mut resources = ResourceMap::new();
    resources.fill_rect(pos(0, 0), pos(0, rows - 1), standard_item(names::IRON_ORE));
    let mut engine = engine_with(resources, SimConfig::default());
    for y in 0..rows {
        let row = [
            (pos(0, y), EntityType::Drill),
            (pos(1, y), EntityType::Belt),
            (pos(2, y), EntityType::Belt),
            (pos(3, y), EntityType::Furnace),
            (pos(4, y), EntityType::Inserter),
        ];
        for (at, entity_type) in row {
            engine
                .place(at, entity_type, Direction::East)
                .unwrap_or_else(|e| panic!("layout overlaps: {e}"));
        }
    }
    engine
}

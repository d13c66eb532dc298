//! The simulation engine: owns the world and runs the tick pipeline.
//!
//! # Architecture
//!
//! The `Engine` owns:
//! - An [`EntityRegistry`] (one entity per grid tile)
//! - An [`ItemPool`] of loose items with pending spawn/removal buffers
//! - A shared, read-only [`Registry`] and [`ResourceLookup`]
//! - A [`SimState`] (tick counter, elapsed time, accumulator)
//! - A [`SimulationStrategy`] (tick, delta or variable)
//! - An [`EventBus`] for typed simulation events
//!
//! # Tick Pipeline
//!
//! Each executed tick runs:
//! 1. **Entities** -- every entity updates once, in ascending grid order
//! 2. **Apply** -- items spawned or claimed by entities enter/leave the world
//! 3. **Transport** -- every item present at phase start moves once
//! 4. **Apply** -- absorbed items leave the world
//! 5. **Post-tick** -- deliver buffered events to listeners
//! 6. **Bookkeeping** -- update tick counter, compute state hash

use crate::entity::{Entity, EntityKind, EntityRegistry, EntityType, TickContext};
use crate::event::{Event, EventBus, EventKind, PassiveListener};
use crate::fixed::{Fixed64, Ticks};
use crate::grid::{Direction, GridPosition, PixelPosition};
use crate::id::{ItemId, ItemTypeId, RecipeId};
use crate::inventory::Inventory;
use crate::item::{Item, ItemPool};
use crate::query::{EntitySnapshot, ItemSnapshot};
use crate::registry::Registry;
use crate::resource::ResourceLookup;
use crate::sim::{AdvanceResult, SimConfig, SimState, SimulationStrategy, StateHash};
use crate::transport::{TransportOutcome, transport_item};
use std::sync::Arc;
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PlaceError {
    #[error("tile {0:?} is already occupied")]
    Occupied(GridPosition),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RecipeError {
    #[error("no assembling machine at {0:?}")]
    NotAnAssembler(GridPosition),
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Engine {
    pub(crate) config: SimConfig,

    pub(crate) strategy: SimulationStrategy,

    pub sim_state: SimState,

    /// While paused, `advance()` and `step()` are no-ops. Placement and
    /// removal still work.
    pub(crate) paused: bool,

    pub(crate) registry: Arc<Registry>,

    pub(crate) resources: Box<dyn ResourceLookup>,

    pub(crate) entities: EntityRegistry,

    pub(crate) items: ItemPool,

    pub(crate) last_state_hash: u64,

    pub event_bus: EventBus,
}

impl Engine {
    pub fn new(
        strategy: SimulationStrategy,
        config: SimConfig,
        registry: Arc<Registry>,
        resources: Box<dyn ResourceLookup>,
    ) -> Self {
        Self {
            config,
            strategy,
            sim_state: SimState::new(),
            paused: false,
            registry,
            resources,
            entities: EntityRegistry::new(),
            items: ItemPool::new(),
            last_state_hash: 0,
            event_bus: EventBus::default(),
        }
    }

    /// Tick-mode engine with default configuration and the standard
    /// registry.
    pub fn with_standard(resources: Box<dyn ResourceLookup>) -> Self {
        Self::new(
            SimulationStrategy::Tick,
            SimConfig::default(),
            Arc::new(Registry::standard()),
            resources,
        )
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn strategy(&self) -> SimulationStrategy {
        self.strategy
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn tick(&self) -> Ticks {
        self.sim_state.tick
    }

    // -----------------------------------------------------------------------
    // Entity management
    // -----------------------------------------------------------------------

    /// Place a fresh entity. Fails if the tile is taken.
    pub fn place(
        &mut self,
        position: GridPosition,
        entity_type: EntityType,
        facing: Direction,
    ) -> Result<(), PlaceError> {
        if self.entities.contains(position) {
            return Err(PlaceError::Occupied(position));
        }
        self.replace(position, entity_type, facing);
        Ok(())
    }

    /// Place a fresh entity, discarding whatever stood on the tile. Returns
    /// the displaced entity.
    pub fn replace(
        &mut self,
        position: GridPosition,
        entity_type: EntityType,
        facing: Direction,
    ) -> Option<Entity> {
        let kind = EntityKind::new(entity_type, &self.config);
        let entity = Entity::new(position, facing, kind, self.config.inventory_capacity);
        debug!(?position, ?entity_type, ?facing, "entity placed");
        self.event_bus.emit(Event::EntityPlaced {
            at: position,
            tick: self.sim_state.tick,
        });
        self.entities.set(entity)
    }

    pub fn remove_entity(&mut self, position: GridPosition) -> Option<Entity> {
        let removed = self.entities.remove(position)?;
        debug!(?position, entity_type = ?removed.entity_type(), "entity removed");
        self.event_bus.emit(Event::EntityRemoved {
            at: position,
            tick: self.sim_state.tick,
        });
        Some(removed)
    }

    pub fn entity(&self, position: GridPosition) -> Option<&Entity> {
        self.entities.get(position)
    }

    /// Mutable access for setup, e.g. stocking an inventory.
    pub fn entity_mut(&mut self, position: GridPosition) -> Option<&mut Entity> {
        self.entities.get_mut(position)
    }

    pub fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Input inventory of the entity at `position`.
    pub fn input(&self, position: GridPosition) -> Option<&Inventory> {
        self.entities.get(position).map(|e| &e.input)
    }

    /// Output inventory of the entity at `position`.
    pub fn output(&self, position: GridPosition) -> Option<&Inventory> {
        self.entities.get(position).map(|e| &e.output)
    }

    /// Assign (or clear) an assembling machine's recipe. An id that names no
    /// recipe is stored as given and leaves the machine idle.
    pub fn set_recipe(&mut self, position: GridPosition, recipe: Option<RecipeId>) -> Result<(), RecipeError> {
        let assembler = self
            .entities
            .get_mut(position)
            .and_then(Entity::as_assembler_mut)
            .ok_or(RecipeError::NotAnAssembler(position))?;
        assembler.set_recipe(recipe);
        debug!(?position, ?recipe, "recipe assigned");
        Ok(())
    }

    /// Assign a recipe by name. An unknown name clears the assignment.
    pub fn set_recipe_by_name(&mut self, position: GridPosition, name: Option<&str>) -> Result<(), RecipeError> {
        let recipe = name.and_then(|n| self.registry.recipe_id(n));
        if recipe.is_none()
            && let Some(name) = name
        {
            debug!(?position, name, "unknown recipe name, machine will stay idle");
        }
        self.set_recipe(position, recipe)
    }

    // -----------------------------------------------------------------------
    // Items
    // -----------------------------------------------------------------------

    /// Put a loose item into the world immediately. For setup between ticks.
    pub fn spawn_item(&mut self, kind: ItemTypeId, position: PixelPosition) -> ItemId {
        self.items.insert(Item::new(kind, position))
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn items(&self) -> &ItemPool {
        &self.items
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    // -----------------------------------------------------------------------
    // State hash
    // -----------------------------------------------------------------------

    /// The hash computed at the end of the most recent tick.
    pub fn state_hash(&self) -> u64 {
        self.last_state_hash
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // -----------------------------------------------------------------------
    // Event system
    // -----------------------------------------------------------------------

    pub fn suppress_event(&mut self, kind: EventKind) {
        self.event_bus.suppress(kind);
    }

    pub fn on_passive(&mut self, kind: EventKind, listener: PassiveListener) {
        self.event_bus.on_passive(kind, listener);
    }

    // -----------------------------------------------------------------------
    // Advance
    // -----------------------------------------------------------------------

    /// Advance the simulation according to the configured strategy.
    ///
    /// - **Tick mode**: `elapsed` is ignored; exactly one fixed step runs.
    /// - **Delta mode**: `elapsed` is accumulated; as many fixed steps run as
    ///   fit and the remainder carries over.
    /// - **Variable mode**: one step of length `elapsed` runs.
    ///
    /// A step whose length is not positive is skipped entirely.
    pub fn advance(&mut self, elapsed: Fixed64) -> AdvanceResult {
        if self.paused {
            return AdvanceResult::default();
        }
        let mut result = AdvanceResult::default();
        let timestep = self.config.timestep;

        match self.strategy {
            SimulationStrategy::Tick => {
                self.step_internal(timestep, &mut result);
            }
            SimulationStrategy::Delta => {
                if elapsed > Fixed64::ZERO {
                    self.sim_state.accumulator += elapsed;
                }
                if timestep > Fixed64::ZERO {
                    while self.sim_state.accumulator >= timestep {
                        self.sim_state.accumulator -= timestep;
                        self.step_internal(timestep, &mut result);
                    }
                }
            }
            SimulationStrategy::Variable => {
                self.step_internal(elapsed, &mut result);
            }
        }

        result
    }

    /// Run exactly one fixed-timestep tick, whatever the strategy.
    pub fn step(&mut self) -> AdvanceResult {
        if self.paused {
            return AdvanceResult::default();
        }
        let mut result = AdvanceResult::default();
        self.step_internal(self.config.timestep, &mut result);
        result
    }

    /// Run `n` fixed-timestep ticks.
    pub fn step_n(&mut self, n: u64) -> AdvanceResult {
        let mut total = AdvanceResult::default();
        for _ in 0..n {
            let r = self.step();
            total.steps_run += r.steps_run;
            total.items_spawned += r.items_spawned;
            total.items_removed += r.items_removed;
        }
        total
    }

    // -----------------------------------------------------------------------
    // Internal: single step
    // -----------------------------------------------------------------------

    fn step_internal(&mut self, dt: Fixed64, result: &mut AdvanceResult) {
        if dt <= Fixed64::ZERO {
            return;
        }
        let before = self.items.len();

        // Phases 1-2: entities, then apply their spawns and pickups.
        self.phase_entities(dt);
        let spawned = self.items.apply_pending().len();

        // Phases 3-4: transport, then apply absorptions.
        self.phase_transport(dt);
        let spawned = spawned + self.items.apply_pending().len();

        // Phase 5: post-tick event delivery.
        self.event_bus.deliver();

        // Phase 6: bookkeeping.
        self.phase_bookkeeping(dt);

        result.steps_run += 1;
        result.items_spawned += spawned as u32;
        result.items_removed += (before + spawned).saturating_sub(self.items.len()) as u32;
    }

    fn context(&mut self, dt: Fixed64) -> TickContext<'_> {
        TickContext {
            entities: &mut self.entities,
            items: &mut self.items,
            resources: self.resources.as_ref(),
            registry: &self.registry,
            config: &self.config,
            events: &mut self.event_bus,
            dt,
            tick: self.sim_state.tick,
        }
    }

    // -----------------------------------------------------------------------
    // Phase 1: Entities
    // -----------------------------------------------------------------------

    /// Each entity is taken out of the registry while it updates so it can
    /// reach its neighbours mutably. Entities placed mid-phase are not
    /// visited until the next tick.
    fn phase_entities(&mut self, dt: Fixed64) {
        for position in self.entities.positions() {
            let Some(mut entity) = self.entities.remove(position) else {
                continue;
            };
            entity.update(&mut self.context(dt));
            self.entities.set(entity);
        }
    }

    // -----------------------------------------------------------------------
    // Phase 3: Transport
    // -----------------------------------------------------------------------

    fn phase_transport(&mut self, dt: Fixed64) {
        let mut absorbed = 0u32;
        for id in self.items.ids() {
            if transport_item(id, &mut self.context(dt)) == TransportOutcome::Absorbed {
                absorbed += 1;
            }
        }
        if absorbed > 0 {
            trace!(absorbed, "transport phase");
        }
    }

    // -----------------------------------------------------------------------
    // Phase 6: Bookkeeping
    // -----------------------------------------------------------------------

    fn phase_bookkeeping(&mut self, dt: Fixed64) {
        self.sim_state.tick += 1;
        self.sim_state.elapsed += dt;
        self.last_state_hash = self.compute_state_hash();
        debug!(tick = self.sim_state.tick, hash = self.last_state_hash, "tick complete");
    }

    /// Deterministic hash of tick counter, entities and items.
    pub fn compute_state_hash(&self) -> u64 {
        let mut hasher = StateHash::new();
        hasher.write_u64(self.sim_state.tick);

        // Entities in ascending grid order.
        for (position, entity) in self.entities.iter() {
            hasher.write_i32(position.x);
            hasher.write_i32(position.y);
            hasher.write_u32(entity.facing.rotation() as u32);
            hash_inventory(&mut hasher, &entity.input);
            hash_inventory(&mut hasher, &entity.output);
            hash_kind(&mut hasher, &entity.kind);
        }

        // Items in arena order, which is deterministic for a given history.
        for (_, item) in self.items.iter() {
            hasher.write_u32(item.kind.0);
            hasher.write_fixed64(item.position.x);
            hasher.write_fixed64(item.position.y);
            hasher.write_u32(item.reserved as u32);
        }

        hasher.finish()
    }

    // -----------------------------------------------------------------------
    // Query API (read-only)
    // -----------------------------------------------------------------------

    pub fn snapshot_entity(&self, position: GridPosition) -> Option<EntitySnapshot> {
        let entity = self.entities.get(position)?;
        Some(EntitySnapshot::from_entity(entity, &self.registry))
    }

    /// Snapshots of all entities in update order.
    pub fn snapshot_all_entities(&self) -> Vec<EntitySnapshot> {
        self.entities
            .iter()
            .map(|(_, e)| EntitySnapshot::from_entity(e, &self.registry))
            .collect()
    }

    pub fn snapshot_items(&self) -> Vec<ItemSnapshot> {
        self.items
            .iter()
            .map(|(id, item)| ItemSnapshot::from_item(id, item))
            .collect()
    }
}

fn hash_inventory(hasher: &mut StateHash, inventory: &Inventory) {
    hasher.write_u32(inventory.iter().count() as u32);
    for stack in inventory.iter() {
        hasher.write_u32(stack.item_type.0);
        hasher.write_u32(stack.quantity);
    }
}

fn hash_kind(hasher: &mut StateHash, kind: &EntityKind) {
    use crate::entity::{CraftState, InserterState, SmeltState};
    match kind {
        EntityKind::Belt => hasher.write_u32(0),
        EntityKind::Drill(d) => {
            hasher.write_u32(1);
            hasher.write_fixed64(d.timer);
            hasher.write_u32(d.blocked as u32);
        }
        EntityKind::Furnace(f) => {
            hasher.write_u32(2);
            hasher.write_fixed64(f.timer);
            match f.state {
                SmeltState::Idle => hasher.write_u32(0),
                SmeltState::Smelting { recipe } => {
                    hasher.write_u32(1);
                    hasher.write_u32(recipe.0);
                }
            }
        }
        EntityKind::Inserter(i) => {
            hasher.write_u32(3);
            let state = match i.state {
                InserterState::Idle => 0,
                InserterState::SwingingToPickup => 1,
                InserterState::Picking => 2,
                InserterState::SwingingToDrop => 3,
                InserterState::Dropping => 4,
            };
            hasher.write_u32(state);
            hasher.write_fixed64(i.angle);
            hasher.write_u32(i.held.map_or(u32::MAX, |k| k.0));
        }
        EntityKind::Assembler(a) => {
            hasher.write_u32(4);
            hasher.write_u32(a.recipe().map_or(u32::MAX, |r| r.0));
            hasher.write_fixed64(a.timer);
            match a.state {
                CraftState::Idle => hasher.write_u32(0),
                CraftState::Crafting { recipe } => {
                    hasher.write_u32(1);
                    hasher.write_u32(recipe.0);
                }
            }
        }
    }
}

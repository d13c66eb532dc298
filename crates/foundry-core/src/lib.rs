//! Foundry Core -- a tile-based factory simulation.
//!
//! Drills mine ore onto belts, belts carry loose items into furnaces,
//! furnaces smelt plates, inserters swing items between machines and
//! assembling machines craft components. All of it advances in discrete
//! ticks over a grid of one-tile entities, using deterministic fixed-point
//! arithmetic so identical inputs give bit-identical state.
//!
//! # Tick Pipeline
//!
//! Each call to [`engine::Engine::step`] advances the simulation by one tick:
//!
//! 1. **Entities** -- every entity updates once, in ascending grid order.
//! 2. **Apply** -- items spawned or claimed during the entity phase take effect.
//! 3. **Transport** -- every loose item moves one belt step and may be absorbed.
//! 4. **Apply** -- absorbed items leave the world.
//! 5. **Post-tick** -- buffered events are delivered to listeners.
//! 6. **Bookkeeping** -- the tick counter advances and the state hash is taken.
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- owns the world and runs the pipeline.
//! - [`entity::Entity`] -- a placed belt, drill, furnace, inserter or
//!   assembling machine.
//! - [`item::ItemPool`] -- loose items with deferred spawn and removal.
//! - [`inventory::Inventory`] -- per-kind item counter.
//! - [`registry::Registry`] -- immutable item kinds and recipes.
//! - [`resource::ResourceLookup`] -- which ore lies on which tile.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic math.
//! - [`event::EventBus`] -- typed events with buffered delivery.
//! - [`serialize`] -- versioned binary snapshots via bitcode.

pub mod engine;
pub mod entity;
pub mod event;
pub mod fixed;
pub mod grid;
pub mod id;
pub mod inventory;
pub mod item;
pub mod query;
pub mod registry;
pub mod resource;
pub mod serialize;
pub mod sim;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

//! Read-only views of simulation state for renderers and UI.
//!
//! All types are owned copies with no references into engine storage, so a
//! renderer can hold them across ticks.

use crate::entity::{CraftState, Entity, EntityKind, EntityType, InserterState, SmeltState};
use crate::fixed::Fixed64;
use crate::grid::{Direction, GridPosition, PixelPosition};
use crate::id::{ItemId, ItemTypeId, RecipeId};
use crate::inventory::ItemStack;
use crate::item::Item;
use crate::registry::Registry;

// ---------------------------------------------------------------------------
// Entity snapshot
// ---------------------------------------------------------------------------

/// Variant state a renderer needs to draw an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityDetail {
    Belt,
    Drill {
        timer: Fixed64,
        blocked: bool,
    },
    Furnace {
        state: SmeltState,
    },
    Inserter {
        state: InserterState,
        /// Radians; 0 over the drop tile, pi over the pickup tile.
        angle: Fixed64,
        held: Option<ItemTypeId>,
    },
    Assembler {
        /// The assigned recipe.
        recipe: Option<RecipeId>,
        state: CraftState,
    },
}

/// An aggregated view of one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySnapshot {
    pub position: GridPosition,
    pub entity_type: EntityType,
    pub facing: Direction,
    /// Progress of the current job as a 0..1 fraction. 0 when idle.
    pub progress: Fixed64,
    pub detail: EntityDetail,
    pub input_contents: Vec<ItemStack>,
    pub output_contents: Vec<ItemStack>,
}

impl EntitySnapshot {
    pub fn from_entity(entity: &Entity, registry: &Registry) -> Self {
        let detail = match &entity.kind {
            EntityKind::Belt => EntityDetail::Belt,
            EntityKind::Drill(d) => EntityDetail::Drill {
                timer: d.timer,
                blocked: d.blocked,
            },
            EntityKind::Furnace(f) => EntityDetail::Furnace { state: f.state },
            EntityKind::Inserter(i) => EntityDetail::Inserter {
                state: i.state,
                angle: i.angle,
                held: i.held,
            },
            EntityKind::Assembler(a) => EntityDetail::Assembler {
                recipe: a.recipe(),
                state: a.state,
            },
        };
        Self {
            position: entity.position,
            entity_type: entity.entity_type(),
            facing: entity.facing,
            progress: entity.progress(registry),
            detail,
            input_contents: entity.input.iter().cloned().collect(),
            output_contents: entity.output.iter().cloned().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Item snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSnapshot {
    pub id: ItemId,
    pub kind: ItemTypeId,
    pub position: PixelPosition,
}

impl ItemSnapshot {
    pub fn from_item(id: ItemId, item: &Item) -> Self {
        Self {
            id,
            kind: item.kind,
            position: item.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Inserter;
    use crate::fixed::pi;
    use crate::registry::names;

    #[test]
    fn inserter_snapshot_carries_arm_state() {
        let registry = Registry::standard();
        let plate = registry.item_id(names::IRON_PLATE).unwrap();
        let inserter = Inserter {
            state: InserterState::SwingingToDrop,
            angle: pi(),
            held: Some(plate),
        };
        let entity = Entity::new(
            GridPosition::new(1, 1),
            Direction::West,
            EntityKind::Inserter(inserter),
            10,
        );
        let snap = EntitySnapshot::from_entity(&entity, &registry);
        assert_eq!(snap.entity_type, EntityType::Inserter);
        assert_eq!(snap.facing, Direction::West);
        assert_eq!(snap.progress, Fixed64::ZERO);
        assert_eq!(
            snap.detail,
            EntityDetail::Inserter {
                state: InserterState::SwingingToDrop,
                angle: pi(),
                held: Some(plate),
            }
        );
    }

    #[test]
    fn snapshot_lists_inventory_contents() {
        let registry = Registry::standard();
        let ore = registry.item_id(names::IRON_ORE).unwrap();
        let mut entity = Entity::new(
            GridPosition::new(0, 0),
            Direction::East,
            EntityKind::Furnace(Default::default()),
            10,
        );
        entity.input.add(ore, 3);
        let snap = EntitySnapshot::from_entity(&entity, &registry);
        assert_eq!(snap.input_contents, vec![ItemStack::new(ore, 3)]);
        assert!(snap.output_contents.is_empty());
    }
}

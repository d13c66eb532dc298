//! Belt transport: the per-item movement step run after all entities update.
//!
//! An item standing on a belt first slides sideways onto the belt's centre
//! line, then travels along the belt's facing. A misaligned item makes no
//! progress along the belt. After moving, an item that has reached the
//! centre of an entity willing to take it is absorbed into that entity's
//! input.

use crate::entity::TickContext;
use crate::event::Event;
use crate::fixed::{Fixed64, approach};
use crate::grid::{Direction, PixelPosition};
use crate::id::ItemId;
use tracing::trace;

/// Distance from the belt centre line below which an item counts as aligned.
const ALIGN_TOLERANCE: Fixed64 = Fixed64::ONE;

/// What happened to one item during the transport step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportOutcome {
    /// Not on a belt, reserved, or already gone.
    Stationary,
    /// Moved toward the belt centre line.
    Aligned,
    /// Moved along the belt.
    Advanced,
    /// Aligned on a belt but held back by the item ahead.
    Blocked,
    /// Taken into an entity's input inventory.
    Absorbed,
}

/// Move one item and try to absorb it. Items removed or claimed earlier in
/// the phase are skipped.
pub fn transport_item(id: ItemId, ctx: &mut TickContext<'_>) -> TransportOutcome {
    let Some(item) = ctx.items.get(id) else {
        return TransportOutcome::Stationary;
    };
    if item.reserved {
        return TransportOutcome::Stationary;
    }
    let kind = item.kind;
    let tile_size = ctx.config.tile_size;
    let mut position = item.position;

    let mut outcome = TransportOutcome::Stationary;
    let tile = position.tile(tile_size);
    if let Some(belt) = ctx.entities.get(tile)
        && belt.kind.is_belt()
    {
        let facing = belt.facing;
        let center = tile.center(tile_size);
        let step = ctx.config.item_speed * ctx.dt;
        outcome = if !align(&mut position, center, facing, step) {
            TransportOutcome::Aligned
        } else if is_blocked(id, position, facing, ctx) {
            TransportOutcome::Blocked
        } else {
            let (dx, dy) = facing.offset();
            position.x += step * Fixed64::from_num(dx);
            position.y += step * Fixed64::from_num(dy);
            TransportOutcome::Advanced
        };
        if let Some(item) = ctx.items.get_mut(id) {
            item.position = position;
        }
    }

    let tile = position.tile(tile_size);
    let registry = ctx.registry;
    if let Some(target) = ctx.entities.get_mut(tile)
        && target.kind.accepts(kind, registry)
        && reaches_intake(position, tile.center(tile_size), ctx.config.intake_radius)
    {
        target.input.add(kind, 1);
        if let Some(item) = ctx.items.get_mut(id) {
            item.reserved = true;
        }
        ctx.items.queue_removal(id);
        trace!(?tile, ?kind, "item absorbed");
        ctx.events.emit(Event::ItemAbsorbed {
            into: tile,
            item_type: kind,
            tick: ctx.tick,
        });
        return TransportOutcome::Absorbed;
    }

    outcome
}

/// Pull `position` toward the belt centre line across the direction of
/// travel. Returns true when the item is aligned and may advance, in which
/// case the cross coordinate has been snapped exactly onto the line.
fn align(position: &mut PixelPosition, center: PixelPosition, facing: Direction, step: Fixed64) -> bool {
    let (cross, line) = if facing.is_horizontal() {
        (&mut position.y, center.y)
    } else {
        (&mut position.x, center.x)
    };
    if (*cross - line).abs() > ALIGN_TOLERANCE {
        *cross = approach(*cross, line, step);
        false
    } else {
        *cross = line;
        true
    }
}

/// Inclusive, so an item stopped on the boundary of an entity's tile at the
/// default half-tile radius is still taken in.
fn reaches_intake(position: PixelPosition, center: PixelPosition, radius: Fixed64) -> bool {
    position.distance_squared(center) <= radius * radius
}

/// Whether another item sits ahead within the configured belt spacing.
/// Always false when spacing is disabled.
fn is_blocked(id: ItemId, position: PixelPosition, facing: Direction, ctx: &TickContext<'_>) -> bool {
    let spacing = ctx.config.belt_spacing;
    if spacing <= Fixed64::ZERO {
        return false;
    }
    let half = spacing / Fixed64::from_num(2);
    ctx.items.iter().any(|(other_id, other)| {
        if other_id == id {
            return false;
        }
        let (ahead, across) = match facing {
            Direction::East => (other.position.x - position.x, other.position.y - position.y),
            Direction::West => (position.x - other.position.x, other.position.y - position.y),
            Direction::South => (other.position.y - position.y, other.position.x - position.x),
            Direction::North => (position.y - other.position.y, other.position.x - position.x),
        };
        ahead > Fixed64::ZERO && ahead <= spacing && across.abs() < half
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;
    use crate::grid::GridPosition;
    use crate::item::Item;
    use crate::registry::names;
    use crate::sim::SimConfig;
    use crate::test_utils::TestWorld;

    fn px(x: i32, y: i32) -> PixelPosition {
        PixelPosition::new(Fixed64::from_num(x), Fixed64::from_num(y))
    }

    fn belt_world(facing: Direction) -> TestWorld {
        let mut world = TestWorld::new();
        for x in 0..4 {
            world.place(GridPosition::new(x, 0), EntityType::Belt, facing);
        }
        world
    }

    // -----------------------------------------------------------------------
    // Test 1: items move along the belt at item_speed
    // -----------------------------------------------------------------------
    #[test]
    fn centred_item_advances_one_pixel_per_tick() {
        let mut world = belt_world(Direction::East);
        let ore = world.item(names::IRON_ORE);
        let id = world.items.insert(Item::new(ore, px(16, 16)));

        assert_eq!(world.transport(id), TransportOutcome::Advanced);
        assert_eq!(world.items.get(id).unwrap().position, px(17, 16));
    }

    // -----------------------------------------------------------------------
    // Test 2: off-centre items recentre before advancing, never diagonally
    // -----------------------------------------------------------------------
    #[test]
    fn off_centre_item_recentres_first() {
        let mut world = belt_world(Direction::East);
        let ore = world.item(names::IRON_ORE);
        let id = world.items.insert(Item::new(ore, px(10, 20)));

        let mut last = world.items.get(id).unwrap().position;
        let mut aligned_ticks = 0;
        while world.transport(id) == TransportOutcome::Aligned {
            let now = world.items.get(id).unwrap().position;
            // No progress along the belt while misaligned.
            assert_eq!(now.x, last.x);
            assert!(now.y < last.y);
            last = now;
            aligned_ticks += 1;
            assert!(aligned_ticks < 10);
        }
        // 4 px off at 1 px per tick; the last pixel snaps.
        assert_eq!(aligned_ticks, 3);
        assert_eq!(world.items.get(id).unwrap().position, px(11, 16));
    }

    #[test]
    fn vertical_belt_moves_along_y() {
        let mut world = TestWorld::new();
        world.place(GridPosition::new(0, 0), EntityType::Belt, Direction::North);
        let ore = world.item(names::IRON_ORE);
        let id = world.items.insert(Item::new(ore, px(16, 16)));

        world.transport(id);
        assert_eq!(world.items.get(id).unwrap().position, px(16, 15));
    }

    #[test]
    fn item_off_belt_is_stationary() {
        let mut world = TestWorld::new();
        let ore = world.item(names::IRON_ORE);
        let id = world.items.insert(Item::new(ore, px(16, 16)));
        assert_eq!(world.transport(id), TransportOutcome::Stationary);
        assert_eq!(world.items.get(id).unwrap().position, px(16, 16));
    }

    // -----------------------------------------------------------------------
    // Test 3: intake into furnaces
    // -----------------------------------------------------------------------
    #[test]
    fn belt_feeds_furnace() {
        let mut world = belt_world(Direction::East);
        world.place(GridPosition::new(4, 0), EntityType::Furnace, Direction::East);
        let ore = world.item(names::IRON_ORE);
        let id = world.items.insert(Item::new(ore, px(112, 16)));

        let mut ticks = 0;
        while world.items.get(id).is_some() {
            world.transport(id);
            ticks += 1;
            assert!(ticks < 100, "item never absorbed");
        }
        // 112 -> 128 along the last belt, which is exactly half a tile from
        // the furnace centre at 144.
        assert_eq!(ticks, 16);
        let furnace = world.entities.get(GridPosition::new(4, 0)).unwrap();
        assert_eq!(furnace.input.count(ore), 1);
    }

    #[test]
    fn furnace_rejects_unsmeltable_items() {
        let mut world = TestWorld::new();
        world.place(GridPosition::new(0, 0), EntityType::Furnace, Direction::East);
        let coal = world.item(names::COAL);
        let id = world.items.insert(Item::new(coal, px(16, 16)));
        assert_eq!(world.transport(id), TransportOutcome::Stationary);
        assert!(world.items.get(id).is_some());
    }

    // -----------------------------------------------------------------------
    // Test 4: optional belt spacing
    // -----------------------------------------------------------------------
    #[test]
    fn spacing_holds_back_following_item() {
        let config = SimConfig {
            belt_spacing: Fixed64::from_num(8),
            ..SimConfig::default()
        };
        let mut world = TestWorld::with_config(config);
        world.place(GridPosition::new(0, 0), EntityType::Belt, Direction::East);
        let ore = world.item(names::IRON_ORE);
        let front = world.items.insert(Item::new(ore, px(20, 16)));
        let back = world.items.insert(Item::new(ore, px(14, 16)));

        assert_eq!(world.transport(back), TransportOutcome::Blocked);
        assert_eq!(world.transport(front), TransportOutcome::Advanced);
        assert_eq!(world.transport(back), TransportOutcome::Blocked);
        assert_eq!(world.transport(front), TransportOutcome::Advanced);
        // Gap is now 8 px: still blocked until the front item pulls away.
        assert_eq!(world.transport(back), TransportOutcome::Blocked);
        assert_eq!(world.transport(front), TransportOutcome::Advanced);
        assert_eq!(world.transport(back), TransportOutcome::Advanced);
    }

    #[test]
    fn zero_spacing_lets_items_overlap() {
        let mut world = belt_world(Direction::East);
        let ore = world.item(names::IRON_ORE);
        let a = world.items.insert(Item::new(ore, px(16, 16)));
        let b = world.items.insert(Item::new(ore, px(16, 16)));
        assert_eq!(world.transport(a), TransportOutcome::Advanced);
        assert_eq!(world.transport(b), TransportOutcome::Advanced);
    }
}

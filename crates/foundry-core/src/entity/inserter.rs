use super::TickContext;
use crate::event::Event;
use crate::fixed::{Fixed64, approach, pi};
use crate::grid::{Direction, GridPosition};
use crate::id::ItemTypeId;
use crate::item::Item;
use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InserterState {
    #[default]
    Idle,
    SwingingToPickup,
    Picking,
    SwingingToDrop,
    Dropping,
}

/// A swinging arm that moves one item at a time from the tile behind it to
/// the tile in front of it.
///
/// The arm angle is 0 over the drop tile and pi over the pickup tile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inserter {
    pub state: InserterState,
    pub angle: Fixed64,
    pub held: Option<ItemTypeId>,
}

impl Inserter {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn update(&mut self, position: GridPosition, facing: Direction, ctx: &mut TickContext<'_>) {
        match self.state {
            InserterState::Idle => {
                self.state = if self.held.is_some() {
                    InserterState::SwingingToDrop
                } else {
                    InserterState::SwingingToPickup
                };
            }
            InserterState::SwingingToPickup => {
                if self.swing(pi(), ctx) {
                    self.state = InserterState::Picking;
                }
            }
            InserterState::SwingingToDrop => {
                if self.swing(Fixed64::ZERO, ctx) {
                    self.state = InserterState::Dropping;
                }
            }
            InserterState::Picking => {
                let source = position.step(facing.opposite(), 1);
                if let Some(kind) = pick(source, ctx) {
                    trace!(?position, ?kind, "inserter picked up item");
                    ctx.events.emit(Event::ItemPickedUp {
                        inserter: position,
                        item_type: kind,
                        tick: ctx.tick,
                    });
                    self.held = Some(kind);
                    self.state = InserterState::SwingingToDrop;
                }
            }
            InserterState::Dropping => {
                if let Some(kind) = self.held.take() {
                    drop_item(kind, position.step(facing, 1), ctx);
                    trace!(?position, ?kind, "inserter dropped item");
                    ctx.events.emit(Event::ItemDropped {
                        inserter: position,
                        item_type: kind,
                        tick: ctx.tick,
                    });
                }
                self.state = InserterState::SwingingToPickup;
            }
        }
    }

    /// Move the arm toward `target`. Returns true once it is within the
    /// configured tolerance.
    fn swing(&mut self, target: Fixed64, ctx: &TickContext<'_>) -> bool {
        self.angle = approach(self.angle, target, ctx.config.arm_speed * ctx.dt);
        (target - self.angle).abs() < ctx.config.arm_tolerance
    }
}

/// Take one unit from the source entity's output, or failing that, claim a
/// loose item lying on the source tile.
fn pick(source: GridPosition, ctx: &mut TickContext<'_>) -> Option<ItemTypeId> {
    let from_entity = ctx.entities.get_mut(source).and_then(|entity| {
        let kind = entity.output.first_kind()?;
        (entity.output.remove(kind, 1) == 1).then_some(kind)
    });
    if from_entity.is_some() {
        return from_entity;
    }
    let center = source.center(ctx.config.tile_size);
    let id = ctx.items.find_unreserved_within(center, ctx.config.pickup_radius)?;
    ctx.items.take(id)
}

/// Hand an item to the entity in front, or leave it on the ground there.
fn drop_item(kind: ItemTypeId, target: GridPosition, ctx: &mut TickContext<'_>) {
    match ctx.entities.get_mut(target) {
        Some(entity) if entity.kind.has_input_buffer() => entity.input.add(kind, 1),
        _ => {
            let center = target.center(ctx.config.tile_size);
            ctx.items.spawn(Item::new(kind, center));
            ctx.events.emit(Event::ItemSpawned {
                at: target,
                item_type: kind,
                tick: ctx.tick,
            });
        }
    }
}

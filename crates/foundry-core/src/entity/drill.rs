use super::TickContext;
use crate::event::Event;
use crate::fixed::Fixed64;
use crate::grid::{Direction, GridPosition};
use crate::item::Item;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Mines the resource under itself and drops it on the tile it faces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drill {
    /// Seconds accumulated toward the next unit.
    pub timer: Fixed64,
    /// Seconds per mined unit.
    pub mining_rate: Fixed64,
    /// True while a finished unit is waiting for the output tile to clear.
    pub blocked: bool,
}

impl Drill {
    pub fn new(mining_rate: Fixed64) -> Self {
        Self {
            timer: Fixed64::ZERO,
            mining_rate,
            blocked: false,
        }
    }

    pub fn progress(&self) -> Fixed64 {
        if self.mining_rate <= Fixed64::ZERO {
            return Fixed64::ZERO;
        }
        (self.timer / self.mining_rate).min(Fixed64::ONE)
    }

    pub(super) fn update(&mut self, position: GridPosition, facing: Direction, ctx: &mut TickContext<'_>) {
        self.timer += ctx.dt;
        if self.timer < self.mining_rate {
            return;
        }
        let Some(resource) = ctx.resources.resource_at(position) else {
            return;
        };

        let target = position.step(facing, 1);
        let center = target.center(ctx.config.tile_size);
        let half_tile = ctx.config.tile_size / Fixed64::from_num(2);
        if ctx.items.any_within(center, half_tile) {
            if !self.blocked {
                self.blocked = true;
                trace!(?position, "drill output blocked");
                ctx.events.emit(Event::DrillBlocked {
                    drill: position,
                    tick: ctx.tick,
                });
            }
            return;
        }

        self.blocked = false;
        self.timer = Fixed64::ZERO;
        ctx.items.spawn(Item::new(resource, center));
        ctx.events.emit(Event::ItemSpawned {
            at: target,
            item_type: resource,
            tick: ctx.tick,
        });
    }
}

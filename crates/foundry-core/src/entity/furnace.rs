use super::TickContext;
use crate::event::Event;
use crate::fixed::Fixed64;
use crate::grid::GridPosition;
use crate::id::RecipeId;
use crate::inventory::Inventory;
use crate::registry::Registry;
use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmeltState {
    #[default]
    Idle,
    Smelting { recipe: RecipeId },
}

/// Picks the first smelting recipe its input can satisfy and runs it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Furnace {
    pub state: SmeltState,
    /// Seconds spent on the current recipe.
    pub timer: Fixed64,
}

impl Furnace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recipe(&self) -> Option<RecipeId> {
        match self.state {
            SmeltState::Idle => None,
            SmeltState::Smelting { recipe } => Some(recipe),
        }
    }

    pub fn progress(&self, registry: &Registry) -> Fixed64 {
        self.recipe()
            .and_then(|id| registry.get_recipe(id))
            .filter(|r| r.duration > Fixed64::ZERO)
            .map(|r| (self.timer / r.duration).min(Fixed64::ONE))
            .unwrap_or(Fixed64::ZERO)
    }

    pub(super) fn update(
        &mut self,
        position: GridPosition,
        input: &mut Inventory,
        output: &mut Inventory,
        ctx: &mut TickContext<'_>,
    ) {
        let registry = ctx.registry;

        if self.state == SmeltState::Idle {
            let ready = registry
                .smelting_recipes()
                .find(|(_, r)| r.inputs.iter().all(|e| input.has(e.item, e.quantity)));
            let Some((id, recipe)) = ready else {
                return;
            };
            for entry in &recipe.inputs {
                let removed = input.remove(entry.item, entry.quantity);
                debug_assert_eq!(removed, entry.quantity);
            }
            self.state = SmeltState::Smelting { recipe: id };
            self.timer = Fixed64::ZERO;
            trace!(?position, recipe = %recipe.name, "smelt started");
            ctx.events.emit(Event::SmeltStarted {
                furnace: position,
                recipe: id,
                tick: ctx.tick,
            });
        }

        let SmeltState::Smelting { recipe: id } = self.state else {
            return;
        };
        let Some(recipe) = registry.get_recipe(id) else {
            self.state = SmeltState::Idle;
            return;
        };
        self.timer += ctx.dt;
        if self.timer < recipe.duration {
            return;
        }
        for entry in &recipe.outputs {
            output.add(entry.item, entry.quantity);
        }
        self.state = SmeltState::Idle;
        self.timer = Fixed64::ZERO;
        trace!(?position, recipe = %recipe.name, "smelt completed");
        ctx.events.emit(Event::SmeltCompleted {
            furnace: position,
            recipe: id,
            tick: ctx.tick,
        });
    }
}

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
pub enum CraftState {
    #[default]
    Idle,
    /// The recipe is bound when the craft starts, so reassigning the
    /// machine mid-craft does not affect the craft in flight.
    Crafting { recipe: RecipeId },
}

/// Runs whichever recipe the operator assigned, smelting recipes included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assembler {
    recipe: Option<RecipeId>,
    pub state: CraftState,
    pub timer: Fixed64,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The assigned recipe, which may differ from the one being crafted.
    pub fn recipe(&self) -> Option<RecipeId> {
        self.recipe
    }

    /// Assign or clear the recipe. Inventories are left as they are.
    pub fn set_recipe(&mut self, recipe: Option<RecipeId>) {
        self.recipe = recipe;
    }

    pub fn progress(&self, registry: &Registry) -> Fixed64 {
        let CraftState::Crafting { recipe } = self.state else {
            return Fixed64::ZERO;
        };
        registry
            .get_recipe(recipe)
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

        if self.state == CraftState::Idle {
            let Some(id) = self.recipe else {
                return;
            };
            let Some(recipe) = registry.get_recipe(id) else {
                return;
            };
            if !recipe.inputs.iter().all(|e| input.has(e.item, e.quantity)) {
                return;
            }
            for entry in &recipe.inputs {
                let removed = input.remove(entry.item, entry.quantity);
                debug_assert_eq!(removed, entry.quantity);
            }
            self.state = CraftState::Crafting { recipe: id };
            self.timer = Fixed64::ZERO;
            trace!(?position, recipe = %recipe.name, "craft started");
            ctx.events.emit(Event::CraftStarted {
                assembler: position,
                recipe: id,
                tick: ctx.tick,
            });
        }

        let CraftState::Crafting { recipe: id } = self.state else {
            return;
        };
        let Some(recipe) = registry.get_recipe(id) else {
            self.state = CraftState::Idle;
            return;
        };
        self.timer += ctx.dt;
        if self.timer < recipe.duration {
            return;
        }
        for entry in &recipe.outputs {
            output.add(entry.item, entry.quantity);
        }
        self.state = CraftState::Idle;
        self.timer = Fixed64::ZERO;
        trace!(?position, recipe = %recipe.name, "craft completed");
        ctx.events.emit(Event::CraftCompleted {
            assembler: position,
            recipe: id,
            tick: ctx.tick,
        });
    }
}

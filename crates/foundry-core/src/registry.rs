use crate::fixed::{Fixed64, f64_to_fixed64};
use crate::id::*;
use std::collections::HashMap;

/// Names of the item kinds and recipes in [`Registry::standard`].
pub mod names {
    pub const IRON_ORE: &str = "iron-ore";
    pub const COPPER_ORE: &str = "copper-ore";
    pub const STONE: &str = "stone";
    pub const COAL: &str = "coal";
    pub const IRON_PLATE: &str = "iron-plate";
    pub const COPPER_PLATE: &str = "copper-plate";
    pub const IRON_GEAR: &str = "iron-gear";
    pub const COPPER_CABLE: &str = "copper-cable";
    pub const ELECTRONIC_CIRCUIT: &str = "electronic-circuit";
}

/// An item kind definition in the registry.
#[derive(Debug, Clone)]
pub struct ItemTypeDef {
    pub name: String,
}

/// Which kind of building runs a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RecipeCategory {
    /// Picked automatically by furnaces from whatever ore is in the input.
    Smelting,
    /// Assigned to an assembling machine by the operator.
    Crafting,
}

/// A recipe input/output entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeEntry {
    pub item: ItemTypeId,
    pub quantity: u32,
}

impl RecipeEntry {
    pub fn new(item: ItemTypeId, quantity: u32) -> Self {
        Self { item, quantity }
    }
}

/// A recipe definition.
#[derive(Debug, Clone)]
pub struct RecipeDef {
    pub name: String,
    pub category: RecipeCategory,
    pub inputs: Vec<RecipeEntry>,
    pub outputs: Vec<RecipeEntry>,
    /// Processing time in seconds.
    pub duration: Fixed64,
}

impl RecipeDef {
    /// Whether `item` is one of this recipe's ingredients.
    pub fn takes(&self, item: ItemTypeId) -> bool {
        self.inputs.iter().any(|e| e.item == item)
    }
}

/// Builder for constructing an immutable Registry.
/// Two-phase lifecycle: registration (with optional mutation) -> finalization.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    items: Vec<ItemTypeDef>,
    item_name_to_id: HashMap<String, ItemTypeId>,
    recipes: Vec<RecipeDef>,
    recipe_name_to_id: HashMap<String, RecipeId>,
    duplicates: Vec<String>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item kind. Returns its ID.
    pub fn register_item(&mut self, name: &str) -> ItemTypeId {
        let id = ItemTypeId(self.items.len() as u32);
        self.items.push(ItemTypeDef {
            name: name.to_string(),
        });
        if self.item_name_to_id.insert(name.to_string(), id).is_some() {
            self.duplicates.push(name.to_string());
        }
        id
    }

    /// Register a recipe. Registration order is the furnace priority order
    /// among smelting recipes.
    pub fn register_recipe(
        &mut self,
        name: &str,
        category: RecipeCategory,
        inputs: Vec<RecipeEntry>,
        outputs: Vec<RecipeEntry>,
        duration: Fixed64,
    ) -> RecipeId {
        let id = RecipeId(self.recipes.len() as u32);
        self.recipes.push(RecipeDef {
            name: name.to_string(),
            category,
            inputs,
            outputs,
            duration,
        });
        if self.recipe_name_to_id.insert(name.to_string(), id).is_some() {
            self.duplicates.push(name.to_string());
        }
        id
    }

    /// Mutate an existing recipe by name.
    pub fn mutate_recipe<F>(&mut self, name: &str, f: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut RecipeDef),
    {
        let id = self
            .recipe_name_to_id
            .get(name)
            .ok_or(RegistryError::NotFound(name.to_string()))?;
        f(&mut self.recipes[id.0 as usize]);
        Ok(())
    }

    /// Lookup item type ID by name.
    pub fn item_id(&self, name: &str) -> Option<ItemTypeId> {
        self.item_name_to_id.get(name).copied()
    }

    /// Lookup recipe ID by name.
    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_name_to_id.get(name).copied()
    }

    /// Validate and build the immutable registry.
    pub fn build(self) -> Result<Registry, RegistryError> {
        if let Some(name) = self.duplicates.first() {
            return Err(RegistryError::DuplicateName(name.clone()));
        }
        for recipe in &self.recipes {
            for entry in recipe.inputs.iter().chain(recipe.outputs.iter()) {
                if entry.item.0 as usize >= self.items.len() {
                    return Err(RegistryError::InvalidItemRef(entry.item));
                }
            }
            if recipe.duration < Fixed64::ZERO {
                return Err(RegistryError::NegativeDuration(recipe.name.clone()));
            }
        }
        Ok(self.finish())
    }

    fn finish(self) -> Registry {
        Registry {
            items: self.items,
            item_name_to_id: self.item_name_to_id,
            recipes: self.recipes,
            recipe_name_to_id: self.recipe_name_to_id,
        }
    }
}

/// Immutable registry of item kinds and recipes. Frozen after build().
#[derive(Debug)]
pub struct Registry {
    items: Vec<ItemTypeDef>,
    item_name_to_id: HashMap<String, ItemTypeId>,
    recipes: Vec<RecipeDef>,
    recipe_name_to_id: HashMap<String, RecipeId>,
}

impl Registry {
    /// The compiled-in content: four raw resources, two smelting recipes and
    /// three crafting recipes.
    pub fn standard() -> Self {
        use names::*;
        let mut b = RegistryBuilder::new();
        let iron_ore = b.register_item(IRON_ORE);
        let copper_ore = b.register_item(COPPER_ORE);
        b.register_item(STONE);
        b.register_item(COAL);
        let iron_plate = b.register_item(IRON_PLATE);
        let copper_plate = b.register_item(COPPER_PLATE);
        let gear = b.register_item(IRON_GEAR);
        let cable = b.register_item(COPPER_CABLE);
        let circuit = b.register_item(ELECTRONIC_CIRCUIT);

        let e = RecipeEntry::new;
        b.register_recipe(
            IRON_PLATE,
            RecipeCategory::Smelting,
            vec![e(iron_ore, 1)],
            vec![e(iron_plate, 1)],
            f64_to_fixed64(2.0),
        );
        b.register_recipe(
            COPPER_PLATE,
            RecipeCategory::Smelting,
            vec![e(copper_ore, 1)],
            vec![e(copper_plate, 1)],
            f64_to_fixed64(2.0),
        );
        b.register_recipe(
            IRON_GEAR,
            RecipeCategory::Crafting,
            vec![e(iron_plate, 2)],
            vec![e(gear, 1)],
            f64_to_fixed64(1.0),
        );
        b.register_recipe(
            COPPER_CABLE,
            RecipeCategory::Crafting,
            vec![e(copper_plate, 1)],
            vec![e(cable, 2)],
            f64_to_fixed64(0.5),
        );
        b.register_recipe(
            ELECTRONIC_CIRCUIT,
            RecipeCategory::Crafting,
            vec![e(iron_plate, 1), e(cable, 3)],
            vec![e(circuit, 1)],
            f64_to_fixed64(1.0),
        );
        b.finish()
    }

    pub fn get_item(&self, id: ItemTypeId) -> Option<&ItemTypeDef> {
        self.items.get(id.0 as usize)
    }

    pub fn get_recipe(&self, id: RecipeId) -> Option<&RecipeDef> {
        self.recipes.get(id.0 as usize)
    }

    pub fn item_id(&self, name: &str) -> Option<ItemTypeId> {
        self.item_name_to_id.get(name).copied()
    }

    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_name_to_id.get(name).copied()
    }

    /// Recipe definition by name.
    pub fn lookup(&self, name: &str) -> Option<&RecipeDef> {
        self.recipe_id(name).and_then(|id| self.get_recipe(id))
    }

    pub fn item_name(&self, id: ItemTypeId) -> Option<&str> {
        self.get_item(id).map(|item| item.name.as_str())
    }

    /// Smelting recipes in furnace priority order.
    pub fn smelting_recipes(&self) -> impl Iterator<Item = (RecipeId, &RecipeDef)> {
        self.recipes
            .iter()
            .enumerate()
            .filter(|(_, r)| r.category == RecipeCategory::Smelting)
            .map(|(i, r)| (RecipeId(i as u32), r))
    }

    /// Whether any smelting recipe takes `item` as an ingredient.
    pub fn is_smeltable(&self, item: ItemTypeId) -> bool {
        self.smelting_recipes().any(|(_, r)| r.takes(item))
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid item reference: {0:?}")]
    InvalidItemRef(ItemTypeId),
    #[error("duplicate name: {0}")]
    DuplicateName(String),
    #[error("recipe {0} has a negative duration")]
    NegativeDuration(String),
}

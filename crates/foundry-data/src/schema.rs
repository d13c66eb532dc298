//! Serde data file structs for game content definitions.
//!
//! These structs define the on-disk format for item kinds, recipes, ore
//! tiles and simulation tuning. They are deserialized from RON, JSON, or
//! TOML data files and then resolved into engine types by the loader.

use foundry_core::fixed::fixed64_to_f64;
use foundry_core::registry::RecipeCategory;
use foundry_core::sim::SimConfig;
use serde::Deserialize;

// ===========================================================================
// Items
// ===========================================================================

/// An item kind definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub name: String,
}

// ===========================================================================
// Recipes
// ===========================================================================

/// Which building runs a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryData {
    Smelting,
    Crafting,
}

impl From<CategoryData> for RecipeCategory {
    fn from(c: CategoryData) -> Self {
        match c {
            CategoryData::Smelting => RecipeCategory::Smelting,
            CategoryData::Crafting => RecipeCategory::Crafting,
        }
    }
}

/// A recipe definition in a data file. Smelting recipes are listed in
/// furnace priority order.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub name: String,
    pub category: CategoryData,
    pub inputs: Vec<(String, u32)>,
    pub outputs: Vec<(String, u32)>,
    /// Seconds.
    pub duration: f64,
}

// ===========================================================================
// Resources
// ===========================================================================

/// An inclusive rectangle of tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RectData {
    pub min: (i32, i32),
    pub max: (i32, i32),
}

/// Tiles carrying one kind of ore.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceData {
    pub item: String,
    #[serde(default)]
    pub tiles: Vec<(i32, i32)>,
    #[serde(default)]
    pub rects: Vec<RectData>,
}

// ===========================================================================
// Config
// ===========================================================================

/// Simulation tuning. Every key is optional and falls back to
/// [`SimConfig::default`]. Values are range-checked when the loader
/// converts them to fixed point.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigData {
    pub timestep: f64,
    pub tile_size: f64,
    pub item_speed: f64,
    pub intake_radius: f64,
    pub belt_spacing: f64,
    pub pickup_radius: f64,
    pub arm_speed: f64,
    pub arm_tolerance: f64,
    pub mining_rate: f64,
    pub inventory_capacity: u32,
}

impl Default for ConfigData {
    fn default() -> Self {
        let d = SimConfig::default();
        Self {
            timestep: fixed64_to_f64(d.timestep),
            tile_size: fixed64_to_f64(d.tile_size),
            item_speed: fixed64_to_f64(d.item_speed),
            intake_radius: fixed64_to_f64(d.intake_radius),
            belt_spacing: fixed64_to_f64(d.belt_spacing),
            pickup_radius: fixed64_to_f64(d.pickup_radius),
            arm_speed: fixed64_to_f64(d.arm_speed),
            arm_tolerance: fixed64_to_f64(d.arm_tolerance),
            mining_rate: fixed64_to_f64(d.mining_rate),
            inventory_capacity: d.inventory_capacity,
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

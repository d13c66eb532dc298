//! Resolution pipeline: reads data files, resolves names, builds the
//! registry, resource map and simulation config.
//!
//! A data directory holds up to four files, each in RON, TOML or JSON:
//!
//! | base name   | required | content                          |
//! |-------------|----------|----------------------------------|
//! | `items`     | yes      | list of [`ItemData`]             |
//! | `recipes`   | yes      | list of [`RecipeData`]           |
//! | `resources` | no       | list of [`ResourceData`]         |
//! | `config`    | no       | one [`ConfigData`] table         |
//!
//! TOML cannot hold a bare top-level array, so list files in TOML put the
//! array under a key named after the file (`items = [...]`, or
//! `[[items]]` tables).

use crate::schema::{ConfigData, ItemData, RecipeData, ResourceData};
use foundry_core::engine::Engine;
use foundry_core::fixed::Fixed64;
use foundry_core::grid::GridPosition;
use foundry_core::id::ItemTypeId;
use foundry_core::registry::{RecipeEntry, Registry, RegistryBuilder, RegistryError};
use foundry_core::resource::ResourceMap;
use foundry_core::sim::{SimConfig, SimulationStrategy};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// A duplicate name was found.
    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// The resolved content failed registry validation.
    #[error("invalid content in {file}: {source}")]
    Registry {
        file: PathBuf,
        #[source]
        source: RegistryError,
    },

    /// A numeric field is non-finite, outside the fixed-point range, or
    /// below the minimum the engine needs.
    #[error("invalid value for '{field}' in {file}: {detail}")]
    InvalidValue {
        file: PathBuf,
        field: String,
        detail: String,
    },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name.
///
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// more than one format exists for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, e: impl ToString) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: e.to_string(),
    }
}

/// Read a file and deserialize it according to its format.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Deserialize a list from a file. For TOML files, extracts the array at
/// `toml_key` from the top-level table. For RON and JSON, deserializes
/// directly as `Vec<T>`.
pub fn deserialize_list<T: DeserializeOwned>(path: &Path, toml_key: &str) -> Result<Vec<T>, DataLoadError> {
    if detect_format(path)? != Format::Toml {
        return deserialize_file(path);
    }
    let content = std::fs::read_to_string(path)?;
    let mut table: toml::Table = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
    let array = table
        .remove(toml_key)
        .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?;
    array.try_into().map_err(|e: toml::de::Error| parse_error(path, e))
}

// ===========================================================================
// Name resolution helpers
// ===========================================================================

/// Look up a name in a map, returning an `UnresolvedRef` error if not found.
pub fn resolve_name<'a, V>(
    map: &'a HashMap<String, V>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<&'a V, DataLoadError> {
    map.get(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind,
    })
}

/// Check whether a name already exists in a map, returning a
/// `DuplicateName` error if so.
pub fn check_duplicate<V>(map: &HashMap<String, V>, name: &str, file: &Path) -> Result<(), DataLoadError> {
    if map.contains_key(name) {
        Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

// ===========================================================================
// Numeric conversion
// ===========================================================================

/// Lower bound a numeric field must respect after conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    /// Range is left to later validation.
    Any,
    NonNegative,
    Positive,
}

/// Convert a data file number to [`Fixed64`], rejecting NaN, infinities,
/// values the fixed-point type cannot hold, and values below `bound`.
fn checked_fixed(value: f64, bound: Bound, file: &Path, field: &str) -> Result<Fixed64, DataLoadError> {
    let invalid = |detail: String| DataLoadError::InvalidValue {
        file: file.to_path_buf(),
        field: field.to_string(),
        detail,
    };
    let fixed = value
        .is_finite()
        .then(|| Fixed64::checked_from_num(value))
        .flatten()
        .ok_or_else(|| invalid(format!("{value} is not representable")))?;
    match bound {
        Bound::Positive if fixed <= Fixed64::ZERO => Err(invalid(format!("{value} must be greater than zero"))),
        Bound::NonNegative if fixed < Fixed64::ZERO => Err(invalid(format!("{value} must not be negative"))),
        _ => Ok(fixed),
    }
}

/// Convert and validate simulation tuning read from `file`.
pub fn resolve_config(data: &ConfigData, file: &Path) -> Result<SimConfig, DataLoadError> {
    let field = |value: f64, bound: Bound, name: &str| checked_fixed(value, bound, file, name);
    Ok(SimConfig {
        timestep: field(data.timestep, Bound::Positive, "timestep")?,
        tile_size: field(data.tile_size, Bound::Positive, "tile_size")?,
        item_speed: field(data.item_speed, Bound::NonNegative, "item_speed")?,
        intake_radius: field(data.intake_radius, Bound::NonNegative, "intake_radius")?,
        belt_spacing: field(data.belt_spacing, Bound::NonNegative, "belt_spacing")?,
        pickup_radius: field(data.pickup_radius, Bound::NonNegative, "pickup_radius")?,
        arm_speed: field(data.arm_speed, Bound::NonNegative, "arm_speed")?,
        arm_tolerance: field(data.arm_tolerance, Bound::NonNegative, "arm_tolerance")?,
        mining_rate: field(data.mining_rate, Bound::NonNegative, "mining_rate")?,
        inventory_capacity: data.inventory_capacity,
    })
}

// ===========================================================================
// Loading pipeline
// ===========================================================================

/// Everything needed to construct an engine over loaded content.
#[derive(Debug)]
pub struct GameData {
    pub registry: Registry,
    pub resources: ResourceMap,
    pub config: SimConfig,
}

impl GameData {
    /// Build an empty world over this content.
    pub fn into_engine(self, strategy: SimulationStrategy) -> Engine {
        Engine::new(
            strategy,
            self.config,
            Arc::new(self.registry),
            Box::new(self.resources),
        )
    }
}

/// Load all content from `dir`.
pub fn load_game_data(dir: &Path) -> Result<GameData, DataLoadError> {
    let items_path = require_data_file(dir, "items")?;
    let recipes_path = require_data_file(dir, "recipes")?;

    let mut builder = RegistryBuilder::new();

    // Items.
    let items: Vec<ItemData> = deserialize_list(&items_path, "items")?;
    let mut item_ids: HashMap<String, ItemTypeId> = HashMap::new();
    for item in &items {
        check_duplicate(&item_ids, &item.name, &items_path)?;
        let id = builder.register_item(&item.name);
        item_ids.insert(item.name.clone(), id);
    }

    // Recipes, in file order.
    let recipes: Vec<RecipeData> = deserialize_list(&recipes_path, "recipes")?;
    let mut recipe_names: HashMap<String, ()> = HashMap::new();
    for recipe in &recipes {
        check_duplicate(&recipe_names, &recipe.name, &recipes_path)?;
        let resolve = |entries: &[(String, u32)]| -> Result<Vec<RecipeEntry>, DataLoadError> {
            entries
                .iter()
                .map(|(name, qty)| {
                    let id = resolve_name(&item_ids, name, &recipes_path, "item")?;
                    Ok(RecipeEntry::new(*id, *qty))
                })
                .collect()
        };
        // Negative durations are reported by registry validation.
        let duration = checked_fixed(
            recipe.duration,
            Bound::Any,
            &recipes_path,
            &format!("{}.duration", recipe.name),
        )?;
        builder.register_recipe(
            &recipe.name,
            recipe.category.into(),
            resolve(&recipe.inputs)?,
            resolve(&recipe.outputs)?,
            duration,
        );
        recipe_names.insert(recipe.name.clone(), ());
    }
    let registry = builder.build().map_err(|source| DataLoadError::Registry {
        file: recipes_path.clone(),
        source,
    })?;

    // Resources (optional).
    let mut resources = ResourceMap::new();
    if let Some(path) = find_data_file(dir, "resources")? {
        let entries: Vec<ResourceData> = deserialize_list(&path, "resources")?;
        for entry in &entries {
            let id = *resolve_name(&item_ids, &entry.item, &path, "item")?;
            for &(x, y) in &entry.tiles {
                resources.insert(GridPosition::new(x, y), id);
            }
            for rect in &entry.rects {
                resources.fill_rect(
                    GridPosition::new(rect.min.0, rect.min.1),
                    GridPosition::new(rect.max.0, rect.max.1),
                    id,
                );
            }
        }
    }

    // Config (optional).
    let config = match find_data_file(dir, "config")? {
        Some(path) => resolve_config(&deserialize_file::<ConfigData>(&path)?, &path)?,
        None => SimConfig::default(),
    };

    debug!(
        dir = %dir.display(),
        items = registry.item_count(),
        recipes = registry.recipe_count(),
        resource_tiles = resources.len(),
        "game data loaded"
    );

    Ok(GameData {
        registry,
        resources,
        config,
    })
}

// ===========================================================================
// Tests
// ===========================================================================

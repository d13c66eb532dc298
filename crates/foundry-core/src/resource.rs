//! The world resource index consulted by drills.
//!
//! Generation of ore patches happens outside the core; the simulation only
//! ever reads through [`ResourceLookup`].

use crate::grid::GridPosition;
use crate::id::ItemTypeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Read-only map from grid coordinate to the natural resource lying there.
pub trait ResourceLookup: Debug {
    fn resource_at(&self, position: GridPosition) -> Option<ItemTypeId>;
}

/// A sparse, in-memory resource index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMap {
    tiles: BTreeMap<GridPosition, ItemTypeId>,
}

impl ResourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the resource at a tile, replacing any previous one.
    pub fn insert(&mut self, position: GridPosition, resource: ItemTypeId) {
        self.tiles.insert(position, resource);
    }

    /// Fill every tile of the inclusive rectangle with `resource`.
    pub fn fill_rect(&mut self, min: GridPosition, max: GridPosition, resource: ItemTypeId) {
        for y in min.y..=max.y {
            for x in min.x..=max.x {
                self.tiles.insert(GridPosition::new(x, y), resource);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GridPosition, ItemTypeId)> + '_ {
        self.tiles.iter().map(|(p, r)| (*p, *r))
    }
}

impl ResourceLookup for ResourceMap {
    fn resource_at(&self, position: GridPosition) -> Option<ItemTypeId> {
        self.tiles.get(&position).copied()
    }
}

impl FromIterator<(GridPosition, ItemTypeId)> for ResourceMap {
    fn from_iter<I: IntoIterator<Item = (GridPosition, ItemTypeId)>>(iter: I) -> Self {
        Self {
            tiles: iter.into_iter().collect(),
        }
    }
}
